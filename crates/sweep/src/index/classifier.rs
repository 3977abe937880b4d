use crate::config::Settings;
use crate::error::{Result, SweepError};
use crate::model::Category;
use std::collections::HashSet;
use std::path::Path;

pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp", "heic", "heif",
];
pub const DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "txt", "rtf", "pages", "key", "numbers", "xls", "xlsx", "ppt", "pptx",
];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "wmv", "flv", "webm", "m4v"];
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "aac", "flac", "m4a", "ogg", "wma"];
pub const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "rar", "7z", "tar", "gz", "bz2", "dmg"];

pub const SCREENSHOT_KEYWORDS: &[&str] = &["screenshot", "screen shot"];
pub const SCREENSHOT_PREFIXES: &[&str] = &["img_", "photo_"];

/// Maps file names to categories.
///
/// Screenshot name patterns win over extensions. Extension sets are checked in
/// the order image, document, video, audio, archive; the first set holding
/// the extension decides.
#[derive(Debug, Clone)]
pub struct Classifier {
    extension_sets: Vec<(Category, HashSet<String>)>,
}

impl Default for Classifier {
    fn default() -> Self {
        let sets = [
            (Category::Image, IMAGE_EXTENSIONS),
            (Category::Document, DOCUMENT_EXTENSIONS),
            (Category::Video, VIDEO_EXTENSIONS),
            (Category::Audio, AUDIO_EXTENSIONS),
            (Category::Archive, ARCHIVE_EXTENSIONS),
        ];

        Self {
            extension_sets: sets
                .iter()
                .map(|(category, exts)| (*category, exts.iter().map(|e| e.to_string()).collect()))
                .collect(),
        }
    }
}

impl Classifier {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut classifier = Self::default();
        for (name, extensions) in &settings.extra_extensions {
            let category = Category::from_str(name)?;
            classifier.add_extensions(category, extensions)?;
        }
        Ok(classifier)
    }

    /// Adds extensions to one of the extension-driven categories.
    pub fn add_extensions<S: AsRef<str>>(&mut self, category: Category, extensions: &[S]) -> Result<()> {
        let set = self
            .extension_sets
            .iter_mut()
            .find(|(c, _)| *c == category)
            .map(|(_, set)| set)
            .ok_or_else(|| {
                SweepError::Config(format!(
                    "Category {} is not assigned by extension",
                    category.as_str()
                ))
            })?;

        for ext in extensions {
            set.insert(ext.as_ref().trim_start_matches('.').to_lowercase());
        }
        Ok(())
    }

    pub fn classify(&self, path: &Path) -> Category {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if is_screenshot_name(&name) {
            return Category::Screenshot;
        }

        let extension = match path.extension() {
            Some(ext) => ext.to_string_lossy().to_lowercase(),
            None => return Category::Unknown,
        };

        self.extension_sets
            .iter()
            .find(|(_, set)| set.contains(&extension))
            .map(|(category, _)| *category)
            .unwrap_or(Category::Unknown)
    }
}

/// `name` must already be lowercased.
fn is_screenshot_name(name: &str) -> bool {
    SCREENSHOT_KEYWORDS.iter().any(|k| name.contains(k))
        || SCREENSHOT_PREFIXES.iter().any(|p| name.starts_with(p))
}
