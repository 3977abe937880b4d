use crate::engine::archiver::ArchiverKind;
use crate::error::{Result, SweepError};
use crate::util::format::parse_size_string;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use xdg::BaseDirectories;

const CONFIG_FILE: &str = "sweep.toml";

pub struct Config {
    pub config_path: Option<PathBuf>,
    pub settings: Settings,
}

impl Config {
    /// Loads settings from, in order: an explicit path, `$SWEEP_CONFIG`, or
    /// `$XDG_CONFIG_HOME/sweep/sweep.toml`. Defaults apply when none exists.
    pub fn new(config_override: Option<PathBuf>) -> Result<Self> {
        let config_path = if let Some(path) = config_override {
            if !path.exists() {
                return Err(SweepError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            Some(path)
        } else if let Ok(env_path) = std::env::var("SWEEP_CONFIG") {
            Some(PathBuf::from(env_path))
        } else {
            BaseDirectories::with_prefix("sweep")
                .ok()
                .and_then(|xdg| xdg.find_config_file(CONFIG_FILE))
        };

        let settings = match &config_path {
            Some(path) if path.exists() => Settings::load(path)?,
            Some(path) => {
                log::warn!("Config file {} does not exist, using defaults", path.display());
                Settings::default()
            }
            None => Settings::default(),
        };

        Ok(Self {
            config_path,
            settings,
        })
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let xdg = BaseDirectories::with_prefix("sweep")
            .map_err(|e| SweepError::Config(format!("Failed to initialize XDG directories: {}", e)))?;
        xdg.place_config_file(CONFIG_FILE)
            .map_err(|e| SweepError::Config(format!("Failed to create config directory: {}", e)))
    }

    /// Writes the default settings to `path` unless a file already exists there.
    pub fn write_default(path: &Path) -> Result<()> {
        if path.exists() {
            return Err(SweepError::Config(format!(
                "Config file already exists: {}",
                path.display()
            )));
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = format!(
            "# sweep configuration\n\
             # Sizes accept B, KB, MB, GB, TB (binary units).\n\
             # Set trash_dir to override trash discovery.\n\n{}",
            Settings::default().to_toml()?
        );
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub old_after_days: i64,
    pub large_file_size: String,
    pub archive_root: String,
    pub compressed_root: String,
    pub organize_root: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trash_dir: Option<PathBuf>,
    pub archiver: ArchiverKind,
    pub zip_program: PathBuf,
    pub unzip_program: PathBuf,
    pub include_hidden: bool,
    pub follow_symlinks: bool,
    pub bundle_extensions: Vec<String>,
    pub exclude: Vec<String>,
    pub hash_concurrency: usize,
    /// Additional extensions per category name, e.g. `image = ["raw", "cr2"]`.
    pub extra_extensions: BTreeMap<String, Vec<String>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            old_after_days: 90,
            large_file_size: "500MB".to_string(),
            archive_root: "~/Archive".to_string(),
            compressed_root: "~/Compressed".to_string(),
            organize_root: "~/Organized".to_string(),
            trash_dir: None,
            archiver: ArchiverKind::Zip,
            zip_program: PathBuf::from("/usr/bin/zip"),
            unzip_program: PathBuf::from("/usr/bin/unzip"),
            include_hidden: false,
            follow_symlinks: false,
            bundle_extensions: [
                "app",
                "bundle",
                "framework",
                "photoslibrary",
                "pkg",
                "xcodeproj",
                "xcworkspace",
                "plugin",
                "kext",
                "lproj",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            exclude: Vec::new(),
            hash_concurrency: 8,
            extra_extensions: BTreeMap::new(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| SweepError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
            .map_err(|e| SweepError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)
            .map_err(|e| SweepError::Config(format!("Invalid TOML: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| SweepError::Config(format!("Failed to serialize settings: {}", e)))
    }

    pub fn large_file_bytes(&self) -> Result<u64> {
        parse_size_string(&self.large_file_size).map_err(SweepError::Config)
    }

    fn validate(&self) -> Result<()> {
        if self.old_after_days < 0 {
            return Err(SweepError::Config(format!(
                "old_after_days must not be negative, got {}",
                self.old_after_days
            )));
        }
        if self.hash_concurrency == 0 {
            return Err(SweepError::Config(
                "hash_concurrency must be at least 1".to_string(),
            ));
        }
        self.large_file_bytes()?;
        Ok(())
    }
}
