use crate::config::Settings;
use crate::error::{Result, SweepError};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tar::Archive;

/// Compression backend used by archive and compress actions and their undo.
pub trait Archiver: Send + Sync {
    fn name(&self) -> &str;

    /// File extension of produced archives, without the leading dot.
    fn extension(&self) -> &str;

    /// Writes an archive at `dest` holding the single file `source`, stored
    /// under its file name.
    fn compress(&self, source: &Path, dest: &Path) -> Result<()>;

    /// Unpacks `archive` into the existing directory `dest_dir`.
    fn extract(&self, archive: &Path, dest_dir: &Path) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ArchiverKind {
    #[serde(rename = "zip")]
    Zip,
    #[serde(rename = "tar-gz")]
    TarGz,
}

impl ArchiverKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiverKind::Zip => "zip",
            ArchiverKind::TarGz => "tar-gz",
        }
    }
}

pub fn archiver_from_settings(settings: &Settings) -> Arc<dyn Archiver> {
    match settings.archiver {
        ArchiverKind::Zip => Arc::new(ZipCommandArchiver::new(
            settings.zip_program.clone(),
            settings.unzip_program.clone(),
        )),
        ArchiverKind::TarGz => Arc::new(TarGzArchiver::default()),
    }
}

/// Shells out to Info-ZIP `zip` and `unzip`.
#[derive(Debug, Clone)]
pub struct ZipCommandArchiver {
    zip_program: PathBuf,
    unzip_program: PathBuf,
}

impl ZipCommandArchiver {
    pub fn new(zip_program: PathBuf, unzip_program: PathBuf) -> Self {
        Self {
            zip_program,
            unzip_program,
        }
    }

    fn run(&self, program: &Path, command: &mut Command) -> Result<()> {
        let tool = program.display().to_string();
        let output = command.output().map_err(|e| SweepError::ExternalTool {
            tool: tool.clone(),
            message: format!("failed to start: {}", e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SweepError::ExternalTool {
                tool,
                message: format!("{}: {}", output.status, stderr.trim()),
            });
        }
        Ok(())
    }
}

impl Default for ZipCommandArchiver {
    fn default() -> Self {
        Self::new(PathBuf::from("/usr/bin/zip"), PathBuf::from("/usr/bin/unzip"))
    }
}

impl Archiver for ZipCommandArchiver {
    fn name(&self) -> &str {
        "zip"
    }

    fn extension(&self) -> &str {
        "zip"
    }

    fn compress(&self, source: &Path, dest: &Path) -> Result<()> {
        // -j stores the bare file name, -q keeps stdout quiet
        let result = self.run(
            &self.zip_program,
            Command::new(&self.zip_program)
                .arg("-j")
                .arg("-q")
                .arg(dest)
                .arg(source),
        );
        if result.is_err() && dest.exists() {
            let _ = std::fs::remove_file(dest);
        }
        result
    }

    fn extract(&self, archive: &Path, dest_dir: &Path) -> Result<()> {
        self.run(
            &self.unzip_program,
            Command::new(&self.unzip_program)
                .arg("-q")
                .arg(archive)
                .arg("-d")
                .arg(dest_dir),
        )
    }
}

/// In-process gzip-compressed tarballs.
#[derive(Debug, Clone)]
pub struct TarGzArchiver {
    level: Compression,
}

impl TarGzArchiver {
    fn write_archive(&self, source: &Path, dest: &Path) -> std::io::Result<()> {
        let file_name = source.file_name().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "source has no file name")
        })?;

        let file = File::create(dest)?;
        let encoder = GzEncoder::new(file, self.level);
        let mut archive = tar::Builder::new(encoder);
        archive.append_file(file_name, &mut File::open(source)?)?;
        archive.into_inner()?.finish()?;
        Ok(())
    }
}

impl Default for TarGzArchiver {
    fn default() -> Self {
        Self {
            level: Compression::default(),
        }
    }
}

impl Archiver for TarGzArchiver {
    fn name(&self) -> &str {
        "tar.gz"
    }

    fn extension(&self) -> &str {
        "tar.gz"
    }

    fn compress(&self, source: &Path, dest: &Path) -> Result<()> {
        self.write_archive(source, dest).map_err(|e| {
            if dest.exists() {
                let _ = std::fs::remove_file(dest);
            }
            SweepError::ExternalTool {
                tool: self.name().to_string(),
                message: format!("compressing {}: {}", source.display(), e),
            }
        })
    }

    fn extract(&self, archive: &Path, dest_dir: &Path) -> Result<()> {
        let unpack = || -> std::io::Result<()> {
            let decoder = GzDecoder::new(File::open(archive)?);
            Archive::new(decoder).unpack(dest_dir)
        };
        unpack().map_err(|e| SweepError::ExternalTool {
            tool: self.name().to_string(),
            message: format!("extracting {}: {}", archive.display(), e),
        })
    }
}
