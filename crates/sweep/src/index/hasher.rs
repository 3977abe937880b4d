use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Content identity of a file used for duplicate grouping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Fingerprint {
    /// BLAKE3 digest of the full contents, hex encoded.
    Content(String),
    /// Stand-in for files that could not be read.
    Fallback { name: String, size: u64 },
}

impl Fingerprint {
    pub fn key(&self) -> String {
        match self {
            Fingerprint::Content(hash) => hash.clone(),
            Fingerprint::Fallback { name, size } => format!("{}_{}", name, size),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Fingerprint::Fallback { .. })
    }
}

pub fn hash_file_blake3<P: AsRef<Path>>(path: P) -> Result<String> {
    let file = File::open(path.as_ref())?;
    let mut reader = BufReader::new(file);
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}

/// Fingerprints `path`, degrading to a name and size key when the file
/// cannot be read. `size` is the size recorded at scan time.
pub fn fingerprint(path: &Path, size: u64) -> Fingerprint {
    match hash_file_blake3(path) {
        Ok(hash) => Fingerprint::Content(hash),
        Err(e) => {
            log::warn!(
                "Hashing {} failed, falling back to name and size: {}",
                path.display(),
                e
            );
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            Fingerprint::Fallback { name, size }
        }
    }
}
