pub mod classifier;
pub mod dedup;
pub mod hasher;
pub mod scanner;
pub mod walker;

pub use classifier::Classifier;
pub use dedup::duplicate_groups;
pub use hasher::{fingerprint, hash_file_blake3, Fingerprint};
pub use scanner::{ScanOptions, Scanner};
pub use walker::{walk_root, WalkOptions, WalkStats};
