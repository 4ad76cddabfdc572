//! Media storage on the local filesystem, for single-host deployments.

pub mod fs;
pub mod probe;

pub use fs::FsMedia;
pub use probe::{DurationProbe, Ffprobe};
