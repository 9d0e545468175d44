use std::path::PathBuf;
use std::time::Duration;

/// A playable audio file, identified by its path.
#[derive(Clone)]
pub struct Track {
    pub path: PathBuf,
    pub title: String,
    pub artist: Option<String>,
    /// Probed length; `None` when the metadata probe failed.
    pub duration: Option<Duration>,
    pub display: String,
}

impl Track {
    /// The plain file name, used for queue matching and list rendering.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_string()
    }
}

/// A directory directly beneath the base dir that can be loaded as a playlist.
#[derive(Clone)]
pub struct Folder {
    pub name: String,
    pub path: PathBuf,
}
