//! Library module: folder listing and audio-file scanning.
//!
//! Folders directly beneath the base directory are playlist sources; the
//! files inside a selected folder become the track list.

mod model;
mod scan;

pub use model::{Folder, Track};
pub use scan::{list_folders, scan_folder};
