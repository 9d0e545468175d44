//! Application module: exposes the UI-shell model used by the TUI and
//! runtime.
//!
//! The `App` model lives in `app::model` and holds the folder/track lists,
//! pane focus, URL entry, the status line and the seek-drag state. Playback
//! state itself lives in `player::Player`.

mod model;

pub use model::*;
