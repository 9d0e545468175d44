use std::path::PathBuf;

use crate::library::{Folder, Track};
use crate::player::Progress;

/// The playback state as shown to the UI and MPRIS.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Which pane currently receives list/entry input.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Pane {
    Folders,
    Tracks,
    Queue,
    Url,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StatusKind {
    Idle,
    Info,
    Busy,
    Ok,
    Error,
}

#[derive(Clone, Debug)]
pub struct Status {
    pub kind: StatusKind,
    pub text: String,
}

impl Default for Status {
    fn default() -> Self {
        Self {
            kind: StatusKind::Idle,
            text: "Idle".to_string(),
        }
    }
}

/// UI-shell state. Everything here is display/input bookkeeping; the
/// playback controller owns the playlist and transport state.
pub struct App {
    pub base_dir: PathBuf,
    pub folders: Vec<Folder>,
    /// Scan snapshot of the selected folder, as shown in the tracks pane.
    /// Deliberately not updated by shuffle/queueing; the queue pane shows
    /// the live playlist.
    pub tracks: Vec<Track>,
    pub current_folder: Option<PathBuf>,

    pub focus: Pane,
    pub folder_selected: usize,
    pub track_selected: usize,
    pub queue_selected: usize,

    pub url_input: String,
    pub status: Status,
    pub downloading: bool,

    /// Pending seek-drag fraction; `Some` while the user is adjusting the
    /// position control.
    pub seek_drag: Option<f32>,
    /// Last poller snapshot, kept for rendering between ticks.
    pub progress: Option<Progress>,
}

impl App {
    pub fn new(base_dir: PathBuf, folders: Vec<Folder>) -> Self {
        Self {
            base_dir,
            folders,
            tracks: Vec::new(),
            current_folder: None,
            focus: Pane::Folders,
            folder_selected: 0,
            track_selected: 0,
            queue_selected: 0,
            url_input: String::new(),
            status: Status::default(),
            downloading: false,
            seek_drag: None,
            progress: None,
        }
    }

    pub fn set_status(&mut self, kind: StatusKind, text: impl Into<String>) {
        self.status = Status {
            kind,
            text: text.into(),
        };
    }

    pub fn selected_folder(&self) -> Option<&Folder> {
        self.folders.get(self.folder_selected)
    }

    pub fn selected_track(&self) -> Option<&Track> {
        self.tracks.get(self.track_selected)
    }

    /// Cycle input focus `Folders -> Tracks -> Queue -> Url -> Folders`.
    pub fn focus_next(&mut self) {
        self.focus = match self.focus {
            Pane::Folders => Pane::Tracks,
            Pane::Tracks => Pane::Queue,
            Pane::Queue => Pane::Url,
            Pane::Url => Pane::Folders,
        };
    }

    /// Move the focused pane's selection. `queue_len` is the live playlist
    /// length, which this model does not own.
    pub fn select_delta(&mut self, delta: i32, queue_len: usize) {
        let (slot, len) = match self.focus {
            Pane::Folders => (&mut self.folder_selected, self.folders.len()),
            Pane::Tracks => (&mut self.track_selected, self.tracks.len()),
            Pane::Queue => (&mut self.queue_selected, queue_len),
            Pane::Url => return,
        };
        if len == 0 {
            *slot = 0;
            return;
        }
        let moved = (*slot as i32 + delta).clamp(0, len as i32 - 1);
        *slot = moved as usize;
    }

    /// Replace the tracks pane with a fresh folder scan.
    pub fn set_folder_tracks(&mut self, folder: PathBuf, tracks: Vec<Track>) {
        self.current_folder = Some(folder);
        self.tracks = tracks;
        self.track_selected = 0;
        self.queue_selected = 0;
    }

    pub fn push_url_char(&mut self, c: char) {
        self.url_input.push(c);
    }

    pub fn pop_url_char(&mut self) {
        self.url_input.pop();
    }

    /// Begin a seek drag at `fraction` unless one is already active.
    pub fn begin_seek(&mut self, fraction: f32) {
        if self.seek_drag.is_none() {
            self.seek_drag = Some(fraction.clamp(0.0, 1.0));
        }
    }

    /// Nudge the pending drag target; no-op when no drag is active.
    pub fn adjust_seek(&mut self, delta: f32) {
        if let Some(f) = self.seek_drag {
            self.seek_drag = Some((f + delta).clamp(0.0, 1.0));
        }
    }

    /// Commit the drag: returns the final fraction and clears the drag.
    pub fn take_seek(&mut self) -> Option<f32> {
        self.seek_drag.take()
    }

    pub fn cancel_seek(&mut self) {
        self.seek_drag = None;
    }
}
