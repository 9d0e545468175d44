//! The playback controller: playlist, current index, loop/mute state and the
//! position poller, as one explicit struct.

use std::path::Path;
use std::time::Duration;

use rand::seq::SliceRandom;

use crate::config::{LibrarySettings, PlaybackSettings};
use crate::library::{self, Track};

use super::backend::Backend;
use super::types::{PlayerError, Progress};

/// Auto-advance fires this close to the end of a track.
const END_OF_TRACK_BUFFER: Duration = Duration::from_millis(500);

pub struct Player<B: Backend> {
    backend: B,

    playlist: Vec<Track>,
    /// `None` = no track selected; a value >= `playlist.len()` is the
    /// past-end terminal state reached by `play_next` with loop off.
    current: Option<usize>,

    loop_enabled: bool,
    muted: bool,
    /// The volume slider's own value, 0-100. Unmuting restores from here.
    volume: u8,

    /// Position accumulated before the most recent backend `play` call. The
    /// backend only reports elapsed-since-play, so true position is
    /// `seek_offset + elapsed`.
    seek_offset: Duration,
    track_length: Duration,

    poll_active: bool,
}

impl<B: Backend> Player<B> {
    pub fn new(mut backend: B, settings: &PlaybackSettings) -> Self {
        let volume = settings.volume.min(100);
        backend.set_volume(volume as f32 / 100.0);

        Self {
            backend,
            playlist: Vec::new(),
            current: None,
            loop_enabled: settings.loop_enabled,
            muted: false,
            volume,
            seek_offset: Duration::ZERO,
            track_length: Duration::ZERO,
            poll_active: false,
        }
    }

    pub fn playlist(&self) -> &[Track] {
        &self.playlist
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// The currently selected track, if `current` is a valid index.
    pub fn current_track(&self) -> Option<&Track> {
        self.current.and_then(|i| self.playlist.get(i))
    }

    pub fn is_playing(&self) -> bool {
        self.backend.is_playing()
    }

    pub fn loop_enabled(&self) -> bool {
        self.loop_enabled
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn track_length(&self) -> Duration {
        self.track_length
    }

    pub fn poll_active(&self) -> bool {
        self.poll_active
    }

    /// Replace the playlist with the playable files directly under `dir`.
    /// Resets the current index and stops the poller.
    pub fn load_folder(&mut self, dir: &Path, settings: &LibrarySettings) -> &[Track] {
        self.playlist = library::scan_folder(dir, settings);
        self.current = None;
        self.poll_active = false;
        &self.playlist
    }

    /// Load and play the track at `index`. On failure the playback state is
    /// left unchanged so the previous track keeps its slot.
    pub fn play_at(&mut self, index: usize) -> Result<(), PlayerError> {
        let track = self
            .playlist
            .get(index)
            .ok_or(PlayerError::IndexOutOfRange(index))?;

        self.backend.load(&track.path)?;
        self.backend.play(None)?;

        self.track_length = track.duration.unwrap_or(Duration::ZERO);
        self.seek_offset = Duration::ZERO;
        self.current = Some(index);
        self.poll_active = true;
        Ok(())
    }

    /// Pause when playing; start at index 0 when nothing is selected yet;
    /// otherwise unpause.
    pub fn toggle_play_pause(&mut self) -> Result<(), PlayerError> {
        if self.backend.is_playing() {
            self.backend.pause();
        } else if self.current.is_none() && !self.playlist.is_empty() {
            self.play_at(0)?;
        } else {
            self.backend.unpause();
        }
        Ok(())
    }

    /// Advance to the next track. With loop on the index wraps; with loop
    /// off, running past the end records the past-end index and halts the
    /// poller without playing anything.
    pub fn play_next(&mut self) -> Result<(), PlayerError> {
        if self.playlist.is_empty() {
            return Ok(());
        }

        let next = self.current.map_or(0, |i| i + 1);
        if self.loop_enabled {
            self.play_at(next % self.playlist.len())
        } else if next >= self.playlist.len() {
            self.current = Some(next);
            self.poll_active = false;
            Ok(())
        } else {
            self.play_at(next)
        }
    }

    /// Permute the playlist in place and restart playback from the top.
    pub fn shuffle(&mut self) -> Result<(), PlayerError> {
        if self.playlist.is_empty() {
            return Ok(());
        }
        self.playlist.shuffle(&mut rand::rng());
        self.play_at(0)
    }

    pub fn toggle_loop(&mut self) -> bool {
        self.loop_enabled = !self.loop_enabled;
        self.loop_enabled
    }

    pub fn set_loop(&mut self, enabled: bool) {
        self.loop_enabled = enabled;
    }

    #[cfg(test)]
    pub(crate) fn set_playlist(&mut self, tracks: Vec<Track>) {
        self.playlist = tracks;
        self.current = None;
        self.poll_active = false;
    }

    /// Jump to `fraction` of the track length without reloading the file.
    /// Ignored when no track is active or the length is unknown.
    pub fn seek(&mut self, fraction: f32) -> Result<(), PlayerError> {
        if self.current_track().is_none() || self.track_length.is_zero() {
            return Ok(());
        }

        let fraction = fraction.clamp(0.0, 1.0);
        let target = self.track_length.mul_f64(fraction as f64);

        self.backend.play(Some(target))?;
        self.seek_offset = target;
        Ok(())
    }

    pub fn set_volume(&mut self, percent: u8) {
        self.volume = percent.min(100);
        if !self.muted {
            self.backend.set_volume(self.volume as f32 / 100.0);
        }
    }

    pub fn toggle_mute(&mut self) -> bool {
        if self.muted {
            self.muted = false;
            self.backend.set_volume(self.volume as f32 / 100.0);
        } else {
            self.muted = true;
            self.backend.set_volume(0.0);
        }
        self.muted
    }

    /// Append an existing playlist entry (matched by file name) to the end.
    /// Returns false when no entry matches.
    pub fn add_to_queue(&mut self, file_name: &str) -> bool {
        let found = self
            .playlist
            .iter()
            .find(|t| t.path.file_name().and_then(|n| n.to_str()) == Some(file_name))
            .cloned();

        match found {
            Some(track) => {
                self.playlist.push(track);
                true
            }
            None => false,
        }
    }

    /// Pause playback and halt the poller without touching the index.
    pub fn stop(&mut self) {
        self.backend.pause();
        self.poll_active = false;
    }

    /// One poller period: compute the displayed position and auto-advance
    /// near end-of-track. `held` is the pending seek-drag fraction; while it
    /// is set the position is pinned to it instead of reading the backend,
    /// so the display does not fight the drag.
    pub fn tick(&mut self, held: Option<f32>) -> Option<Progress> {
        if !self.poll_active {
            return None;
        }

        let length = self.track_length;
        let position = match held {
            Some(fraction) => length.mul_f64(fraction.clamp(0.0, 1.0) as f64),
            None => self.seek_offset + self.backend.elapsed_since_play(),
        };

        let fraction = if length.is_zero() {
            0.0
        } else {
            (position.as_secs_f64() / length.as_secs_f64()).min(1.0) as f32
        };

        let progress = Progress {
            position,
            length,
            fraction,
        };

        // Unknown lengths never auto-advance on time, and a drag in progress
        // must not yank the playlist forward.
        if held.is_none() && !length.is_zero() && position + END_OF_TRACK_BUFFER >= length {
            let _ = self.play_next();
        }

        Some(progress)
    }
}
