//! The audio backend seam.
//!
//! `Backend` is the exact contract the controller consumes; `RodioBackend`
//! implements it over rodio. The backend reports elapsed time since the most
//! recent `play` call only, so the controller layers its own seek offset on
//! top (see `Player`).

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::{Duration, Instant};

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};

use super::types::BackendError;

pub trait Backend {
    /// Load `path`, replacing whatever was loaded before. Does not start
    /// playback.
    fn load(&mut self, path: &Path) -> Result<(), BackendError>;
    /// Start (or restart) playback, optionally from `start_at` into the
    /// track. Resets the elapsed-since-play clock.
    fn play(&mut self, start_at: Option<Duration>) -> Result<(), BackendError>;
    fn pause(&mut self);
    fn unpause(&mut self);
    fn is_playing(&self) -> bool;
    /// Output volume in [0, 1]. Retained across `load` calls.
    fn set_volume(&mut self, volume: f32);
    /// Time played since the most recent `play` call, excluding pauses.
    /// This is NOT an absolute track position.
    fn elapsed_since_play(&self) -> Duration;
}

pub struct RodioBackend {
    stream: OutputStream,
    sink: Option<Sink>,
    volume: f32,
    started_at: Option<Instant>,
    accumulated: Duration,
}

impl RodioBackend {
    pub fn new() -> Result<Self, BackendError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| BackendError::Device(e.to_string()))?;
        // rodio logs to stderr when OutputStream is dropped. That's useful in
        // debugging, but noisy for a TUI app.
        stream.log_on_drop(false);

        Ok(Self {
            stream,
            sink: None,
            volume: 1.0,
            started_at: None,
            accumulated: Duration::ZERO,
        })
    }
}

impl Backend for RodioBackend {
    fn load(&mut self, path: &Path) -> Result<(), BackendError> {
        let file = File::open(path).map_err(|source| BackendError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let source = Decoder::new(BufReader::new(file)).map_err(|e| BackendError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        if let Some(old) = self.sink.take() {
            old.stop();
        }

        let sink = Sink::connect_new(self.stream.mixer());
        sink.set_volume(self.volume);
        sink.append(source);
        sink.pause();

        self.sink = Some(sink);
        self.started_at = None;
        self.accumulated = Duration::ZERO;
        Ok(())
    }

    fn play(&mut self, start_at: Option<Duration>) -> Result<(), BackendError> {
        let sink = self.sink.as_ref().ok_or(BackendError::NothingLoaded)?;

        // Seeking in place keeps the decoded stream alive; rebuilding the
        // sink here would produce an audible glitch.
        if let Some(offset) = start_at {
            sink.try_seek(offset)
                .map_err(|e| BackendError::Seek(e.to_string()))?;
        }
        sink.play();

        self.started_at = Some(Instant::now());
        self.accumulated = Duration::ZERO;
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(sink) = self.sink.as_ref() {
            sink.pause();
        }
        if let Some(st) = self.started_at.take() {
            self.accumulated += st.elapsed();
        }
    }

    fn unpause(&mut self) {
        let Some(sink) = self.sink.as_ref() else {
            return;
        };
        if sink.is_paused() {
            sink.play();
            self.started_at = Some(Instant::now());
        }
    }

    fn is_playing(&self) -> bool {
        self.sink
            .as_ref()
            .map(|s| !s.is_paused() && !s.empty())
            .unwrap_or(false)
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(sink) = self.sink.as_ref() {
            sink.set_volume(self.volume);
        }
    }

    fn elapsed_since_play(&self) -> Duration {
        self.accumulated + self.started_at.map_or(Duration::ZERO, |st| st.elapsed())
    }
}
