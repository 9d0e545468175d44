//! External downloader invocation.
//!
//! One worker thread per request runs the external program (yt-dlp by
//! default) and reports back over an explicit result channel. The worker is
//! cancellable: a shared flag makes it kill the child process. A second
//! request while one is in flight is rejected up front.

use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;
use tracing::{error, info};

use crate::config::DownloadSettings;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("no URL given")]
    EmptyUrl,
    #[error("{} is not a folder", .0.display())]
    NoFolder(PathBuf),
    #[error("a download is already running")]
    Busy,
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} failed ({status}): {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("download cancelled")]
    Cancelled,
    #[error("failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// The worker's final report, delivered over the result channel.
pub struct DownloadOutcome {
    pub url: String,
    pub result: Result<(), DownloadError>,
}

struct ActiveDownload {
    url: String,
    cancel: Arc<AtomicBool>,
    rx: Receiver<Result<(), DownloadError>>,
    join: Option<JoinHandle<()>>,
}

pub struct Downloader {
    program: String,
    audio_format: String,
    active: Option<ActiveDownload>,
}

/// Arguments for an audio-only extraction into `dest`, titled after the
/// source. The URL is always the final argument.
fn download_args(dest: &Path, audio_format: &str, url: &str) -> Vec<OsString> {
    let mut template = dest.to_path_buf().into_os_string();
    template.push("/%(title)s.%(ext)s");

    vec![
        OsString::from("-x"),
        OsString::from("--audio-format"),
        OsString::from(audio_format),
        OsString::from("-o"),
        template,
        OsString::from(url),
    ]
}

fn run_child(
    mut cmd: Command,
    program: &str,
    cancel: &AtomicBool,
) -> Result<(), DownloadError> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| DownloadError::Spawn {
            program: program.to_string(),
            source,
        })?;

    // Drain stderr on the side so a chatty child can't fill the pipe and
    // stall before we see its exit status.
    let drain = child.stderr.take().map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = String::new();
            let _ = pipe.read_to_string(&mut buf);
            buf
        })
    });
    let stderr_of = |drain: Option<JoinHandle<String>>| {
        drain
            .and_then(|h| h.join().ok())
            .unwrap_or_default()
            .trim()
            .to_string()
    };

    loop {
        if cancel.load(Ordering::Relaxed) {
            let _ = child.kill();
            let _ = child.wait();
            let _ = stderr_of(drain);
            return Err(DownloadError::Cancelled);
        }

        match child.try_wait() {
            Ok(Some(status)) => {
                return if status.success() {
                    let _ = stderr_of(drain);
                    Ok(())
                } else {
                    Err(DownloadError::Failed {
                        program: program.to_string(),
                        status: status.to_string(),
                        stderr: stderr_of(drain),
                    })
                };
            }
            Ok(None) => thread::sleep(Duration::from_millis(100)),
            Err(source) => {
                let _ = stderr_of(drain);
                return Err(DownloadError::Wait {
                    program: program.to_string(),
                    source,
                });
            }
        }
    }
}

impl Downloader {
    pub fn new(settings: &DownloadSettings) -> Self {
        Self {
            program: settings.program.clone(),
            audio_format: settings.audio_format.clone(),
            active: None,
        }
    }

    pub fn in_flight(&self) -> bool {
        self.active.is_some()
    }

    /// Kick off a download of `url` into `dest`. Rejects empty URLs, missing
    /// folders and concurrent requests instead of silently racing them.
    pub fn start(&mut self, url: &str, dest: &Path) -> Result<(), DownloadError> {
        if self.active.is_some() {
            return Err(DownloadError::Busy);
        }
        let url = url.trim();
        if url.is_empty() {
            return Err(DownloadError::EmptyUrl);
        }
        if !dest.is_dir() {
            return Err(DownloadError::NoFolder(dest.to_path_buf()));
        }

        let mut cmd = Command::new(&self.program);
        cmd.args(download_args(dest, &self.audio_format, url));

        info!(url, dest = %dest.display(), program = %self.program, "starting download");
        self.active = Some(spawn_worker(cmd, self.program.clone(), url.to_string()));
        Ok(())
    }

    /// Ask the in-flight worker (if any) to kill its child process. The
    /// `Cancelled` outcome still arrives through `poll`.
    pub fn cancel(&mut self) {
        if let Some(active) = self.active.as_ref() {
            active.cancel.store(true, Ordering::Relaxed);
        }
    }

    /// Non-blocking check for a finished download; called from the event
    /// loop. Returns the outcome once, then the downloader is idle again.
    pub fn poll(&mut self) -> Option<DownloadOutcome> {
        let finished = match self.active.as_ref() {
            Some(active) => active.rx.try_recv().ok(),
            None => return None,
        };

        let result = finished?;
        let mut active = self.active.take().expect("checked above");
        if let Some(join) = active.join.take() {
            let _ = join.join();
        }

        if let Err(ref e) = result {
            error!(url = %active.url, error = %e, "download failed");
        } else {
            info!(url = %active.url, "download finished");
        }

        Some(DownloadOutcome {
            url: active.url,
            result,
        })
    }
}

fn spawn_worker(cmd: Command, program: String, url: String) -> ActiveDownload {
    let cancel = Arc::new(AtomicBool::new(false));
    let (tx, rx): (Sender<Result<(), DownloadError>>, _) = mpsc::channel();

    let cancel_for_worker = cancel.clone();
    let join = thread::spawn(move || {
        let result = run_child(cmd, &program, &cancel_for_worker);
        let _ = tx.send(result);
    });

    ActiveDownload {
        url,
        cancel,
        rx,
        join: Some(join),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn settings(program: &str) -> DownloadSettings {
        DownloadSettings {
            program: program.to_string(),
            audio_format: "mp3".to_string(),
        }
    }

    fn wait_outcome(d: &mut Downloader, timeout: Duration) -> DownloadOutcome {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(outcome) = d.poll() {
                return outcome;
            }
            assert!(Instant::now() < deadline, "no outcome before timeout");
            thread::sleep(Duration::from_millis(20));
        }
    }

    #[test]
    fn args_use_title_template_in_dest_and_url_last() {
        let args = download_args(Path::new("/music/F"), "mp3", "U");
        assert_eq!(
            args,
            vec![
                OsString::from("-x"),
                OsString::from("--audio-format"),
                OsString::from("mp3"),
                OsString::from("-o"),
                OsString::from("/music/F/%(title)s.%(ext)s"),
                OsString::from("U"),
            ]
        );
    }

    #[test]
    fn start_rejects_empty_url_and_missing_folder() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = Downloader::new(&settings("true"));

        assert!(matches!(
            d.start("   ", dir.path()),
            Err(DownloadError::EmptyUrl)
        ));
        assert!(matches!(
            d.start("https://example.com/a", &dir.path().join("missing")),
            Err(DownloadError::NoFolder(_))
        ));
        assert!(!d.in_flight());
    }

    #[cfg(unix)]
    #[test]
    fn successful_run_reports_ok_and_clears_the_slot() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = Downloader::new(&settings("true"));

        d.start("https://example.com/a", dir.path()).unwrap();
        assert!(d.in_flight());

        let outcome = wait_outcome(&mut d, Duration::from_secs(5));
        assert_eq!(outcome.url, "https://example.com/a");
        assert!(outcome.result.is_ok());
        assert!(!d.in_flight());
    }

    #[cfg(unix)]
    #[test]
    fn failing_child_reports_exit_status() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = Downloader::new(&settings("false"));

        d.start("https://example.com/a", dir.path()).unwrap();
        let outcome = wait_outcome(&mut d, Duration::from_secs(5));
        assert!(matches!(outcome.result, Err(DownloadError::Failed { .. })));
    }

    #[test]
    fn unknown_program_reports_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = Downloader::new(&settings("definitely-not-a-real-downloader"));

        d.start("https://example.com/a", dir.path()).unwrap();
        let outcome = wait_outcome(&mut d, Duration::from_secs(5));
        assert!(matches!(outcome.result, Err(DownloadError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn second_start_while_running_is_busy_and_cancel_kills_it() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = Downloader::new(&settings("true"));

        // Plant a long-running worker directly so the slot is occupied for
        // the whole test.
        let mut cmd = Command::new("sleep");
        cmd.arg("30");
        d.active = Some(spawn_worker(cmd, "sleep".to_string(), "long".to_string()));

        assert!(matches!(
            d.start("https://example.com/a", dir.path()),
            Err(DownloadError::Busy)
        ));

        d.cancel();
        let outcome = wait_outcome(&mut d, Duration::from_secs(5));
        assert!(matches!(outcome.result, Err(DownloadError::Cancelled)));
        assert!(!d.in_flight());
    }
}
