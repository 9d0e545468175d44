use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{debug, warn};

use crate::app::{App, Pane, PlaybackState, StatusKind};
use crate::config::Settings;
use crate::download::{DownloadError, Downloader};
use crate::library;
use crate::mpris::{ControlCmd, MprisHandle};
use crate::player::{Backend, Player, PlayerError};
use crate::ui;

use super::actions::{self, UiAction};

/// State tracked by the runtime event loop across iterations.
pub struct EventLoopState {
    last_tick: Instant,
    last_mpris_index: Option<usize>,
    last_mpris_playback: PlaybackState,
}

impl EventLoopState {
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
            last_mpris_index: None,
            last_mpris_playback: PlaybackState::Stopped,
        }
    }
}

/// Main terminal event loop: polls the downloader, drains MPRIS commands,
/// drives the position poller, draws, and dispatches key input. Returns
/// `Ok(())` when shutdown is requested.
#[allow(clippy::too_many_arguments)]
pub fn run<B: Backend>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &Settings,
    app: &mut App,
    player: &mut Player<B>,
    downloader: &mut Downloader,
    mpris: &MprisHandle,
    control_rx: &mpsc::Receiver<ControlCmd>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        // A finished download surfaces here; success also refreshes the
        // folder list so a brand-new folder shows up.
        if let Some(outcome) = downloader.poll() {
            app.downloading = false;
            match outcome.result {
                Ok(()) => {
                    app.set_status(StatusKind::Ok, "Download complete!");
                    app.folders = library::list_folders(&app.base_dir, &settings.library);
                }
                Err(DownloadError::Cancelled) => {
                    app.set_status(StatusKind::Info, "Download cancelled.");
                }
                Err(e) => {
                    app.set_status(StatusKind::Error, format!("Download failed: {e}"));
                }
            }
        }

        while let Ok(cmd) = control_rx.try_recv() {
            if handle_control_cmd(cmd, app, player) {
                return Ok(());
            }
        }

        // Position poller period; input polling below runs much faster.
        let poll_interval = Duration::from_millis(settings.playback.poll_interval_ms);
        if state.last_tick.elapsed() >= poll_interval {
            state.last_tick = Instant::now();
            if let Some(progress) = player.tick(app.seek_drag) {
                app.progress = Some(progress);
            }
        }

        sync_mpris(state, player, mpris);

        terminal.draw(|f| ui::draw(f, app, player, settings))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let Some(action) = actions::map_key(key, app.focus, app.seek_drag.is_some())
                else {
                    continue;
                };
                if apply_action(action, settings, app, player, downloader) {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn playback_state<B: Backend>(player: &Player<B>) -> PlaybackState {
    if player.current_track().is_none() {
        PlaybackState::Stopped
    } else if player.is_playing() {
        PlaybackState::Playing
    } else {
        PlaybackState::Paused
    }
}

fn sync_mpris<B: Backend>(state: &mut EventLoopState, player: &Player<B>, mpris: &MprisHandle) {
    let playback = playback_state(player);
    let index = player.current_index();
    if index != state.last_mpris_index || playback != state.last_mpris_playback {
        mpris.set_track_metadata(index, player.current_track());
        mpris.set_playback(playback);
        state.last_mpris_index = index;
        state.last_mpris_playback = playback;
    }
}

/// Surface a controller failure on the status line; playback state itself
/// is already unchanged by the controller on error.
fn surface(app: &mut App, result: Result<(), PlayerError>) {
    if let Err(e) = result {
        warn!(error = %e, "playback command failed");
        app.set_status(StatusKind::Error, format!("Error loading: {e}"));
    }
}

fn handle_control_cmd<B: Backend>(cmd: ControlCmd, app: &mut App, player: &mut Player<B>) -> bool {
    debug!(?cmd, "mpris command");
    match cmd {
        ControlCmd::Quit => {
            player.stop();
            return true;
        }
        ControlCmd::Play => {
            if !player.is_playing() {
                let result = player.toggle_play_pause();
                surface(app, result);
            }
        }
        ControlCmd::Pause => {
            if player.is_playing() {
                let result = player.toggle_play_pause();
                surface(app, result);
            }
        }
        ControlCmd::PlayPause => {
            let result = player.toggle_play_pause();
            surface(app, result);
        }
        ControlCmd::Stop => player.stop(),
        ControlCmd::Next => {
            let result = player.play_next();
            surface(app, result);
        }
    }
    false
}

/// Apply one user action. Returns true when the loop should exit.
fn apply_action<B: Backend>(
    action: UiAction,
    settings: &Settings,
    app: &mut App,
    player: &mut Player<B>,
    downloader: &mut Downloader,
) -> bool {
    match action {
        UiAction::Quit => {
            player.stop();
            return true;
        }
        UiAction::FocusNext => app.focus_next(),
        UiAction::MoveDown => app.select_delta(1, player.playlist().len()),
        UiAction::MoveUp => app.select_delta(-1, player.playlist().len()),

        UiAction::Activate => match app.focus {
            Pane::Folders => {
                if let Some(folder) = app.selected_folder().cloned() {
                    let tracks = player.load_folder(&folder.path, &settings.library).to_vec();
                    let count = tracks.len();
                    app.set_folder_tracks(folder.path, tracks);
                    app.progress = None;
                    app.cancel_seek();
                    app.set_status(
                        StatusKind::Info,
                        format!("Loaded {} ({count} tracks)", folder.name),
                    );
                }
            }
            Pane::Tracks => {
                let result = player.play_at(app.track_selected);
                surface(app, result);
            }
            Pane::Queue => {
                let result = player.play_at(app.queue_selected);
                surface(app, result);
            }
            Pane::Url => start_download(app, downloader),
        },

        UiAction::AddToQueue => {
            if let Some(name) = app.selected_track().map(|t| t.file_name()) {
                if player.add_to_queue(&name) {
                    app.set_status(StatusKind::Info, format!("Queued {name} again"));
                }
            }
        }

        UiAction::TogglePlayPause => {
            let result = player.toggle_play_pause();
            surface(app, result);
        }
        UiAction::NextTrack => {
            let result = player.play_next();
            surface(app, result);
        }
        UiAction::Shuffle => {
            let result = player.shuffle();
            surface(app, result);
        }
        UiAction::ToggleLoop => {
            let on = player.toggle_loop();
            app.set_status(
                StatusKind::Info,
                if on { "Loop: ON" } else { "Loop: OFF" },
            );
        }
        UiAction::ToggleMute => {
            player.toggle_mute();
        }
        UiAction::VolumeUp => {
            let v = player
                .volume()
                .saturating_add(settings.controls.volume_step)
                .min(100);
            player.set_volume(v);
        }
        UiAction::VolumeDown => {
            let v = player.volume().saturating_sub(settings.controls.volume_step);
            player.set_volume(v);
        }

        UiAction::SeekBack | UiAction::SeekForward => {
            let step = settings.controls.seek_step_percent as f32 / 100.0;
            let delta = if action == UiAction::SeekBack {
                -step
            } else {
                step
            };
            if app.seek_drag.is_none() {
                let from = app.progress.map(|p| p.fraction).unwrap_or(0.0);
                app.begin_seek(from);
            }
            app.adjust_seek(delta);
        }
        UiAction::SeekCommit => {
            if let Some(fraction) = app.take_seek() {
                let result = player.seek(fraction);
                surface(app, result);
            }
        }
        UiAction::SeekCancel => app.cancel_seek(),

        UiAction::StartDownload => start_download(app, downloader),
        UiAction::CancelDownload => {
            if downloader.in_flight() {
                downloader.cancel();
                app.set_status(StatusKind::Busy, "Cancelling download...");
            }
        }
        UiAction::UrlChar(c) => app.push_url_char(c),
        UiAction::UrlBackspace => app.pop_url_char(),
    }

    false
}

fn start_download(app: &mut App, downloader: &mut Downloader) {
    let dest = app
        .current_folder
        .clone()
        .unwrap_or_else(|| app.base_dir.clone());

    match downloader.start(&app.url_input, &dest) {
        Ok(()) => {
            app.downloading = true;
            app.set_status(StatusKind::Busy, "Downloading...");
        }
        Err(e) => app.set_status(StatusKind::Error, format!("Download not started: {e}")),
    }
}
