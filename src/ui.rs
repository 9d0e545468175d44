//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Gauge, List, ListItem, Padding, Paragraph, Wrap},
};
use std::time::Duration;

use crate::app::{App, Pane, StatusKind};
use crate::config::Settings;
use crate::player::{Backend, Player};

const CONTROLS_TEXT: &str = "[tab] pane | [j/k] move | [enter] open/play | [a] queue again | \
     [space/p] play/pause | [n] next | [s] shuffle | [r] loop | [m] mute | [-/+] volume | \
     [h/l] seek (enter applies, esc cancels) | [d] download | [c] cancel download | [q] quit";

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn pane_block(title: &str, focused: bool) -> Block<'_> {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {title} "));
    if focused {
        block.border_style(Style::default().add_modifier(Modifier::BOLD))
    } else {
        block
    }
}

fn status_style(kind: StatusKind) -> Style {
    let color = match kind {
        StatusKind::Idle => Color::DarkGray,
        StatusKind::Info => Color::White,
        StatusKind::Busy => Color::Blue,
        StatusKind::Ok => Color::Green,
        StatusKind::Error => Color::Red,
    };
    Style::default().fg(color)
}

fn draw_list(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    focused: bool,
    items: Vec<ListItem<'_>>,
    selected: usize,
) {
    let empty = items.is_empty();
    let list = List::new(items)
        .block(pane_block(title, focused))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    let mut state = ratatui::widgets::ListState::default();
    if !empty {
        state.select(Some(selected));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

/// Render the entire UI into the provided `frame`.
pub fn draw<B: Backend>(frame: &mut Frame, app: &App, player: &Player<B>, settings: &Settings) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Min(8),    // folder/track/queue lists
            Constraint::Length(3), // now playing
            Constraint::Length(3), // position
            Constraint::Length(3), // volume
            Constraint::Length(3), // url entry
            Constraint::Length(3), // status
            Constraint::Length(4), // controls
        ])
        .split(frame.area());

    // Header
    let header = Paragraph::new(settings.ui.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" tavern ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    // Folder / track / queue columns
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(40),
            Constraint::Percentage(35),
        ])
        .split(chunks[1]);

    let folder_items: Vec<ListItem> = app
        .folders
        .iter()
        .map(|f| ListItem::new(f.name.as_str()))
        .collect();
    draw_list(
        frame,
        columns[0],
        "folders",
        app.focus == Pane::Folders,
        folder_items,
        app.folder_selected,
    );

    let track_items: Vec<ListItem> = app
        .tracks
        .iter()
        .map(|t| ListItem::new(t.display.as_str()))
        .collect();
    draw_list(
        frame,
        columns[1],
        "tracks",
        app.focus == Pane::Tracks,
        track_items,
        app.track_selected,
    );

    // The queue pane shows the live playlist; the playing entry gets a
    // marker instead of stealing the selection highlight.
    let playing = player.current_index();
    let queue_items: Vec<ListItem> = player
        .playlist()
        .iter()
        .enumerate()
        .map(|(i, t)| {
            if playing == Some(i) {
                ListItem::new(format!("♪ {}", t.file_name()))
                    .style(Style::default().fg(Color::Cyan))
            } else {
                ListItem::new(format!("  {}", t.file_name()))
            }
        })
        .collect();
    draw_list(
        frame,
        columns[2],
        "queue",
        app.focus == Pane::Queue,
        queue_items,
        app.queue_selected,
    );

    // Now playing
    let now_playing = {
        let mut parts: Vec<String> = Vec::new();
        match player.current_track() {
            Some(track) => parts.push(format!("♪ {}", track.display)),
            None => parts.push("No track loaded".to_string()),
        }
        if player.loop_enabled() {
            parts.push("Loop: ON".to_string());
        } else {
            parts.push("Loop: OFF".to_string());
        }
        if player.is_muted() {
            parts.push("Muted".to_string());
        }
        if app.downloading {
            parts.push("Downloading".to_string());
        }
        parts.join(" • ")
    };
    let now_playing = Paragraph::new(now_playing).block(
        Block::bordered()
            .padding(Padding {
                left: 1,
                right: 0,
                top: 0,
                bottom: 0,
            })
            .title(" now playing "),
    );
    frame.render_widget(now_playing, chunks[2]);

    // Position gauge. While a drag is pending the gauge shows the drag
    // target, not the live position.
    let (ratio, label) = match app.progress {
        Some(p) => {
            let ratio = match app.seek_drag {
                Some(f) => f as f64,
                None => p.fraction as f64,
            };
            (
                ratio.clamp(0.0, 1.0),
                format!("{} / {}", format_mmss(p.position), format_mmss(p.length)),
            )
        }
        None => (0.0, "00:00 / 00:00".to_string()),
    };
    let position_title = if app.seek_drag.is_some() {
        " position (seeking) "
    } else {
        " position "
    };
    let position = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(position_title))
        .gauge_style(Style::default().fg(Color::Blue).bg(Color::Black))
        .ratio(ratio)
        .label(label);
    frame.render_widget(position, chunks[3]);

    // Volume gauge
    let volume_label = if player.is_muted() {
        "muted".to_string()
    } else {
        format!("{}%", player.volume())
    };
    let volume = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" volume "))
        .gauge_style(Style::default().fg(Color::Green).bg(Color::Black))
        .ratio(if player.is_muted() {
            0.0
        } else {
            player.volume() as f64 / 100.0
        })
        .label(volume_label);
    frame.render_widget(volume, chunks[4]);

    // URL entry
    let url_text = if app.url_input.is_empty() && app.focus != Pane::Url {
        "<press tab until this pane is focused, then type a URL>".to_string()
    } else {
        app.url_input.clone()
    };
    let url = Paragraph::new(url_text).block(pane_block("download URL", app.focus == Pane::Url));
    frame.render_widget(url, chunks[5]);

    // Status line
    let status = Paragraph::new(app.status.text.as_str())
        .style(status_style(app.status.kind))
        .block(
            Block::bordered()
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                })
                .title(" status "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(status, chunks[6]);

    // Controls footer
    let footer = Paragraph::new(CONTROLS_TEXT)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[7]);
}
