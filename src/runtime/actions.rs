//! Explicit command dispatch: every key press maps to a `UiAction`, and the
//! event loop applies actions. Keeps the key table in one testable place.

use crossterm::event::{KeyCode, KeyEvent};

use crate::app::Pane;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    Quit,
    FocusNext,
    MoveUp,
    MoveDown,
    /// Enter on the focused pane: open a folder, play a track, or start a
    /// download from the URL pane.
    Activate,
    AddToQueue,
    TogglePlayPause,
    NextTrack,
    Shuffle,
    ToggleLoop,
    ToggleMute,
    VolumeUp,
    VolumeDown,
    SeekBack,
    SeekForward,
    SeekCommit,
    SeekCancel,
    StartDownload,
    CancelDownload,
    UrlChar(char),
    UrlBackspace,
}

/// Translate a key press into an action, given the focused pane and whether
/// a seek drag is in progress. A drag captures the whole keyboard until it
/// is committed or cancelled.
pub fn map_key(key: KeyEvent, focus: Pane, dragging: bool) -> Option<UiAction> {
    if dragging {
        return match key.code {
            KeyCode::Char('h') | KeyCode::Left => Some(UiAction::SeekBack),
            KeyCode::Char('l') | KeyCode::Right => Some(UiAction::SeekForward),
            KeyCode::Enter => Some(UiAction::SeekCommit),
            KeyCode::Esc => Some(UiAction::SeekCancel),
            _ => None,
        };
    }

    // The URL pane swallows printable characters for text entry.
    if focus == Pane::Url {
        return match key.code {
            KeyCode::Tab => Some(UiAction::FocusNext),
            KeyCode::Esc => Some(UiAction::FocusNext),
            KeyCode::Enter => Some(UiAction::StartDownload),
            KeyCode::Backspace => Some(UiAction::UrlBackspace),
            KeyCode::Char(c) if !c.is_control() => Some(UiAction::UrlChar(c)),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Char('q') => Some(UiAction::Quit),
        KeyCode::Tab => Some(UiAction::FocusNext),
        KeyCode::Char('j') | KeyCode::Down => Some(UiAction::MoveDown),
        KeyCode::Char('k') | KeyCode::Up => Some(UiAction::MoveUp),
        KeyCode::Enter => Some(UiAction::Activate),
        KeyCode::Char('a') => Some(UiAction::AddToQueue),
        KeyCode::Char('p') | KeyCode::Char(' ') => Some(UiAction::TogglePlayPause),
        KeyCode::Char('n') => Some(UiAction::NextTrack),
        KeyCode::Char('s') => Some(UiAction::Shuffle),
        KeyCode::Char('r') => Some(UiAction::ToggleLoop),
        KeyCode::Char('m') => Some(UiAction::ToggleMute),
        KeyCode::Char('+') | KeyCode::Char('=') => Some(UiAction::VolumeUp),
        KeyCode::Char('-') => Some(UiAction::VolumeDown),
        KeyCode::Char('h') | KeyCode::Left => Some(UiAction::SeekBack),
        KeyCode::Char('l') | KeyCode::Right => Some(UiAction::SeekForward),
        KeyCode::Char('d') => Some(UiAction::StartDownload),
        KeyCode::Char('c') => Some(UiAction::CancelDownload),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEvent;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::from(code)
    }

    #[test]
    fn list_panes_map_transport_and_navigation_keys() {
        let f = Pane::Folders;
        assert_eq!(map_key(key(KeyCode::Char('q')), f, false), Some(UiAction::Quit));
        assert_eq!(map_key(key(KeyCode::Char('j')), f, false), Some(UiAction::MoveDown));
        assert_eq!(map_key(key(KeyCode::Up), f, false), Some(UiAction::MoveUp));
        assert_eq!(map_key(key(KeyCode::Enter), f, false), Some(UiAction::Activate));
        assert_eq!(
            map_key(key(KeyCode::Char(' ')), f, false),
            Some(UiAction::TogglePlayPause)
        );
        assert_eq!(map_key(key(KeyCode::Char('s')), f, false), Some(UiAction::Shuffle));
        assert_eq!(map_key(key(KeyCode::Char('x')), f, false), None);
    }

    #[test]
    fn url_pane_captures_text_input() {
        let u = Pane::Url;
        assert_eq!(
            map_key(key(KeyCode::Char('q')), u, false),
            Some(UiAction::UrlChar('q')),
            "typing in the URL pane must not quit"
        );
        assert_eq!(
            map_key(key(KeyCode::Backspace), u, false),
            Some(UiAction::UrlBackspace)
        );
        assert_eq!(
            map_key(key(KeyCode::Enter), u, false),
            Some(UiAction::StartDownload)
        );
        assert_eq!(map_key(key(KeyCode::Tab), u, false), Some(UiAction::FocusNext));
    }

    #[test]
    fn seek_drag_captures_the_keyboard() {
        let f = Pane::Tracks;
        assert_eq!(map_key(key(KeyCode::Char('l')), f, true), Some(UiAction::SeekForward));
        assert_eq!(map_key(key(KeyCode::Left), f, true), Some(UiAction::SeekBack));
        assert_eq!(map_key(key(KeyCode::Enter), f, true), Some(UiAction::SeekCommit));
        assert_eq!(map_key(key(KeyCode::Esc), f, true), Some(UiAction::SeekCancel));
        assert_eq!(
            map_key(key(KeyCode::Char('q')), f, true),
            None,
            "other keys are ignored mid-drag"
        );
    }
}
