//! Key bindings as a closed set of commands.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Everything the user can ask the dashboard to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MoveUp,
    MoveDown,
    Execute,
    Quit,
}

impl Command {
    /// Map a key press to a command. Releases and repeats are ignored.
    pub fn from_key(key: &KeyEvent) -> Option<Self> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => Some(Self::MoveUp),
            KeyCode::Down | KeyCode::Char('j') => Some(Self::MoveDown),
            KeyCode::Enter => Some(Self::Execute),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Self::Quit)
            }
            KeyCode::Char('q') => Some(Self::Quit),
            _ => None,
        }
    }
}
