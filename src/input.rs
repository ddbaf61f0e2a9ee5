//! Key bindings: arrows plus the E/Q rotation keys, and vim-style letters.

use crate::game::Command;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Map a key press to a game command. Releases, repeats and unbound keys map to `None`.
pub fn key_to_command(key: KeyEvent) -> Option<Command> {
    let KeyEvent {
        code,
        modifiers,
        kind,
        ..
    } = key;
    if kind != KeyEventKind::Press {
        return None;
    }
    if modifiers == KeyModifiers::CONTROL {
        return matches!(code, KeyCode::Char('c')).then_some(Command::Quit);
    }
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        return None;
    }
    match code {
        KeyCode::Esc => Some(Command::Quit),
        KeyCode::Left | KeyCode::Char('h') => Some(Command::MoveLeft),
        KeyCode::Right | KeyCode::Char('l') => Some(Command::MoveRight),
        KeyCode::Down | KeyCode::Char('j') => Some(Command::SoftDrop),
        KeyCode::Up | KeyCode::Char('e' | 'E' | 'k') => Some(Command::RotateCw),
        KeyCode::Char('q' | 'Q' | 'u') => Some(Command::RotateCcw),
        _ => None,
    }
}
