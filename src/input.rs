use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

/// Which key map applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Browse,
    Form,
    Confirm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Down,
    Up,
    Reload,
    NewArticle,
    Edit,
    Delete,
    OpenImage,
    DismissNotice,
    Confirm,
    Decline,
    NextField,
    Char(char),
    Backspace,
    Enter,
    RemoveImage,
    Submit,
    Cancel,
    None,
}

pub fn poll_action(mode: InputMode) -> anyhow::Result<Action> {
    if !event::poll(Duration::from_millis(50))? {
        return Ok(Action::None);
    }

    match event::read()? {
        Event::Key(key) if key.kind != KeyEventKind::Release => Ok(map_key(mode, key)),
        _ => Ok(Action::None),
    }
}

pub fn map_key(mode: InputMode, key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    match mode {
        InputMode::Confirm => match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Action::Confirm,
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Action::Decline,
            _ => Action::None,
        },
        InputMode::Form => match (code, modifiers) {
            (KeyCode::Esc, _) => Action::Cancel,
            (KeyCode::Tab, _) => Action::NextField,
            (KeyCode::Enter, _) => Action::Enter,
            (KeyCode::Backspace, _) => Action::Backspace,
            (KeyCode::Delete, _) => Action::RemoveImage,
            (KeyCode::Up, _) => Action::Up,
            (KeyCode::Down, _) => Action::Down,
            (KeyCode::Char('s'), KeyModifiers::CONTROL) => Action::Submit,
            (KeyCode::Char(_), m) if m.contains(KeyModifiers::CONTROL) => Action::None,
            (KeyCode::Char(c), _) => Action::Char(c),
            _ => Action::None,
        },
        InputMode::Browse => match code {
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Char('j') | KeyCode::Down => Action::Down,
            KeyCode::Char('k') | KeyCode::Up => Action::Up,
            KeyCode::Char('r') => Action::Reload,
            KeyCode::Char('n') => Action::NewArticle,
            KeyCode::Char('e') | KeyCode::Enter => Action::Edit,
            KeyCode::Char('d') | KeyCode::Delete => Action::Delete,
            KeyCode::Char('o') => Action::OpenImage,
            KeyCode::Char('x') => Action::DismissNotice,
            KeyCode::Tab => Action::NextField,
            _ => Action::None,
        },
    }
}
