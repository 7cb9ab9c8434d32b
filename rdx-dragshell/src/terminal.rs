//! Raw-mode terminal plumbing: the screen guard, the key reader and drawing.

use anyhow::{Context, Result};
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, queue};
use std::io::{stdout, Write};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// How long the key reader blocks before checking whether anyone still listens.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Holds the terminal in raw mode on the alternate screen until dropped.
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub fn enter() -> Result<Self> {
        terminal::enable_raw_mode().context("couldn't switch the terminal to raw mode")?;
        // From here on, Drop puts the terminal back even if setup fails.
        let guard = Self { _private: () };
        execute!(stdout(), EnterAlternateScreen, Hide)
            .context("couldn't open the alternate screen")?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        execute!(stdout(), Show, LeaveAlternateScreen).ok();
        terminal::disable_raw_mode().ok();
    }
}

/// Reads key presses and forwards their identifiers until the receiver closes.
///
/// Blocking; run it on `spawn_blocking`.
pub fn read_keys(keys: mpsc::Sender<String>) -> Result<()> {
    loop {
        if keys.is_closed() {
            debug!("Key receiver closed, reader stopping.");
            return Ok(());
        }
        if !event::poll(POLL_INTERVAL).context("couldn't poll the terminal")? {
            continue;
        }
        let Event::Key(key) = event::read().context("couldn't read from the terminal")? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        if let Some(name) = key_name(&key) {
            trace!("Key {:?}", name);
            if keys.blocking_send(name).is_err() {
                return Ok(());
            }
        }
    }
}

/// The identifier the input mapper knows a key by.
///
/// Printable keys are themselves (`g`, `?`), space and the named keys are
/// lowercase words, and Control adds a `ctrl+` prefix.
pub fn key_name(key: &KeyEvent) -> Option<String> {
    let name = match key.code {
        KeyCode::Char(' ') => "space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "enter".to_string(),
        KeyCode::Tab => "tab".to_string(),
        KeyCode::Backspace => "backspace".to_string(),
        KeyCode::Esc => "esc".to_string(),
        KeyCode::Up => "up".to_string(),
        KeyCode::Down => "down".to_string(),
        KeyCode::Left => "left".to_string(),
        KeyCode::Right => "right".to_string(),
        KeyCode::F(n) => format!("f{}", n),
        _ => return None,
    };
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        Some(format!("ctrl+{}", name))
    } else {
        Some(name)
    }
}

/// Replaces the screen with `text`. Raw mode needs explicit carriage returns.
pub fn draw(text: &str) -> Result<()> {
    let mut out = stdout();
    queue!(out, MoveTo(0, 0), Clear(ClearType::All))?;
    for line in text.lines() {
        write!(out, "{}\r\n", line)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn printable_keys_are_themselves() {
        assert_eq!(
            key_name(&press(KeyCode::Char('g'), KeyModifiers::NONE)),
            Some("g".to_string())
        );
        assert_eq!(
            key_name(&press(KeyCode::Char('?'), KeyModifiers::SHIFT)),
            Some("?".to_string())
        );
    }

    #[test]
    fn named_keys_are_lowercase_words() {
        assert_eq!(
            key_name(&press(KeyCode::Char(' '), KeyModifiers::NONE)),
            Some("space".to_string())
        );
        assert_eq!(
            key_name(&press(KeyCode::Esc, KeyModifiers::NONE)),
            Some("esc".to_string())
        );
        assert_eq!(
            key_name(&press(KeyCode::F(5), KeyModifiers::NONE)),
            Some("f5".to_string())
        );
    }

    #[test]
    fn control_is_a_prefix() {
        assert_eq!(
            key_name(&press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some("ctrl+c".to_string())
        );
    }

    #[test]
    fn unnamed_keys_are_dropped() {
        assert_eq!(key_name(&press(KeyCode::Insert, KeyModifiers::NONE)), None);
        assert_eq!(key_name(&press(KeyCode::Null, KeyModifiers::NONE)), None);
    }
}
