use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use std::time::Duration;

use crate::tui_app::App;

/// Poll for and handle events. Returns true if an event was processed.
pub fn handle_events(app: &mut App) -> std::io::Result<bool> {
    if event::poll(Duration::from_millis(100))?
        && let Event::Key(key) = event::read()?
    {
        // Only handle Press events (ignore Release on some platforms)
        if key.kind != KeyEventKind::Press {
            return Ok(false);
        }
        handle_key(app, key);
        return Ok(true);
    }
    Ok(false)
}

pub fn handle_key(app: &mut App, key: KeyEvent) {
    match key.code {
        // Quit
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,

        // Field selection
        KeyCode::Up | KeyCode::Char('k') | KeyCode::BackTab => app.move_up(),
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => app.move_down(),

        // Value adjustment
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('+') => app.increase(),
        KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('-') => app.decrease(),
        KeyCode::PageUp => app.page_up(),
        KeyCode::PageDown => app.page_down(),
        KeyCode::Char(' ') | KeyCode::Enter => app.toggle(),

        // Back to the starting configuration
        KeyCode::Char('r') => app.reset(),

        _ => {}
    }
}
