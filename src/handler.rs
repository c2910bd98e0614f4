use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use crate::app::{point_in_rect, App};
use crate::tui::AppEvent;

/// Lines moved per mouse wheel notch
const WHEEL_STEP: u16 = 3;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        // The next render re-measures the wrapped conversation and re-pins the scroll
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Reply(outcome) => app.on_reply(outcome),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        // Quit
        KeyCode::Char('c') if ctrl => app.should_quit = true,
        KeyCode::Esc => app.should_quit = true,

        // Half-page scroll
        KeyCode::Char('d') if ctrl => app.scroll_half_page_down(),
        KeyCode::Char('u') if ctrl => app.scroll_half_page_up(),
        KeyCode::PageDown => app.scroll_half_page_down(),
        KeyCode::PageUp => app.scroll_half_page_up(),

        // Send, or pick the highlighted suggestion when there's nothing to send
        KeyCode::Enter => {
            if !app.submit() && app.chat.draft().trim().is_empty() {
                app.apply_suggestion();
            }
        }
        // Never clobbers something the user typed
        KeyCode::Tab => {
            if app.chat.draft().trim().is_empty() {
                app.apply_suggestion();
            }
        }

        // Suggestions while the conversation is empty, scrolling afterwards
        KeyCode::Down => {
            if app.chat.shows_suggestions() {
                app.suggestion_nav_down();
            } else {
                app.scroll_down(1);
            }
        }
        KeyCode::Up => {
            if app.chat.shows_suggestions() {
                app.suggestion_nav_up();
            } else {
                app.scroll_up(1);
            }
        }

        // Line editing
        KeyCode::Backspace => app.delete_back(),
        KeyCode::Delete => app.delete_forward(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Char(c) if !ctrl => app.insert_char(c),

        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;
    let in_chat = app.chat_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::ScrollDown if in_chat => app.scroll_down(WHEEL_STEP),
        MouseEventKind::ScrollUp if in_chat => app.scroll_up(WHEEL_STEP),
        MouseEventKind::Down(MouseButton::Left) => {
            if app.chat.shows_suggestions() {
                if let Some(i) = app.suggestion_at(x, y) {
                    app.suggestion_state.select(Some(i));
                    app.apply_suggestion();
                }
            }
        }
        _ => {}
    }
}
