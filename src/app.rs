use std::sync::Arc;
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tracing::debug;

use crate::chat::{ChatView, SUGGESTIONS};
use crate::client::ChatBackend;
use crate::error::ChatError;
use crate::tui::{AppEvent, EventSender};

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub chat: ChatView,
    pub endpoint: String,

    // Input state
    pub cursor: usize, // char position in the draft

    // Message list state
    pub scroll: u16,
    pub follow_tail: bool,
    pub chat_lines: u16,  // Wrapped height of the conversation, measured during render
    pub chat_height: u16, // Inner height of the message area, set during render
    pub chat_width: u16,  // Inner width of the message area, set during render

    // Empty-state suggestions
    pub suggestion_state: ListState,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Panel areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub suggestions_area: Option<Rect>,

    backend: Arc<dyn ChatBackend>,
    events: EventSender,
}

impl App {
    pub fn new(backend: Arc<dyn ChatBackend>, events: EventSender, endpoint: &str) -> Self {
        let mut suggestion_state = ListState::default();
        suggestion_state.select(Some(0));

        Self {
            should_quit: false,
            chat: ChatView::new(),
            endpoint: endpoint.to_string(),

            cursor: 0,

            scroll: 0,
            follow_tail: true,
            chat_lines: 0,
            chat_height: 0,
            chat_width: 0,

            suggestion_state,

            animation_frame: 0,

            chat_area: None,
            suggestions_area: None,

            backend,
            events,
        }
    }

    // Draft editing

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(self.chat.draft(), self.cursor);
        self.chat.draft_mut().insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn delete_back(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(self.chat.draft(), self.cursor);
            self.chat.draft_mut().remove(byte_pos);
        }
    }

    pub fn delete_forward(&mut self) {
        if self.cursor < self.draft_len() {
            let byte_pos = char_to_byte_index(self.chat.draft(), self.cursor);
            self.chat.draft_mut().remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.draft_len());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.draft_len();
    }

    fn draft_len(&self) -> usize {
        self.chat.draft().chars().count()
    }

    // Sending

    /// Submit the draft and fire the request in the background. The reply
    /// comes back through the event channel as [`AppEvent::Reply`].
    pub fn submit(&mut self) -> bool {
        let Some(text) = self.chat.submit() else {
            return false;
        };

        self.cursor = 0;
        self.animation_frame = 0;
        self.scroll_to_bottom();

        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = backend.send(&text).await;
            if events.send(AppEvent::Reply(outcome)).is_err() {
                debug!("reply arrived after the event loop shut down");
            }
        });
        true
    }

    pub fn on_reply(&mut self, outcome: Result<String, ChatError>) {
        if self.chat.settle(outcome) {
            self.scroll_to_bottom();
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.chat.is_pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Suggestions

    pub fn suggestion_nav_down(&mut self) {
        let i = match self.suggestion_state.selected() {
            Some(i) if i + 1 < SUGGESTIONS.len() => i + 1,
            Some(i) => i,
            None => 0,
        };
        self.suggestion_state.select(Some(i));
    }

    pub fn suggestion_nav_up(&mut self) {
        let i = self.suggestion_state.selected().unwrap_or(0).saturating_sub(1);
        self.suggestion_state.select(Some(i));
    }

    /// Copy the highlighted suggestion into the draft. Only while the
    /// conversation is still empty.
    pub fn apply_suggestion(&mut self) -> bool {
        if !self.chat.shows_suggestions() {
            return false;
        }
        let Some(i) = self.suggestion_state.selected() else {
            return false;
        };
        if self.chat.select_suggestion(i) {
            self.cursor_end();
            true
        } else {
            false
        }
    }

    /// Map a click position to a suggestion row, if any.
    pub fn suggestion_at(&self, x: u16, y: u16) -> Option<usize> {
        let area = self.suggestions_area?;
        if !point_in_rect(x, y, area) {
            return None;
        }
        // One row per suggestion inside a bordered list
        let row = y.checked_sub(area.y + 1)? as usize;
        (row < SUGGESTIONS.len()).then_some(row)
    }

    // Message list scrolling

    fn visible_height(&self) -> u16 {
        if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        }
    }

    pub fn max_scroll(&self) -> u16 {
        self.chat_lines.saturating_sub(self.visible_height())
    }

    /// Pin the view to the newest line. Render keeps it pinned until the
    /// user scrolls up, so growth from replies or resizes stays visible.
    pub fn scroll_to_bottom(&mut self) {
        self.follow_tail = true;
        self.scroll = self.max_scroll();
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines).min(self.max_scroll());
        self.follow_tail = self.scroll >= self.max_scroll();
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
        self.follow_tail = self.scroll >= self.max_scroll();
    }

    /// Record the wrapped height measured by the last render and re-anchor.
    pub fn set_chat_lines(&mut self, lines: u16) {
        self.chat_lines = lines;
        if self.follow_tail {
            self.scroll = self.max_scroll();
        } else {
            self.scroll = self.scroll.min(self.max_scroll());
        }
    }

    pub fn scroll_half_page_down(&mut self) {
        self.scroll_down((self.visible_height() / 2).max(1));
    }

    pub fn scroll_half_page_up(&mut self) {
        self.scroll_up((self.visible_height() / 2).max(1));
    }
}

/// Check if a point is within a rectangle
pub fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}
