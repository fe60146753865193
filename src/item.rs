use crate::config::ItemDef;
use crate::panel::lock;
use std::sync::{Arc, Mutex};

/// Shared content mirror for a single tracked resource.
#[derive(Debug, Default)]
pub struct ItemState {
    pub content: String,
    pub last_error: Option<String>,
}

/// Router-side mutation handle for one item panel.
#[derive(Clone)]
pub struct ItemWriter {
    state: Arc<Mutex<ItemState>>,
}

impl ItemWriter {
    /// Last-write-wins replacement; clears any error previously shown.
    pub fn set_content(&self, content: String) {
        let mut state = lock(&self.state);
        state.content = content;
        state.last_error = None;
    }

    /// Replaces the displayed content with error text until superseded by a
    /// new `set_content` or `set_error`.
    pub fn set_error(&self, message: String) {
        lock(&self.state).last_error = Some(message);
    }
}

/// Item panel: always shows its one tracked resource, no mode duality.
pub struct ItemPanel {
    def: ItemDef,
    state: Arc<Mutex<ItemState>>,
    pub scroll: u16,
    pub height: u16,
}

impl ItemPanel {
    pub fn new(def: ItemDef) -> Self {
        Self {
            def,
            state: Arc::new(Mutex::new(ItemState::default())),
            scroll: 0,
            height: 0,
        }
    }

    pub fn writer(&self) -> ItemWriter {
        ItemWriter {
            state: Arc::clone(&self.state),
        }
    }

    pub fn def(&self) -> &ItemDef {
        &self.def
    }

    pub fn resize(&mut self, _width: u16, height: u16) {
        self.height = height / 2;
    }

    pub fn scroll_by(&mut self, delta: i32) {
        let lines = lock(&self.state).content.lines().count() as u16;
        let max = lines.saturating_sub(self.height.max(1));
        self.scroll = self.scroll.saturating_add_signed(delta as i16).min(max);
    }

    pub fn has_error(&self) -> bool {
        lock(&self.state).last_error.is_some()
    }

    /// Text for the next render: error text takes the place of content until
    /// a newer `set_content` lands.
    pub fn display_text(&self) -> String {
        let state = lock(&self.state);
        match &state.last_error {
            Some(error) => error.clone(),
            None => state.content.clone(),
        }
    }
}
