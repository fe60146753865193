use crate::config::LogsDef;
use crate::panel::lock;
use crate::search;
use ratatui::style::Style;
use ratatui::text::Text;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogsMode {
    Streaming,
    Searching,
    Searched,
}

/// Append-only log buffer shared between the stream-reader task and the UI.
/// Content grows without bound for the panel's lifetime; truncation would
/// change search results.
#[derive(Debug, Default)]
pub struct LogBuffer {
    pub content: String,
    /// Set on append, cleared when the streaming view re-wraps. Lets bursts
    /// of lines coalesce into a single re-wrap on the next render tick.
    pub dirty: bool,
    pub last_error: Option<String>,
}

/// Stream-side mutation handle for one logs panel.
#[derive(Clone)]
pub struct LogsWriter {
    state: Arc<Mutex<LogBuffer>>,
}

impl LogsWriter {
    pub fn add_content(&self, line: &str) {
        let mut state = lock(&self.state);
        state.content = format!("{}\n{line}", state.content);
        state.dirty = true;
    }

    pub fn set_error(&self, message: String) {
        lock(&self.state).last_error = Some(message);
    }
}

/// Logs panel: a streaming viewport with a search overlay.
///
/// Mode machine: `Streaming` -> (`/`) -> `Searching` -> (enter) -> `Searched`;
/// esc returns to `Streaming` from either search state. The strict toggle
/// flips in any mode and re-runs the search while results are showing.
pub struct LogsPanel {
    def: LogsDef,
    state: Arc<Mutex<LogBuffer>>,
    pub mode: LogsMode,
    pub term: String,
    pub strict: bool,
    wrapped: String,
    results: Text<'static>,
    highlight: Style,
    pub scroll: u16,
    pub width: u16,
    pub height: u16,
}

impl LogsPanel {
    pub fn new(def: LogsDef) -> Self {
        Self {
            def,
            state: Arc::new(Mutex::new(LogBuffer::default())),
            mode: LogsMode::Streaming,
            term: String::new(),
            strict: false,
            wrapped: String::new(),
            results: Text::default(),
            highlight: Style::default(),
            scroll: 0,
            width: 0,
            height: 0,
        }
    }

    pub fn writer(&self) -> LogsWriter {
        LogsWriter {
            state: Arc::clone(&self.state),
        }
    }

    pub fn def(&self) -> &LogsDef {
        &self.def
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        // the surrounding border takes one column on each side
        self.width = width.saturating_sub(2);
        self.height = height / 2;
        // existing content has to be re-wrapped at the new width
        lock(&self.state).dirty = true;
        if self.mode == LogsMode::Searched {
            self.run_search(self.highlight);
        }
    }

    /// Re-wraps dirty streaming content to the current width. Called once per
    /// render tick, so appends arriving between ticks coalesce.
    pub fn flush_if_dirty(&mut self) {
        if self.mode != LogsMode::Streaming {
            return;
        }
        let mut state = lock(&self.state);
        if state.dirty {
            self.wrapped = search::wrap_text(&state.content, self.width);
            state.dirty = false;
        }
    }

    pub fn start_search(&mut self) {
        self.mode = LogsMode::Searching;
        self.term.clear();
    }

    pub fn push_term_char(&mut self, ch: char) {
        if self.mode == LogsMode::Searching {
            self.term.push(ch);
        }
    }

    pub fn pop_term_char(&mut self) {
        if self.mode == LogsMode::Searching {
            self.term.pop();
        }
    }

    pub fn submit_search(&mut self, highlight: Style) {
        if self.mode != LogsMode::Searching {
            return;
        }
        self.mode = LogsMode::Searched;
        self.run_search(highlight);
    }

    pub fn cancel_search(&mut self) {
        self.mode = LogsMode::Streaming;
        let mut state = lock(&self.state);
        self.wrapped = search::wrap_text(&state.content, self.width);
        state.dirty = false;
        self.scroll = 0;
    }

    pub fn toggle_strict(&mut self, highlight: Style) {
        self.strict = !self.strict;
        if self.mode == LogsMode::Searched {
            self.run_search(highlight);
        }
    }

    fn run_search(&mut self, highlight: Style) {
        self.highlight = highlight;
        // search works on a snapshot of the buffer taken under the lock
        let content = lock(&self.state).content.clone();
        self.results = search::search(&content, &self.term, self.strict, self.width, highlight);
        self.scroll = 0;
    }

    pub fn scroll_by(&mut self, delta: i32) {
        let lines = match self.mode {
            LogsMode::Searched => self.results.lines.len(),
            _ => self.wrapped.lines().count(),
        } as u16;
        let max = lines.saturating_sub(self.height.max(1));
        self.scroll = self.scroll.saturating_add_signed(delta as i16).min(max);
    }

    pub fn streaming_text(&self) -> &str {
        &self.wrapped
    }

    pub fn search_results(&self) -> &Text<'static> {
        &self.results
    }

    pub fn last_error(&self) -> Option<String> {
        lock(&self.state).last_error.clone()
    }

    #[cfg(test)]
    pub fn is_dirty(&self) -> bool {
        lock(&self.state).dirty
    }

    #[cfg(test)]
    pub fn raw_content(&self) -> String {
        lock(&self.state).content.clone()
    }
}
