use crate::input::{Action, InputContext};
use crate::panel::{Panel, PanelCommand};
use crate::table::RowIdentity;
use crate::theme::Theme;

/// Work the main loop must run after a key press has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    None,
    Quit,
    /// Fetch the full object body for a table panel's detail view.
    FetchDetail { panel: usize, identity: RowIdentity },
}

pub struct App {
    pub running: bool,
    pub panels: Vec<Panel>,
    pub active: usize,
}

impl App {
    pub fn new(panels: Vec<Panel>) -> Self {
        Self {
            running: true,
            panels,
            active: 0,
        }
    }

    pub fn active_panel(&self) -> Option<&Panel> {
        self.panels.get(self.active)
    }

    /// The keymap in effect, decided by whether the focused panel is
    /// collecting a search term.
    pub fn input_context(&self) -> InputContext {
        match self.active_panel() {
            Some(panel) if panel.capturing_text() => InputContext::SearchEntry,
            _ => InputContext::View,
        }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        for panel in &mut self.panels {
            panel.resize(width, height);
        }
    }

    /// Re-wraps the focused logs panel if new lines arrived since the last
    /// frame. Called once per draw so appends coalesce.
    pub fn prepare_render(&mut self) {
        if let Some(Panel::Logs(panel)) = self.panels.get_mut(self.active) {
            panel.flush_if_dirty();
        }
    }

    pub fn apply_action(&mut self, action: Action, theme: &Theme) -> AppCommand {
        match action {
            Action::Quit => {
                self.running = false;
                return AppCommand::Quit;
            }
            Action::NextTab => {
                if !self.panels.is_empty() {
                    self.active = (self.active + 1) % self.panels.len();
                }
                return AppCommand::None;
            }
            Action::PrevTab => {
                if !self.panels.is_empty() {
                    self.active = self
                        .active
                        .checked_sub(1)
                        .unwrap_or(self.panels.len() - 1);
                }
                return AppCommand::None;
            }
            _ => {}
        }

        let active = self.active;
        match self.panels.get_mut(active) {
            Some(panel) => match panel.handle(action, theme.search_highlight) {
                PanelCommand::FetchDetail(identity) => AppCommand::FetchDetail {
                    panel: active,
                    identity,
                },
                PanelCommand::None => AppCommand::None,
            },
            None => AppCommand::None,
        }
    }

    /// Detail fetch outcome for a table panel, success and failure text
    /// alike. Ignored when the panel left detail mode in the meantime.
    pub fn complete_detail(&mut self, index: usize, content: String) {
        if let Some(Panel::Table(panel)) = self.panels.get_mut(index) {
            panel.set_detail_content(content);
        }
    }
}
