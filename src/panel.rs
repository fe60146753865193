use crate::input::Action;
use crate::item::ItemPanel;
use crate::logs::{LogsMode, LogsPanel};
use crate::table::{RowIdentity, TableMode, TablePanel};
use ratatui::style::Style;
use std::sync::{Mutex, MutexGuard};

/// Locks a shared panel state, recovering from poisoning. A writer task that
/// panicked mid-update leaves at worst a stale row or log line behind, which
/// the next event overwrites, so the guard is always usable.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Follow-up work a panel asks the main loop to run after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelCommand {
    None,
    /// Fetch the full object body for the row captured at toggle time.
    FetchDetail(RowIdentity),
}

/// The three panel shapes a dashboard can declare. Closed on purpose: every
/// consumer matches exhaustively, so a panel kind the renderer or input layer
/// does not handle cannot slip through.
pub enum Panel {
    Table(TablePanel),
    Item(ItemPanel),
    Logs(LogsPanel),
}

impl Panel {
    pub fn name(&self) -> &str {
        match self {
            Panel::Table(panel) => &panel.def().name,
            Panel::Item(panel) => &panel.def().name,
            Panel::Logs(panel) => &panel.def().name,
        }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        match self {
            Panel::Table(panel) => panel.resize(width, height),
            Panel::Item(panel) => panel.resize(width, height),
            Panel::Logs(panel) => panel.resize(width, height),
        }
    }

    /// True while the panel is consuming keystrokes as search-term input.
    pub fn capturing_text(&self) -> bool {
        matches!(self, Panel::Logs(panel) if panel.mode == LogsMode::Searching)
    }

    pub fn handle(&mut self, action: Action, search_highlight: Style) -> PanelCommand {
        match self {
            Panel::Table(panel) => Self::handle_table(panel, action),
            Panel::Item(panel) => {
                match action {
                    Action::Up => panel.scroll_by(-1),
                    Action::Down => panel.scroll_by(1),
                    _ => {}
                }
                PanelCommand::None
            }
            Panel::Logs(panel) => {
                Self::handle_logs(panel, action, search_highlight);
                PanelCommand::None
            }
        }
    }

    fn handle_table(panel: &mut TablePanel, action: Action) -> PanelCommand {
        match (panel.mode, action) {
            (TableMode::Table, Action::Up) => panel.move_cursor(-1),
            (TableMode::Table, Action::Down) => panel.move_cursor(1),
            (TableMode::Table, Action::ToggleDetail) => {
                if let Some(identity) = panel.begin_detail() {
                    return PanelCommand::FetchDetail(identity);
                }
            }
            (TableMode::Detail, Action::Up) => panel.scroll_detail(-1),
            (TableMode::Detail, Action::Down) => panel.scroll_detail(1),
            (TableMode::Detail, Action::ToggleDetail | Action::Cancel) => panel.exit_detail(),
            _ => {}
        }
        PanelCommand::None
    }

    fn handle_logs(panel: &mut LogsPanel, action: Action, highlight: Style) {
        match panel.mode {
            LogsMode::Streaming => match action {
                Action::Up => panel.scroll_by(-1),
                Action::Down => panel.scroll_by(1),
                Action::StartSearch => panel.start_search(),
                Action::ToggleStrict => panel.toggle_strict(highlight),
                _ => {}
            },
            LogsMode::Searching => match action {
                Action::InputChar(ch) => panel.push_term_char(ch),
                Action::Backspace => panel.pop_term_char(),
                Action::Submit => panel.submit_search(highlight),
                Action::Cancel => panel.cancel_search(),
                Action::ToggleStrict => panel.toggle_strict(highlight),
                _ => {}
            },
            LogsMode::Searched => match action {
                Action::Up => panel.scroll_by(-1),
                Action::Down => panel.scroll_by(1),
                Action::StartSearch => panel.start_search(),
                Action::Cancel => panel.cancel_search(),
                Action::ToggleStrict => panel.toggle_strict(highlight),
                _ => {}
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Panel, PanelCommand, lock};
    use crate::config::{ColumnDef, ObjectKey, TableDef};
    use crate::input::Action;
    use crate::logs::LogsMode;
    use crate::table::{TableMode, TablePanel};
    use ratatui::style::Style;
    use std::sync::Mutex;

    fn table_panel() -> Panel {
        Panel::Table(TablePanel::new(TableDef {
            name: "pods".to_string(),
            group: String::new(),
            version: "v1".to_string(),
            kind: "Pod".to_string(),
            namespace: "default".to_string(),
            label_selector: Default::default(),
            columns: vec![ColumnDef {
                header: "Name".to_string(),
                width: 20,
                path: "metadata.name".to_string(),
            }],
            page_size: 0,
        }))
    }

    fn logs_panel() -> Panel {
        Panel::Logs(crate::logs::LogsPanel::new(crate::config::LogsDef {
            name: "logs".to_string(),
            group: String::new(),
            version: "v1".to_string(),
            kind: "Pod".to_string(),
            key: ObjectKey {
                namespace: "default".to_string(),
                name: "pod-0".to_string(),
            },
            container: None,
        }))
    }

    #[test]
    fn lock_recovers_from_poisoning() {
        let shared = Mutex::new(1_u32);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = shared.lock().unwrap();
            panic!("poison it");
        }));
        assert!(result.is_err());
        assert_eq!(*lock(&shared), 1);
    }

    #[test]
    fn detail_toggle_emits_fetch_command() {
        let mut panel = table_panel();
        if let Panel::Table(table) = &panel {
            table.writer().add_or_update(
                &serde_json::from_value(serde_json::json!({
                    "apiVersion": "v1",
                    "kind": "Pod",
                    "metadata": {"namespace": "default", "name": "a", "uid": "uid-a"}
                }))
                .unwrap(),
            );
        }
        let command = panel.handle(Action::ToggleDetail, Style::default());
        match command {
            PanelCommand::FetchDetail(identity) => assert_eq!(identity.name, "a"),
            other => panic!("expected fetch command, got {other:?}"),
        }
        if let Panel::Table(table) = &panel {
            assert_eq!(table.mode, TableMode::Detail);
        }
    }

    #[test]
    fn search_keystrokes_reach_the_logs_panel() {
        let mut panel = logs_panel();
        panel.handle(Action::StartSearch, Style::default());
        assert!(panel.capturing_text());
        panel.handle(Action::InputChar('a'), Style::default());
        panel.handle(Action::InputChar('b'), Style::default());
        panel.handle(Action::Backspace, Style::default());
        panel.handle(Action::Submit, Style::default());
        if let Panel::Logs(logs) = &panel {
            assert_eq!(logs.term, "a");
            assert_eq!(logs.mode, LogsMode::Searched);
        }
        assert!(!panel.capturing_text());
    }
}
