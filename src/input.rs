use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    NextTab,
    PrevTab,
    Down,
    Up,
    ToggleDetail,
    StartSearch,
    Submit,
    Cancel,
    ToggleStrict,
    Backspace,
    InputChar(char),
}

/// Which keymap is in effect: `View` for browsing panels, `SearchEntry` while
/// a logs panel is collecting a search term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputContext {
    View,
    SearchEntry,
}

pub fn map_key(context: InputContext, key: KeyEvent) -> Option<Action> {
    match context {
        InputContext::View => map_view_key(key),
        InputContext::SearchEntry => map_search_entry_key(key),
    }
}

fn map_view_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Quit),
        KeyCode::Tab => Some(Action::NextTab),
        KeyCode::Right => Some(Action::NextTab),
        KeyCode::BackTab => Some(Action::PrevTab),
        KeyCode::Left => Some(Action::PrevTab),
        KeyCode::Char('j') if key.modifiers.is_empty() => Some(Action::Down),
        KeyCode::Down => Some(Action::Down),
        KeyCode::Char('k') if key.modifiers.is_empty() => Some(Action::Up),
        KeyCode::Up => Some(Action::Up),
        KeyCode::Char('v') => Some(Action::ToggleDetail),
        KeyCode::Char('/') => Some(Action::StartSearch),
        KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::ToggleStrict)
        }
        KeyCode::Esc => Some(Action::Cancel),
        _ => None,
    }
}

fn map_search_entry_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Quit),
        KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::ToggleStrict)
        }
        KeyCode::Enter => Some(Action::Submit),
        KeyCode::Esc => Some(Action::Cancel),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            Some(Action::InputChar(c))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, InputContext, map_key};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn view_maps_quit() {
        let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(map_key(InputContext::View, key), Some(Action::Quit));
    }

    #[test]
    fn ctrl_c_quits_in_both_contexts() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(InputContext::View, key), Some(Action::Quit));
        assert_eq!(map_key(InputContext::SearchEntry, key), Some(Action::Quit));
    }

    #[test]
    fn view_maps_tab_cycling() {
        let tab = KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE);
        let back_tab = KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT);
        assert_eq!(map_key(InputContext::View, tab), Some(Action::NextTab));
        assert_eq!(map_key(InputContext::View, back_tab), Some(Action::PrevTab));
    }

    #[test]
    fn view_maps_detail_and_search_keys() {
        let view = KeyEvent::new(KeyCode::Char('v'), KeyModifiers::NONE);
        let search = KeyEvent::new(KeyCode::Char('/'), KeyModifiers::NONE);
        assert_eq!(
            map_key(InputContext::View, view),
            Some(Action::ToggleDetail)
        );
        assert_eq!(
            map_key(InputContext::View, search),
            Some(Action::StartSearch)
        );
    }

    #[test]
    fn search_entry_maps_plain_chars_to_input() {
        let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(
            map_key(InputContext::SearchEntry, key),
            Some(Action::InputChar('q'))
        );
    }

    #[test]
    fn search_entry_maps_shifted_chars_to_input() {
        let key = KeyEvent::new(KeyCode::Char('S'), KeyModifiers::SHIFT);
        assert_eq!(
            map_key(InputContext::SearchEntry, key),
            Some(Action::InputChar('S'))
        );
    }

    #[test]
    fn ctrl_s_toggles_strict_in_both_contexts() {
        let key = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
        assert_eq!(map_key(InputContext::View, key), Some(Action::ToggleStrict));
        assert_eq!(
            map_key(InputContext::SearchEntry, key),
            Some(Action::ToggleStrict)
        );
    }

    #[test]
    fn search_entry_maps_submit_and_cancel() {
        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(
            map_key(InputContext::SearchEntry, enter),
            Some(Action::Submit)
        );
        assert_eq!(map_key(InputContext::SearchEntry, esc), Some(Action::Cancel));
    }

    #[test]
    fn unmapped_keys_produce_nothing() {
        let key = KeyEvent::new(KeyCode::F(5), KeyModifiers::NONE);
        assert_eq!(map_key(InputContext::View, key), None);
        assert_eq!(map_key(InputContext::SearchEntry, key), None);
    }
}
