use crate::internal::ui::app::{Action, Page};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

/// Where a key binding applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyBindingContext {
    Global,
    Page(Page),
}

/// Maps key events to actions, per page with a global fallback.
#[derive(Debug, Clone, Default)]
pub struct KeyBindingMap {
    bindings: HashMap<KeyBindingContext, HashMap<KeyEvent, Action>>,
}

impl KeyBindingMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, context: KeyBindingContext, key: KeyEvent, action: Action) {
        self.bindings.entry(context).or_default().insert(key, action);
    }

    /// Page bindings first, then global ones.
    pub fn get_action(&self, key: &KeyEvent, page: Page) -> Option<Action> {
        let key = normalize(key);
        [KeyBindingContext::Page(page), KeyBindingContext::Global]
            .iter()
            .find_map(|ctx| self.bindings.get(ctx).and_then(|m| m.get(&key)))
            .cloned()
    }
}

/// Terminals report Shift inconsistently for upper-case chars and BackTab;
/// only Control and Alt are significant for lookups.
fn normalize(key: &KeyEvent) -> KeyEvent {
    KeyEvent::new(
        key.code,
        key.modifiers & (KeyModifiers::CONTROL | KeyModifiers::ALT),
    )
}

fn plain(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

pub fn create_default_keybindings() -> KeyBindingMap {
    use KeyBindingContext::{Global, Page as On};

    let mut map = KeyBindingMap::new();

    map.bind(Global, plain(KeyCode::Char('q')), Action::Quit);
    map.bind(
        Global,
        KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        Action::Quit,
    );
    map.bind(Global, plain(KeyCode::Tab), Action::NextPage);
    map.bind(Global, plain(KeyCode::BackTab), Action::PrevPage);
    map.bind(Global, plain(KeyCode::Char('?')), Action::ToggleHelp);
    for (i, page) in Page::ALL.iter().enumerate() {
        let digit = char::from_digit(i as u32 + 1, 10).unwrap_or('0');
        map.bind(Global, plain(KeyCode::Char(digit)), Action::ShowPage(*page));
    }
    for (code, action) in [
        (KeyCode::Char('j'), Action::NavigateDown),
        (KeyCode::Down, Action::NavigateDown),
        (KeyCode::Char('k'), Action::NavigateUp),
        (KeyCode::Up, Action::NavigateUp),
        (KeyCode::Char('w'), Action::OpenReference),
        (KeyCode::Char('i'), Action::OpenImage),
    ] {
        map.bind(Global, plain(code), action);
    }

    // Home: upload and analyze
    map.bind(On(Page::Home), plain(KeyCode::Char('o')), Action::BrowseImage);
    map.bind(On(Page::Home), plain(KeyCode::Char('x')), Action::ClearImage);
    map.bind(On(Page::Home), plain(KeyCode::Char('a')), Action::Analyze);
    map.bind(On(Page::Home), plain(KeyCode::Enter), Action::Analyze);
    map.bind(On(Page::Home), plain(KeyCode::Char('p')), Action::ToggleAudio);

    // Explore
    map.bind(On(Page::Explore), plain(KeyCode::Char('r')), Action::Refresh);
    map.bind(On(Page::Explore), plain(KeyCode::Char('p')), Action::ToggleAudio);
    map.bind(On(Page::Explore), plain(KeyCode::Enter), Action::ToggleAudio);

    // History
    map.bind(On(Page::History), plain(KeyCode::Char('r')), Action::Refresh);
    map.bind(On(Page::History), plain(KeyCode::Char('d')), Action::DeleteSelected);
    map.bind(On(Page::History), plain(KeyCode::Delete), Action::DeleteSelected);

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_binding_overrides_global() {
        let map = create_default_keybindings();
        let enter = plain(KeyCode::Enter);
        assert_eq!(map.get_action(&enter, Page::Home), Some(Action::Analyze));
        assert_eq!(
            map.get_action(&enter, Page::Explore),
            Some(Action::ToggleAudio)
        );
        assert_eq!(map.get_action(&enter, Page::About), None);
    }

    #[test]
    fn digits_switch_pages() {
        let map = create_default_keybindings();
        assert_eq!(
            map.get_action(&plain(KeyCode::Char('3')), Page::Home),
            Some(Action::ShowPage(Page::History))
        );
    }

    #[test]
    fn delete_only_on_history() {
        let map = create_default_keybindings();
        let d = plain(KeyCode::Char('d'));
        assert_eq!(
            map.get_action(&d, Page::History),
            Some(Action::DeleteSelected)
        );
        assert_eq!(map.get_action(&d, Page::Explore), None);
    }

    #[test]
    fn shift_modifier_is_ignored() {
        let map = create_default_keybindings();
        let backtab = KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT);
        assert_eq!(map.get_action(&backtab, Page::About), Some(Action::PrevPage));

        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map.get_action(&ctrl_c, Page::Home), Some(Action::Quit));
    }
}
