use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    DismissError,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    QuickSelect(usize),
    Refresh,
    Start,
    Stop,
    Reset,
    Delete,
    ViewLog,
    ViewInitLog,
    OpenDeploy,
    OpenMailhog,
    CloseOverlay,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    ScrollToTop,
    ScrollToBottom,
    None,
}

/// Captures the UI state needed to interpret a key press.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputContext {
    pub has_error: bool,
    pub has_overlay: bool,
}

pub fn map_key(key: KeyEvent, ctx: InputContext) -> Action {
    if key.kind != KeyEventKind::Press {
        return Action::None;
    }

    // Ctrl+C always quits
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    // A log viewer owns the keyboard while open
    if ctx.has_overlay {
        return match key.code {
            KeyCode::Char('j') | KeyCode::Down => Action::ScrollDown,
            KeyCode::Char('k') | KeyCode::Up => Action::ScrollUp,
            KeyCode::PageDown => Action::PageDown,
            KeyCode::PageUp => Action::PageUp,
            KeyCode::Char('g') => Action::ScrollToTop,
            KeyCode::Char('G') => Action::ScrollToBottom,
            KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter => Action::CloseOverlay,
            _ => Action::None,
        };
    }

    match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Esc => {
            if ctx.has_error {
                Action::DismissError
            } else {
                Action::Quit
            }
        }
        KeyCode::Left | KeyCode::Char('h') => Action::MoveLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::MoveRight,
        KeyCode::Up | KeyCode::Char('k') => Action::MoveUp,
        KeyCode::Down | KeyCode::Char('j') => Action::MoveDown,
        KeyCode::Char('f') => Action::Refresh,
        KeyCode::Char('s') => Action::Start,
        KeyCode::Char('x') => Action::Stop,
        KeyCode::Char('r') => Action::Reset,
        KeyCode::Char('d') => Action::Delete,
        KeyCode::Enter => Action::ViewLog,
        KeyCode::Char('i') => Action::ViewInitLog,
        KeyCode::Char('o') => Action::OpenDeploy,
        KeyCode::Char('m') => Action::OpenMailhog,
        KeyCode::Char(c) if c.is_ascii_digit() && c != '0' => {
            Action::QuickSelect((c as u8 - b'0') as usize)
        }
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn press_with(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn release(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        }
    }

    fn ctx() -> InputContext {
        InputContext::default()
    }

    fn ctx_overlay() -> InputContext {
        InputContext {
            has_overlay: true,
            ..Default::default()
        }
    }

    #[test]
    fn quit_on_q() {
        assert_eq!(map_key(press(KeyCode::Char('q')), ctx()), Action::Quit);
    }

    #[test]
    fn esc_quits_without_error() {
        assert_eq!(map_key(press(KeyCode::Esc), ctx()), Action::Quit);
    }

    #[test]
    fn esc_dismisses_error_first() {
        let ctx = InputContext {
            has_error: true,
            ..Default::default()
        };
        assert_eq!(map_key(press(KeyCode::Esc), ctx), Action::DismissError);
    }

    #[test]
    fn ctrl_c_quits_everywhere() {
        for ctx in [ctx(), ctx_overlay()] {
            assert_eq!(
                map_key(press_with(KeyCode::Char('c'), KeyModifiers::CONTROL), ctx),
                Action::Quit
            );
        }
    }

    #[test]
    fn grid_navigation_keys() {
        assert_eq!(map_key(press(KeyCode::Left), ctx()), Action::MoveLeft);
        assert_eq!(map_key(press(KeyCode::Char('h')), ctx()), Action::MoveLeft);
        assert_eq!(map_key(press(KeyCode::Right), ctx()), Action::MoveRight);
        assert_eq!(map_key(press(KeyCode::Char('l')), ctx()), Action::MoveRight);
        assert_eq!(map_key(press(KeyCode::Up), ctx()), Action::MoveUp);
        assert_eq!(map_key(press(KeyCode::Down), ctx()), Action::MoveDown);
    }

    #[test]
    fn lifecycle_action_keys() {
        assert_eq!(map_key(press(KeyCode::Char('s')), ctx()), Action::Start);
        assert_eq!(map_key(press(KeyCode::Char('x')), ctx()), Action::Stop);
        assert_eq!(map_key(press(KeyCode::Char('r')), ctx()), Action::Reset);
        assert_eq!(map_key(press(KeyCode::Char('d')), ctx()), Action::Delete);
    }

    #[test]
    fn log_viewer_keys() {
        assert_eq!(map_key(press(KeyCode::Enter), ctx()), Action::ViewLog);
        assert_eq!(map_key(press(KeyCode::Char('i')), ctx()), Action::ViewInitLog);
    }

    #[test]
    fn browser_link_keys() {
        assert_eq!(map_key(press(KeyCode::Char('o')), ctx()), Action::OpenDeploy);
        assert_eq!(map_key(press(KeyCode::Char('m')), ctx()), Action::OpenMailhog);
    }

    #[test]
    fn refresh_f() {
        assert_eq!(map_key(press(KeyCode::Char('f')), ctx()), Action::Refresh);
    }

    #[test]
    fn quick_select_digits() {
        for d in 1..=9u8 {
            let c = (b'0' + d) as char;
            assert_eq!(
                map_key(press(KeyCode::Char(c)), ctx()),
                Action::QuickSelect(d as usize)
            );
        }
        assert_eq!(map_key(press(KeyCode::Char('0')), ctx()), Action::None);
    }

    #[test]
    fn unbound_key_is_none() {
        assert_eq!(map_key(press(KeyCode::Char('z')), ctx()), Action::None);
    }

    #[test]
    fn non_press_event_filtered() {
        assert_eq!(map_key(release(KeyCode::Char('q')), ctx()), Action::None);
    }

    // --- Overlay mode ---

    #[test]
    fn overlay_scrolling() {
        assert_eq!(map_key(press(KeyCode::Char('j')), ctx_overlay()), Action::ScrollDown);
        assert_eq!(map_key(press(KeyCode::Char('k')), ctx_overlay()), Action::ScrollUp);
        assert_eq!(map_key(press(KeyCode::PageDown), ctx_overlay()), Action::PageDown);
        assert_eq!(map_key(press(KeyCode::PageUp), ctx_overlay()), Action::PageUp);
        assert_eq!(map_key(press(KeyCode::Char('g')), ctx_overlay()), Action::ScrollToTop);
        assert_eq!(map_key(press(KeyCode::Char('G')), ctx_overlay()), Action::ScrollToBottom);
    }

    #[test]
    fn overlay_close_keys() {
        for code in [KeyCode::Char('q'), KeyCode::Esc, KeyCode::Enter] {
            assert_eq!(map_key(press(code), ctx_overlay()), Action::CloseOverlay);
        }
    }

    #[test]
    fn overlay_swallows_card_actions() {
        for code in [KeyCode::Char('s'), KeyCode::Char('x'), KeyCode::Char('r'), KeyCode::Char('d')] {
            assert_eq!(map_key(press(code), ctx_overlay()), Action::None);
        }
    }
}
