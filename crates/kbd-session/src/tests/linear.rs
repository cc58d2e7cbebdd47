use super::simulator::HeadlessKeyboard;
use crate::{PressState, Suggest};
use kbd_core::state::EnterKeyState;

#[test]
fn test_quick_tap_types_base() {
    let mut kb = HeadlessKeyboard::new();
    kb.tap("accent");
    assert_eq!(kb.text(), "a");
    kb.assert_quiescent();
}

#[test]
fn test_hold_opens_picker_and_selects() {
    let mut kb = HeadlessKeyboard::new();
    kb.down("accent");
    kb.wait(450);
    assert_eq!(kb.press_state("accent"), Some(PressState::LinearVariations(None)));
    assert_eq!(kb.suggest("accent"), Some(Suggest::Linear(None)));

    kb.move_to("accent", 40.0, 0.0);
    assert_eq!(kb.press_state("accent"), Some(PressState::LinearVariations(Some(2))));
    assert_eq!(kb.suggest("accent"), Some(Suggest::Linear(Some(2))));
    kb.wait(30);
    kb.up_at("accent", 40.0, 0.0);
    assert_eq!(kb.text(), "á");
    assert_eq!(kb.suggest("accent"), None);
    kb.assert_quiescent();
}

#[test]
fn test_picker_selection_follows_drag() {
    let mut kb = HeadlessKeyboard::new();
    kb.down("accent");
    kb.wait(450);
    kb.move_to("accent", 40.0, 0.0);
    kb.move_to("accent", -40.0, 0.0);
    assert_eq!(kb.press_state("accent"), Some(PressState::LinearVariations(Some(0))));
    kb.move_to("accent", 1.0, 0.0);
    kb.up_at("accent", 1.0, 0.0);
    assert_eq!(kb.text(), "à");
}

#[test]
fn test_picker_release_without_selection_types_base() {
    let mut kb = HeadlessKeyboard::new();
    kb.hold("accent", 500);
    assert_eq!(kb.text(), "a");
    kb.assert_quiescent();
}

#[test]
fn test_variations_outrank_key_longpress() {
    // The key also has a long-press ("A"); it is never reserved.
    let mut kb = HeadlessKeyboard::new();
    kb.down("accent");
    kb.wait(1000);
    assert_eq!(kb.session.dispatcher().pending_longpress_timers(), 0);
    kb.up("accent");
    assert!(!kb.text().contains('A'));
}

#[test]
fn test_key_without_capabilities_taps_after_long_hold() {
    let mut kb = HeadlessKeyboard::new();
    kb.hold("x", 1000);
    assert_eq!(kb.text(), "x");

    let mut kb = HeadlessKeyboard::new();
    kb.hold("enter", 1000);
    assert_eq!(kb.text(), "\n");
    assert_eq!(
        kb.session.state().enter_key_state,
        EnterKeyState::Return(Default::default())
    );
}

#[test]
fn test_plain_key_ignores_drags() {
    let mut kb = HeadlessKeyboard::new();
    kb.down("x");
    kb.wait(30);
    kb.move_to("x", 100.0, 100.0);
    kb.up_at("x", 100.0, 100.0);
    assert_eq!(kb.text(), "x");
}
