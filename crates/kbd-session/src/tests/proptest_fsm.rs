//! Property-based tests for the touch state machines.
//!
//! Generates random single-finger touch sequences over the headless layout
//! and checks that structural invariants hold after every step.

use std::time::Duration;

use proptest::prelude::*;

use super::simulator::HeadlessKeyboard;
use crate::editor::TextEditor;
use crate::{KeyId, PressState, Suggest};

const KEYS: [&str; 7] = ["a", "ka", "accent", "x", "shift", "enter", "delete"];

// ---------------------------------------------------------------------------
// Step enum: one thing the finger (or the clock) does
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Step {
    Down(usize),
    Move(i16, i16),
    Up,
    Wait(u16),
    Cancel,
}

// ---------------------------------------------------------------------------
// Strategy: weighted random Step generation
// ---------------------------------------------------------------------------

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        20 => (0..KEYS.len()).prop_map(Step::Down),
        25 => (-100i16..100, -100i16..100).prop_map(|(x, y)| Step::Move(x, y)),
        20 => Just(Step::Up),
        // Mostly short pauses, sometimes long enough for long-press repeats.
        20 => prop_oneof![
            4 => 1u16..150,
            1 => 150u16..800,
        ]
        .prop_map(Step::Wait),
        3 => Just(Step::Cancel),
    ]
}

// ---------------------------------------------------------------------------
// Harness: tracks the one finger on the keyboard
// ---------------------------------------------------------------------------

struct Finger {
    key: &'static str,
    x: f64,
    y: f64,
}

fn execute_step(kb: &mut HeadlessKeyboard, finger: &mut Option<Finger>, step: &Step) {
    match step {
        Step::Down(index) => {
            if finger.is_none() {
                let key = KEYS[*index];
                kb.down(key);
                *finger = Some(Finger { key, x: 0.0, y: 0.0 });
            }
        }
        Step::Move(x, y) => {
            if let Some(f) = finger.as_mut() {
                f.x = f64::from(*x);
                f.y = f64::from(*y);
                kb.move_to(f.key, f.x, f.y);
            }
        }
        Step::Up => {
            if let Some(f) = finger.take() {
                kb.up_at(f.key, f.x, f.y);
            }
        }
        Step::Wait(ms) => kb.wait(u64::from(*ms)),
        Step::Cancel => {
            if let Some(f) = finger.take() {
                kb.session.touch_cancel(&KeyId::from(f.key));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Invariant checks: run after every step
// ---------------------------------------------------------------------------

fn assert_invariants(kb: &HeadlessKeyboard, finger: &Option<Finger>, step: &Step) {
    let session = &kb.session;

    // 1. The mirrored surrounding text matches the field.
    assert_eq!(
        session.state().surrounding_text.whole(),
        session.editor().text(),
        "surrounding text out of sync after {:?}",
        step,
    );
    assert_eq!(
        session.state().text_changed_count,
        session.editor().text_changed_count(),
        "text change count out of sync after {:?}",
        step,
    );

    match finger {
        None => {
            // 2. Lifting or cancelling the finger stops every long-press.
            assert_eq!(
                session.dispatcher().pending_longpress_timers(),
                0,
                "long-press timer left without a touch after {:?}",
                step,
            );
            // 3. Only the suggestion dismissal may still be pending.
            if let Some(deadline) = session.next_deadline() {
                assert!(
                    deadline <= session.now() + Duration::from_millis(70),
                    "timer at {}ms left without a touch (now {}ms) after {:?}",
                    deadline.as_millis(),
                    session.now().as_millis(),
                    step,
                );
            }
            for key in KEYS {
                assert!(
                    !session.is_pressed(&KeyId::from(key)),
                    "{} still pressed after {:?}",
                    key,
                    step,
                );
            }
        }
        Some(f) => {
            let id = KeyId::from(f.key);
            let state = session.press_state(&id);
            let suggest = session.suggest(&id);

            // 4. A single flick bubble always names the direction being held.
            if let Some(Suggest::FlickOne(direction)) = suggest {
                assert!(
                    matches!(
                        state,
                        Some(PressState::FlickOneSuggested(d, _)) | Some(PressState::LongFlicked(d))
                            if d == direction
                    ),
                    "suggest {:?} with state {:?} after {:?}",
                    suggest,
                    state,
                    step,
                );
            }

            // 5. The linear picker shows the current selection.
            if let Some(PressState::LinearVariations(selection)) = state {
                assert_eq!(
                    suggest,
                    Some(Suggest::Linear(selection)),
                    "picker out of sync after {:?}",
                    step,
                );
            }

            // 6. Other keys are idle.
            for key in KEYS.iter().filter(|key| **key != f.key) {
                assert!(
                    !session.is_pressed(&KeyId::from(*key)),
                    "{} pressed while the finger is on {} after {:?}",
                    key,
                    f.key,
                    step,
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// proptest entry point
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn touch_invariants_hold(steps in prop::collection::vec(arb_step(), 1..120)) {
        let mut kb = HeadlessKeyboard::new();
        let mut finger = None;
        for step in &steps {
            execute_step(&mut kb, &mut finger, step);
            assert_invariants(&kb, &finger, step);
        }
    }

    #[test]
    fn close_keyboard_always_quiesces(steps in prop::collection::vec(arb_step(), 1..60)) {
        let mut kb = HeadlessKeyboard::new();
        let mut finger = None;
        for step in &steps {
            execute_step(&mut kb, &mut finger, step);
        }
        kb.session.close_keyboard();
        prop_assert_eq!(kb.session.next_deadline(), None);
        for key in KEYS {
            prop_assert!(!kb.session.is_pressed(&KeyId::from(key)));
        }
        let text = kb.text();
        kb.wait(2000);
        prop_assert_eq!(kb.text(), text);
    }
}
