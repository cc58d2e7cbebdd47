//! The text-editing collaborator.
//!
//! The session never touches raw text. It asks a `TextEditor` to perform
//! edits and reads back the surrounding text and composition state. Hosts
//! implement this over their text field and conversion engine; `BufferEditor`
//! is the in-memory implementation used by the CLI and the tests.

use std::collections::BTreeMap;

use kbd_core::action::{Action, CharacterForm, CharacterTypeChange, ScanDirection};
use kbd_core::state::{EnterKeyState, KeyboardLanguage};
use kbd_core::text::SurroundingText;

/// A conversion result the user can commit, with follow-up actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub text: String,
    pub actions: Vec<Action>,
}

impl Candidate {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            actions: Vec::new(),
        }
    }
}

/// Edit the keyboard itself issued, reported back once so the matching
/// "did change" notification can be ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemOperation {
    Edit,
    MoveCursor,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComposingState {
    /// Marked text that is still being composed.
    pub text: String,
    /// Whether the composing text is currently selected as a whole.
    pub is_selected: bool,
    /// Live conversion rewrites the composing text as the user types.
    pub live_conversion: bool,
}

pub trait TextEditor {
    fn surrounding_text(&self) -> SurroundingText;

    fn input(&mut self, text: &str, simple_insert: bool);

    /// Delete `count` characters before the cursor; negative counts delete
    /// after it.
    fn delete_backward(&mut self, count: i32);

    /// Delete the composing text or the word before the cursor. Returns the
    /// deleted text.
    fn smooth_delete(&mut self) -> String;

    /// Delete up to (not including) the nearest target character.
    fn smart_delete(&mut self, direction: ScanDirection, targets: &[String]) -> String;

    fn move_cursor(&mut self, count: i32);

    fn smart_move_cursor(&mut self, direction: ScanDirection, targets: &[String]);

    /// Confirm the composition. Returns follow-up actions.
    fn enter(&mut self) -> Vec<Action>;

    /// Confirm the composition without touching the displayed text.
    fn commit_composition_silently(&mut self);

    fn change_character(&mut self, behavior: CharacterTypeChange);

    fn replace_last_characters(&mut self, table: &BTreeMap<String, String>);

    fn paste(&mut self);

    fn enter_key_state(&self) -> EnterKeyState;

    fn text_changed_count(&self) -> u64;

    fn take_previous_system_operation(&mut self) -> Option<SystemOperation>;

    fn composing_state(&self) -> ComposingState;

    fn stop_composition(&mut self);

    fn selected_candidate(&self) -> Option<Candidate> {
        None
    }

    fn complete_candidate(&mut self, candidate: &Candidate);

    fn candidate_for_forms(&self, _forms: &[CharacterForm]) -> Option<Candidate> {
        None
    }

    fn user_selected_text(&mut self, _text: &str, _length_limit: usize) {}

    fn user_deselected_text(&mut self) {}

    /// The user moved the cursor by `offset` characters. Returns actions to
    /// resynchronize the composition.
    fn user_moved_cursor(&mut self, _offset: i64) -> Vec<Action> {
        Vec::new()
    }

    fn user_cut_text(&mut self, _text: &str) {}

    fn user_jumped_cursor(&mut self) -> Vec<Action> {
        Vec::new()
    }

    /// Normalize the text left of the cursor as reported by the host.
    fn adjust_left_string(&self, left: &str) -> String {
        left.to_string()
    }

    fn reset_post_composition_predictions_if_necessary(&mut self, _text_changed_count: u64) {}

    fn set_keyboard_language(&mut self, _language: KeyboardLanguage) {}

    fn close_keyboard(&mut self) {}
}
