//! Shared, UI-visible keyboard state.
//!
//! One `KeyboardState` lives for the whole session. The dispatcher owns and
//! mutates it; key models and press lifecycles only read it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::action::{Action, CandidateSelection};
use crate::text::SurroundingText;

pub const IS_SHIFTED: &str = "is_shifted";
pub const IS_CAPS_LOCKED: &str = "is_caps_locked";

/// Named boolean flags. `is_shifted` and `is_caps_locked` always exist;
/// layouts may add their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoolStates {
    values: BTreeMap<String, bool>,
}

impl Default for BoolStates {
    fn default() -> Self {
        let mut values = BTreeMap::new();
        values.insert(IS_SHIFTED.to_string(), false);
        values.insert(IS_CAPS_LOCKED.to_string(), false);
        Self { values }
    }
}

impl BoolStates {
    pub fn get(&self, key: &str) -> Option<bool> {
        self.values.get(key).copied()
    }

    pub fn set(&mut self, key: &str, value: bool) {
        self.values.insert(key.to_string(), value);
    }

    /// Toggle an existing flag. Unknown flags stay unknown.
    pub fn toggle(&mut self, key: &str) {
        if let Some(v) = self.values.get_mut(key) {
            *v = !*v;
        }
    }

    pub fn is_shifted(&self) -> bool {
        self.get(IS_SHIFTED).unwrap_or(false)
    }

    pub fn is_caps_locked(&self) -> bool {
        self.get(IS_CAPS_LOCKED).unwrap_or(false)
    }

    /// Evaluate `flag` or `!flag`. `None` for an unknown flag.
    pub fn evaluate(&self, expression: &str) -> Option<bool> {
        let expression = expression.trim();
        match expression.strip_prefix('!') {
            Some(rest) => self.get(rest.trim()).map(|v| !v),
            None => self.get(expression),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnKeyType {
    #[default]
    Default,
    Go,
    Google,
    Join,
    Next,
    Route,
    Search,
    Send,
    Yahoo,
    Done,
    EmergencyCall,
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyboardType {
    #[default]
    Default,
    Twitter,
    WebSearch,
    DecimalPad,
    Url,
    AsciiCapable,
    AsciiCapableNumberPad,
    EmailAddress,
    PhonePad,
    NamePhonePad,
    Alphabet,
    NumbersAndPunctuation,
    NumberPad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnterKeyState {
    /// A composition or candidate is waiting to be confirmed.
    Complete,
    Return(ReturnKeyType),
}

impl Default for EnterKeyState {
    fn default() -> Self {
        Self::Return(ReturnKeyType::Default)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarState {
    #[default]
    None,
    Cursor,
    Tab,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyboardLanguage {
    #[default]
    JaJp,
    EnUs,
    ElGr,
    None,
}

impl KeyboardLanguage {
    /// Languages whose input is upper-cased while shift or caps lock is on.
    pub fn uppercases_on_shift(self) -> bool {
        matches!(self, Self::EnUs | Self::ElGr)
    }
}

/// An action that reverts the last destructive edit, valid while the text
/// change count still matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoAction {
    pub action: Action,
    pub text_changed_count: u64,
}

#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    pub bool_states: BoolStates,
    pub enter_key_state: EnterKeyState,
    pub bar_state: BarState,
    pub surrounding_text: SurroundingText,
    pub text_changed_count: u64,
    pub undo_action: Option<UndoAction>,
    pub keyboard_type: KeyboardType,
    pub return_key_type: ReturnKeyType,
    pub keyboard_language: KeyboardLanguage,
    pub current_tab: Option<String>,
    pub resizing: bool,
    pub candidate_selection_request: Option<CandidateSelection>,
    pub has_full_access: bool,
}

impl KeyboardState {
    pub fn set_surrounding_text(&mut self, text: SurroundingText) {
        self.surrounding_text = text;
    }

    pub fn set_tab(&mut self, tab: &str) {
        self.current_tab = Some(tab.to_string());
    }

    /// Maximum length of a user selection that is handed to the converter
    /// for re-conversion. Numeric, address and emergency fields never
    /// re-convert; search fields only re-convert short words.
    pub fn selection_length_limit(&self) -> usize {
        let limits = &crate::settings::settings().selection;
        match self.keyboard_type {
            KeyboardType::Default | KeyboardType::Twitter => match self.return_key_type {
                ReturnKeyType::EmergencyCall => 0,
                ReturnKeyType::Search
                | ReturnKeyType::Google
                | ReturnKeyType::Yahoo
                | ReturnKeyType::Route => limits.search_limit,
                _ => limits.default_limit,
            },
            KeyboardType::WebSearch => limits.search_limit,
            KeyboardType::DecimalPad
            | KeyboardType::Url
            | KeyboardType::AsciiCapable
            | KeyboardType::AsciiCapableNumberPad
            | KeyboardType::EmailAddress
            | KeyboardType::PhonePad
            | KeyboardType::NamePhonePad
            | KeyboardType::Alphabet
            | KeyboardType::NumbersAndPunctuation
            | KeyboardType::NumberPad => 0,
        }
    }
}
