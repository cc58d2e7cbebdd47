//! Editing actions produced by key models and consumed by the dispatcher.
//!
//! Actions are plain values. Their serialized form (internally tagged on
//! `type`) is what key specs and replay scripts use, e.g.
//! `{ type = "input", text = "あ" }` or `{ type = "delete", count = 1 }`.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::settings::settings;
use crate::state::BoolStates;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanDirection {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoolOperation {
    On,
    Off,
    Toggle,
}

impl BoolOperation {
    pub fn apply(self, current: bool) -> bool {
        match self {
            Self::On => true,
            Self::Off => false,
            Self::Toggle => !current,
        }
    }
}

/// Replacement applied to the last composed character (dakuten cycling etc.).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterTypeChange {
    Default,
    Dakuten,
    Handakuten,
    Kogaki,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterForm {
    Hiragana,
    Katakana,
    HalfwidthKatakana,
    Uppercase,
    Lowercase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSelection {
    First,
    Last,
    Offset(i32),
    Exact(i32),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Input {
        text: String,
        #[serde(default)]
        simple_insert: bool,
    },
    /// Negative counts delete forward.
    Delete {
        count: i32,
    },
    SmoothDelete,
    SmartDelete {
        direction: ScanDirection,
        targets: Vec<String>,
    },
    Paste,
    MoveCursor {
        count: i32,
    },
    SmartMoveCursor {
        direction: ScanDirection,
        targets: Vec<String>,
    },
    ReplaceLastCharacters {
        table: BTreeMap<String, String>,
    },
    ChangeCharacterType {
        behavior: CharacterTypeChange,
    },
    CompleteCharacterForm {
        forms: Vec<CharacterForm>,
    },
    Enter,
    SelectCandidate {
        selection: CandidateSelection,
    },
    MoveTab {
        tab: String,
    },
    SetCursorBar {
        op: BoolOperation,
    },
    SetTabBar {
        op: BoolOperation,
    },
    SetBoolState {
        key: String,
        op: BoolOperation,
    },
    /// `condition` names a bool state, optionally negated with a leading `!`.
    BoolSwitch {
        condition: String,
        #[serde(default)]
        if_true: Vec<Action>,
        #[serde(default)]
        if_false: Vec<Action>,
    },
    EnableResizingMode,
    DismissKeyboard,
    OpenApp {
        scheme: String,
    },
}

/// How an action takes part in batch aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerStyle {
    /// Never aggregated; runs with full recomputation unless it precedes
    /// an aggregable action in the same block.
    Irrelevant,
    /// Forces the end of an aggregation block.
    Separator,
    /// May have its recomputation suppressed in favor of a later action.
    Maybe,
}

/// Haptic/sound class requested when an action fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    Click,
    Delete,
    SmoothDelete,
    TabOrOtherKey,
}

impl Action {
    pub fn input(text: impl Into<String>) -> Self {
        Self::Input {
            text: text.into(),
            simple_insert: false,
        }
    }

    pub fn delete(count: i32) -> Self {
        Self::Delete { count }
    }

    pub fn move_cursor(count: i32) -> Self {
        Self::MoveCursor { count }
    }

    pub fn trigger_style(&self) -> TriggerStyle {
        match self {
            Self::Input { .. }
            | Self::Delete { .. }
            | Self::ChangeCharacterType { .. }
            | Self::SmoothDelete
            | Self::SmartDelete { .. }
            | Self::MoveCursor { .. }
            | Self::ReplaceLastCharacters { .. }
            | Self::SmartMoveCursor { .. } => TriggerStyle::Maybe,
            Self::Enter => TriggerStyle::Separator,
            _ => TriggerStyle::Irrelevant,
        }
    }

    pub fn feedback(&self, flags: &BoolStates) -> Option<Feedback> {
        match self {
            Self::Input { .. } | Self::Paste => Some(Feedback::Click),
            Self::Delete { .. } => Some(Feedback::Delete),
            Self::SmoothDelete | Self::SmartDelete { .. } | Self::SmartMoveCursor { .. } => {
                Some(Feedback::SmoothDelete)
            }
            Self::MoveTab { .. }
            | Self::Enter
            | Self::ChangeCharacterType { .. }
            | Self::CompleteCharacterForm { .. }
            | Self::SetCursorBar { .. }
            | Self::MoveCursor { .. }
            | Self::EnableResizingMode
            | Self::ReplaceLastCharacters { .. }
            | Self::SetTabBar { .. }
            | Self::SetBoolState { .. }
            | Self::SelectCandidate { .. } => Some(Feedback::TabOrOtherKey),
            Self::OpenApp { .. } | Self::DismissKeyboard => None,
            Self::BoolSwitch {
                condition,
                if_true,
                if_false,
            } => {
                let branch = if flags.evaluate(condition)? {
                    if_true
                } else {
                    if_false
                };
                branch.first()?.feedback(flags)
            }
        }
    }
}

/// Feedback of the first action in a list, the way a key reports a press.
pub fn leading_feedback(actions: &[Action], flags: &BoolStates) -> Option<Feedback> {
    actions.first()?.feedback(flags)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LongpressDuration {
    Light,
    #[default]
    Normal,
}

impl LongpressDuration {
    /// Dwell time before the long-press fires.
    pub fn delay(self) -> Duration {
        let longpress = &settings().longpress;
        match self {
            Self::Light => Duration::from_millis(longpress.light_ms),
            Self::Normal => Duration::from_millis(longpress.normal_ms),
        }
    }
}

/// Actions fired by holding a key: `start` once after the dwell time, then
/// `repeat` on every repeat tick until the hold ends.
///
/// Equality and hashing only look at the action lists. The dispatcher uses
/// equality to recognize an already scheduled long-press.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LongpressAction {
    #[serde(default)]
    pub duration: LongpressDuration,
    #[serde(default)]
    pub start: Vec<Action>,
    #[serde(default)]
    pub repeat: Vec<Action>,
}

impl LongpressAction {
    pub const NONE: Self = Self {
        duration: LongpressDuration::Normal,
        start: Vec::new(),
        repeat: Vec::new(),
    };

    pub fn new(duration: LongpressDuration, start: Vec<Action>, repeat: Vec<Action>) -> Self {
        Self {
            duration,
            start,
            repeat,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_empty() && self.repeat.is_empty()
    }
}

impl PartialEq for LongpressAction {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.repeat == other.repeat
    }
}

impl Eq for LongpressAction {}

impl Hash for LongpressAction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.start.hash(state);
        self.repeat.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_styles() {
        assert_eq!(Action::input("a").trigger_style(), TriggerStyle::Maybe);
        assert_eq!(Action::delete(1).trigger_style(), TriggerStyle::Maybe);
        assert_eq!(Action::SmoothDelete.trigger_style(), TriggerStyle::Maybe);
        assert_eq!(Action::move_cursor(-1).trigger_style(), TriggerStyle::Maybe);
        assert_eq!(Action::Enter.trigger_style(), TriggerStyle::Separator);
        assert_eq!(Action::Paste.trigger_style(), TriggerStyle::Irrelevant);
        assert_eq!(
            Action::SetBoolState {
                key: "is_shifted".into(),
                op: BoolOperation::Toggle
            }
            .trigger_style(),
            TriggerStyle::Irrelevant
        );
    }

    #[test]
    fn longpress_equality_ignores_duration() {
        let a = LongpressAction::new(LongpressDuration::Light, vec![Action::delete(1)], vec![]);
        let b = LongpressAction::new(LongpressDuration::Normal, vec![Action::delete(1)], vec![]);
        let c = LongpressAction::new(LongpressDuration::Light, vec![], vec![Action::delete(1)]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(LongpressAction::NONE.is_empty());
        assert!(!a.is_empty());
    }

    #[test]
    fn longpress_delays() {
        assert_eq!(LongpressDuration::Light.delay(), Duration::from_millis(125));
        assert_eq!(LongpressDuration::Normal.delay(), Duration::from_millis(400));
    }

    #[test]
    fn bool_switch_feedback_follows_branch() {
        let mut flags = BoolStates::default();
        let action = Action::BoolSwitch {
            condition: "is_shifted".into(),
            if_true: vec![Action::delete(1)],
            if_false: vec![Action::input("a")],
        };
        assert_eq!(action.feedback(&flags), Some(Feedback::Click));
        flags.set("is_shifted", true);
        assert_eq!(action.feedback(&flags), Some(Feedback::Delete));
        let unknown = Action::BoolSwitch {
            condition: "no_such_flag".into(),
            if_true: vec![Action::delete(1)],
            if_false: vec![],
        };
        assert_eq!(unknown.feedback(&flags), None);
    }

    #[test]
    fn action_toml_shape() {
        #[derive(Deserialize)]
        struct Wrapper {
            actions: Vec<Action>,
        }
        let w: Wrapper = toml::from_str(
            r#"
actions = [
    { type = "input", text = "か" },
    { type = "delete", count = 2 },
    { type = "enter" },
    { type = "select_candidate", selection = { offset = 1 } },
    { type = "set_bool_state", key = "is_caps_locked", op = "toggle" },
]
"#,
        )
        .unwrap();
        assert_eq!(w.actions[0], Action::input("か"));
        assert_eq!(w.actions[1], Action::delete(2));
        assert_eq!(w.actions[2], Action::Enter);
        assert_eq!(
            w.actions[3],
            Action::SelectCandidate {
                selection: CandidateSelection::Offset(1)
            }
        );
    }

    #[test]
    fn action_json_shape() {
        let json = serde_json::to_value(Action::input("a")).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "input", "text": "a", "simple_insert": false }));
        let json = serde_json::to_value(Action::OpenApp {
            scheme: "app://settings".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "open_app");
        let back: Action = serde_json::from_str(r#"{"type":"move_cursor","count":-1}"#).unwrap();
        assert_eq!(back, Action::MoveCursor { count: -1 });
    }
}
