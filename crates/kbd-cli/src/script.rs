//! Touch scripts: a layout, a starting field and a timed list of steps,
//! replayed against a `KeyboardSession` over a `BufferEditor`.
//!
//! ```toml
//! [field]
//! language = "ja_jp"
//! text = { left = "今日は", right = "" }
//!
//! [[keys]]
//! id = "a"
//! [keys.spec]
//! kind = "general"
//! press = [{ type = "input", text = "あ" }]
//! flick.left = { press = [{ type = "input", text = "い" }] }
//!
//! [[steps]]
//! op = "down"
//! key = "a"
//! at = 0
//!
//! [[steps]]
//! op = "up"
//! key = "a"
//! at = 40
//! x = -30.0
//! ```

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span};

use kbd_core::action::{Action, Feedback};
use kbd_core::flick::Point;
use kbd_core::key_model::{KeyGeometry, KeySpec};
use kbd_core::state::{EnterKeyState, KeyboardLanguage, KeyboardType, ReturnKeyType};
use kbd_core::text::SurroundingText;
use kbd_core::timer::Timestamp;
use kbd_session::{BufferEditor, Effect, KeyId, KeyboardSession, TextChange, TextEditor};

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    Parse(String),

    #[error("duplicate key id {0:?}")]
    DuplicateKey(String),

    #[error("step {step}: unknown key {key:?}")]
    UnknownKey { step: usize, key: String },

    #[error("step {step}: time {at}ms is before {previous}ms")]
    TimeWentBackwards { step: usize, at: u64, previous: u64 },
}

/// Host field the script starts from.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub text: SurroundingText,
    pub language: KeyboardLanguage,
    pub keyboard_type: KeyboardType,
    pub return_key_type: ReturnKeyType,
    pub full_access: bool,
    pub live_conversion: bool,
    pub clipboard: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyEntry {
    pub id: String,
    pub spec: KeySpec,
    #[serde(default)]
    pub geometry: KeyGeometry,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Down {
        key: String,
        at: u64,
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
    },
    Move {
        key: String,
        at: u64,
        x: f64,
        y: f64,
    },
    Up {
        key: String,
        at: u64,
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
    },
    Cancel {
        key: String,
    },
    /// Let time pass and fire due timers.
    Advance {
        at: u64,
    },
    /// An action from outside the key grid (candidate bar, toolbar).
    Action {
        action: Action,
    },
    /// The user edits the field directly (tap to move, select, cut, undo).
    /// Earlier keyboard edits count as already reported by the host.
    Edit {
        text: SurroundingText,
    },
    /// A raw host notification pair, delivered as is.
    Notify {
        before: SurroundingText,
        after: SurroundingText,
    },
    Close,
}

impl Step {
    fn at(&self) -> Option<u64> {
        match self {
            Self::Down { at, .. } | Self::Move { at, .. } | Self::Up { at, .. } | Self::Advance { at } => {
                Some(*at)
            }
            _ => None,
        }
    }

    fn key(&self) -> Option<&str> {
        match self {
            Self::Down { key, .. }
            | Self::Move { key, .. }
            | Self::Up { key, .. }
            | Self::Cancel { key } => Some(key),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub field: FieldConfig,
    #[serde(default)]
    pub keys: Vec<KeyEntry>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

pub fn parse_script(content: &str) -> Result<Script, ScriptError> {
    let script: Script = toml::from_str(content).map_err(|e| ScriptError::Parse(e.to_string()))?;
    script.validate()?;
    Ok(script)
}

pub fn load_script(path: &Path) -> Result<Script, ScriptError> {
    let content = fs::read_to_string(path)?;
    parse_script(&content)
}

impl Script {
    /// Key ids are unique, steps only touch declared keys and time never
    /// goes backwards.
    pub fn validate(&self) -> Result<(), ScriptError> {
        let mut ids = HashSet::new();
        for entry in &self.keys {
            if !ids.insert(entry.id.as_str()) {
                return Err(ScriptError::DuplicateKey(entry.id.clone()));
            }
        }
        let mut previous = 0;
        for (i, step) in self.steps.iter().enumerate() {
            let step_no = i + 1;
            if let Some(key) = step.key() {
                if !ids.contains(key) {
                    return Err(ScriptError::UnknownKey {
                        step: step_no,
                        key: key.to_string(),
                    });
                }
            }
            if let Some(at) = step.at() {
                if at < previous {
                    return Err(ScriptError::TimeWentBackwards {
                        step: step_no,
                        at,
                        previous,
                    });
                }
                previous = at;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Replay log
// ---------------------------------------------------------------------------

/// Serializable form of [`TextChange`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeRecord {
    SystemOperation,
    LiveConversionSubmitted,
    Selected { text: String, length_limit: usize },
    Deselected,
    CursorMoved { offset: i64 },
    LiveConversionStopped,
    Tapped,
    LineDeselected,
    Cut { text: String },
    HistoryNavigated,
    CursorJumped,
}

impl From<TextChange> for ChangeRecord {
    fn from(change: TextChange) -> Self {
        match change {
            TextChange::SystemOperation => Self::SystemOperation,
            TextChange::LiveConversionSubmitted => Self::LiveConversionSubmitted,
            TextChange::Selected { text, length_limit } => Self::Selected { text, length_limit },
            TextChange::Deselected => Self::Deselected,
            TextChange::CursorMoved { offset } => Self::CursorMoved { offset },
            TextChange::LiveConversionStopped => Self::LiveConversionStopped,
            TextChange::Tapped => Self::Tapped,
            TextChange::LineDeselected => Self::LineDeselected,
            TextChange::Cut { text } => Self::Cut { text },
            TextChange::HistoryNavigated => Self::HistoryNavigated,
            TextChange::CursorJumped => Self::CursorJumped,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogEntry {
    Action { at: u64, action: Action },
    Feedback { at: u64, feedback: Feedback },
    OpenApp { at: u64, scheme: String },
    DismissKeyboard { at: u64 },
    Change { at: u64, change: ChangeRecord },
}

impl LogEntry {
    pub fn at(&self) -> u64 {
        match self {
            Self::Action { at, .. }
            | Self::Feedback { at, .. }
            | Self::OpenApp { at, .. }
            | Self::DismissKeyboard { at }
            | Self::Change { at, .. } => *at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub log: Vec<LogEntry>,
    pub text: SurroundingText,
    pub composing: String,
    pub is_shifted: bool,
    pub is_caps_locked: bool,
    pub enter_key_state: EnterKeyState,
    pub closed: bool,
}

impl ReplayReport {
    /// Applied actions only, without timestamps.
    pub fn actions(&self) -> Vec<&Action> {
        self.log
            .iter()
            .filter_map(|entry| match entry {
                LogEntry::Action { action, .. } => Some(action),
                _ => None,
            })
            .collect()
    }

    pub fn changes(&self) -> Vec<&ChangeRecord> {
        self.log
            .iter()
            .filter_map(|entry| match entry {
                LogEntry::Change { change, .. } => Some(change),
                _ => None,
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

fn build_session(script: &Script) -> KeyboardSession<BufferEditor> {
    let field = &script.field;
    let mut editor = BufferEditor::with_text(&field.text.left, &field.text.center, &field.text.right);
    editor.set_live_conversion(field.live_conversion);
    editor.set_clipboard(field.clipboard.clone());
    editor.set_return_key_type(field.return_key_type);
    editor.set_keyboard_language(field.language);

    let mut session = KeyboardSession::new(editor);
    let state = session.state_mut();
    state.keyboard_language = field.language;
    state.keyboard_type = field.keyboard_type;
    state.return_key_type = field.return_key_type;
    state.has_full_access = field.full_access;

    for entry in &script.keys {
        session.register_spec(entry.id.as_str(), &entry.spec, entry.geometry);
    }
    session.dispatcher_mut().set_action_log(true);
    session
}

fn collect(session: &mut KeyboardSession<BufferEditor>, at: u64, log: &mut Vec<LogEntry>) {
    for action in session.dispatcher_mut().take_action_log() {
        log.push(LogEntry::Action { at, action });
    }
    for effect in session.take_effects() {
        log.push(match effect {
            Effect::Feedback(feedback) => LogEntry::Feedback { at, feedback },
            Effect::OpenApp(scheme) => LogEntry::OpenApp { at, scheme },
            Effect::DismissKeyboard => LogEntry::DismissKeyboard { at },
        });
    }
}

/// Fire timers one deadline at a time so each logged action carries the
/// time it actually fired.
fn run_until(session: &mut KeyboardSession<BufferEditor>, at: u64, log: &mut Vec<LogEntry>) {
    let target = Timestamp::from_millis(at);
    while let Some(deadline) = session.next_deadline().filter(|d| *d <= target) {
        session.advance_to(deadline);
        collect(session, deadline.as_millis(), log);
    }
    session.advance_to(target);
}

fn log_change(change: Option<TextChange>, at: u64, log: &mut Vec<LogEntry>) {
    if let Some(change) = change {
        log.push(LogEntry::Change {
            at,
            change: change.into(),
        });
    }
}

pub fn replay(script: &Script) -> Result<ReplayReport, ScriptError> {
    script.validate()?;
    let _span = debug_span!("replay", keys = script.keys.len(), steps = script.steps.len()).entered();
    let mut session = build_session(script);
    let mut log = Vec::new();

    for step in &script.steps {
        if let Some(at) = step.at() {
            run_until(&mut session, at, &mut log);
        }
        let now = session.now();
        let at = now.as_millis();
        debug!(?step, at, "step");
        match step {
            Step::Down { key, x, y, .. } => {
                session.touch_down(&KeyId::from(key.as_str()), Point::new(*x, *y), now)
            }
            Step::Move { key, x, y, .. } => {
                session.touch_move(&KeyId::from(key.as_str()), Point::new(*x, *y), now)
            }
            Step::Up { key, x, y, .. } => {
                session.touch_up(&KeyId::from(key.as_str()), Point::new(*x, *y), now)
            }
            Step::Cancel { key } => session.touch_cancel(&KeyId::from(key.as_str())),
            Step::Advance { .. } => {}
            Step::Action { action } => session.register_action(action.clone()),
            Step::Edit { text } => {
                session.editor_mut().take_previous_system_operation();
                let before = session.editor().surrounding_text();
                session.notify_something_will_change(before);
                session.editor_mut().set_field(text.clone());
                let change = session.notify_something_did_change(text.clone());
                log_change(change, at, &mut log);
            }
            Step::Notify { before, after } => {
                session.notify_something_will_change(before.clone());
                let change = session.notify_something_did_change(after.clone());
                log_change(change, at, &mut log);
            }
            Step::Close => session.close_keyboard(),
        }
        collect(&mut session, at, &mut log);
    }

    let state = session.state();
    let flags = &state.bool_states;
    Ok(ReplayReport {
        text: session.editor().surrounding_text(),
        composing: session.editor().composing_text().to_string(),
        is_shifted: flags.is_shifted(),
        is_caps_locked: flags.is_caps_locked(),
        enter_key_state: state.enter_key_state,
        closed: session.editor().is_closed(),
        log,
    })
}
