//! Action application, batching and long-press timers.
//!
//! `ActionDispatcher` owns the shared `KeyboardState` and the `TextEditor`.
//! Every action goes through `do_action`. After an action the dispatcher
//! normally re-reads the editor (surrounding text, enter-key state, change
//! count). `register_actions` skips that re-read for all but the last
//! aggregable action of a run, since only the final state is visible.

use std::collections::HashSet;
use std::time::Duration;

use kbd_core::action::{leading_feedback, Action, Feedback, LongpressAction, TriggerStyle};
use kbd_core::settings::settings;
use kbd_core::state::{BarState, EnterKeyState, KeyboardState, UndoAction, IS_CAPS_LOCKED, IS_SHIFTED};
use kbd_core::text::SurroundingText;
use kbd_core::timer::{TimerQueue, Timestamp};
use tracing::{debug, debug_span};

use crate::editor::{Candidate, TextEditor};

/// Requests for the host that the core cannot carry out itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Feedback(Feedback),
    OpenApp(String),
    DismissKeyboard,
}

#[derive(Debug, Clone)]
enum LongpressFire {
    Start(LongpressAction),
    Repeat(LongpressAction),
}

impl LongpressFire {
    fn action(&self) -> &LongpressAction {
        match self {
            Self::Start(action) | Self::Repeat(action) => action,
        }
    }
}

pub struct ActionDispatcher<E: TextEditor> {
    editor: E,
    state: KeyboardState,
    longpress_timers: TimerQueue<LongpressFire>,
    reserved: HashSet<LongpressAction>,
    /// "Before" snapshot of a pending text change.
    pub(crate) pending_snapshot: Option<SurroundingText>,
    effects: Vec<Effect>,
    refreshes: u64,
    action_log: Option<Vec<Action>>,
}

impl<E: TextEditor> ActionDispatcher<E> {
    pub fn new(editor: E) -> Self {
        let mut dispatcher = Self {
            editor,
            state: KeyboardState::default(),
            longpress_timers: TimerQueue::new(),
            reserved: HashSet::new(),
            pending_snapshot: None,
            effects: Vec::new(),
            refreshes: 0,
            action_log: None,
        };
        dispatcher.refresh_surroundings();
        dispatcher
    }

    pub fn state(&self) -> &KeyboardState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut KeyboardState {
        &mut self.state
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut E {
        &mut self.editor
    }

    /// How many times the full state re-read has run.
    pub fn state_refreshes(&self) -> u64 {
        self.refreshes
    }

    /// Start recording every applied action (including actions registered
    /// by other actions).
    pub fn set_action_log(&mut self, enabled: bool) {
        self.action_log = enabled.then(Vec::new);
    }

    pub fn take_action_log(&mut self) -> Vec<Action> {
        self.action_log.as_mut().map(std::mem::take).unwrap_or_default()
    }

    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    pub(crate) fn push_feedback(&mut self, feedback: Option<Feedback>) {
        if let Some(feedback) = feedback {
            self.effects.push(Effect::Feedback(feedback));
        }
    }

    pub fn register_action(&mut self, action: Action) {
        self.do_action(&action, true);
    }

    /// Apply `actions` in order. The list is split at separators; inside a
    /// block only the last aggregable action re-reads the editor.
    pub fn register_actions(&mut self, actions: Vec<Action>) {
        if actions.is_empty() {
            return;
        }
        let _span = debug_span!("register_actions", count = actions.len()).entered();
        let mut block = Vec::new();
        for action in actions {
            if action.trigger_style() == TriggerStyle::Separator {
                self.run_block(std::mem::take(&mut block));
                self.do_action(&action, true);
            } else {
                block.push(action);
            }
        }
        self.run_block(block);
    }

    fn run_block(&mut self, block: Vec<Action>) {
        let last = block
            .iter()
            .rposition(|action| action.trigger_style() != TriggerStyle::Irrelevant);
        for (i, action) in block.iter().enumerate() {
            let refresh = last.map_or(true, |last| i == last);
            self.do_action(action, refresh);
        }
    }

    fn begin_edit(&mut self) {
        self.state.bar_state = BarState::None;
        if self.state.bool_states.is_shifted() {
            self.state.bool_states.set(IS_SHIFTED, false);
        }
    }

    fn do_action(&mut self, action: &Action, refresh: bool) {
        let _span = debug_span!("do_action", ?action, refresh).entered();
        if let Some(log) = &mut self.action_log {
            log.push(action.clone());
        }
        let mut undo = None;
        match action {
            Action::Input {
                text,
                simple_insert,
            } => {
                let flags = &self.state.bool_states;
                let upper = (flags.is_shifted() || flags.is_caps_locked())
                    && self.state.keyboard_language.uppercases_on_shift();
                let text = if upper {
                    text.to_uppercase()
                } else {
                    text.clone()
                };
                self.begin_edit();
                self.editor.input(&text, *simple_insert);
            }
            Action::Delete { count } => {
                self.begin_edit();
                self.editor.delete_backward(*count);
            }
            Action::SmoothDelete => {
                self.effects.push(Effect::Feedback(Feedback::SmoothDelete));
                self.begin_edit();
                let deleted = self.editor.smooth_delete();
                undo = reinsert_undo(deleted);
            }
            Action::SmartDelete { direction, targets } => {
                self.begin_edit();
                let deleted = self.editor.smart_delete(*direction, targets);
                undo = reinsert_undo(deleted);
            }
            Action::Paste => {
                if !self.state.has_full_access {
                    debug!("paste needs full access, skipped");
                    return;
                }
                self.editor.paste();
            }
            Action::MoveCursor { count } => {
                self.editor.move_cursor(*count);
            }
            Action::SmartMoveCursor { direction, targets } => {
                self.editor.smart_move_cursor(*direction, targets);
            }
            Action::ReplaceLastCharacters { table } => {
                self.begin_edit();
                self.editor.replace_last_characters(table);
            }
            Action::ChangeCharacterType { behavior } => {
                self.begin_edit();
                self.editor.change_character(*behavior);
            }
            Action::CompleteCharacterForm { forms } => {
                self.begin_edit();
                match self.editor.candidate_for_forms(forms) {
                    Some(candidate) => self.complete_candidate(candidate),
                    None => debug!(?forms, "no candidate for forms"),
                }
            }
            Action::Enter => {
                self.begin_edit();
                match self.editor.selected_candidate() {
                    Some(candidate) => self.complete_candidate(candidate),
                    None => {
                        let follow_up = self.editor.enter();
                        self.register_actions(follow_up);
                    }
                }
            }
            Action::SelectCandidate { selection } => {
                self.state.candidate_selection_request = Some(*selection);
            }
            Action::MoveTab { tab } => {
                self.state.set_tab(tab);
            }
            Action::SetCursorBar { op } => {
                let on = op.apply(self.state.bar_state == BarState::Cursor);
                self.state.bar_state = if on { BarState::Cursor } else { BarState::None };
                self.state.surrounding_text = self.editor.surrounding_text();
            }
            Action::SetTabBar { op } => {
                let on = op.apply(self.state.bar_state == BarState::Tab);
                self.state.bar_state = if on { BarState::Tab } else { BarState::None };
            }
            Action::SetBoolState { key, op } => {
                let current = self.state.bool_states.get(key).unwrap_or(false);
                let value = op.apply(current);
                self.state.bool_states.set(key, value);
                // Caps lock supersedes the one-shot shift.
                if key == IS_CAPS_LOCKED && value {
                    self.state.bool_states.set(IS_SHIFTED, false);
                }
            }
            Action::BoolSwitch {
                condition,
                if_true,
                if_false,
            } => match self.state.bool_states.evaluate(condition) {
                Some(true) => self.register_actions(if_true.clone()),
                Some(false) => self.register_actions(if_false.clone()),
                None => debug!(%condition, "unknown bool state"),
            },
            Action::EnableResizingMode => self.state.resizing = true,
            Action::DismissKeyboard => self.effects.push(Effect::DismissKeyboard),
            Action::OpenApp { scheme } => self.effects.push(Effect::OpenApp(scheme.clone())),
        }
        if refresh {
            self.refresh_state(undo);
        }
    }

    fn refresh_state(&mut self, undo: Option<Action>) {
        self.refreshes += 1;
        self.refresh_surroundings();
        let count = self.editor.text_changed_count();
        self.state.text_changed_count = count;
        self.editor.reset_post_composition_predictions_if_necessary(count);
        if let Some(action) = undo {
            self.state.undo_action = Some(UndoAction {
                action,
                text_changed_count: count,
            });
        }
        self.editor.set_keyboard_language(self.state.keyboard_language);
    }

    /// Re-read the surrounding text and the enter-key state.
    pub(crate) fn refresh_surroundings(&mut self) {
        self.state.surrounding_text = self.editor.surrounding_text();
        self.refresh_enter_key_state();
    }

    pub(crate) fn refresh_enter_key_state(&mut self) {
        self.state.enter_key_state = if self.editor.selected_candidate().is_some() {
            EnterKeyState::Complete
        } else {
            self.editor.enter_key_state()
        };
    }

    pub fn complete_candidate(&mut self, candidate: Candidate) {
        let _span = debug_span!("complete_candidate", text = %candidate.text).entered();
        self.editor.complete_candidate(&candidate);
        self.register_actions(candidate.actions);
        self.refresh_surroundings();
    }

    // ------------------------------------------------------------------
    // Long-press timers
    // ------------------------------------------------------------------

    /// Schedule `action.start` once after `delay` and `action.repeat` every
    /// repeat interval after the same delay. A structurally equal action
    /// that is already reserved is left alone.
    pub fn reserve_longpress_action(
        &mut self,
        action: &LongpressAction,
        delay: Duration,
        now: Timestamp,
    ) {
        if action.is_empty() {
            return;
        }
        if self.reserved.contains(action) {
            debug!(?action, "long press already reserved");
            return;
        }
        debug!(?action, delay_ms = delay.as_millis() as u64, "reserve long press");
        self.reserved.insert(action.clone());
        if !action.start.is_empty() {
            self.longpress_timers
                .schedule_once(now, delay, LongpressFire::Start(action.clone()));
        }
        if !action.repeat.is_empty() {
            self.longpress_timers.schedule_repeating(
                now,
                delay,
                settings().longpress.repeat_interval(),
                LongpressFire::Repeat(action.clone()),
            );
        }
    }

    /// Cancel every timer of an equal action. Ending an action that was
    /// never reserved is a no-op.
    pub fn end_longpress_action(&mut self, action: &LongpressAction) {
        if self.reserved.remove(action) {
            let cancelled = self
                .longpress_timers
                .cancel_where(|fire| fire.action() == action);
            debug!(?action, cancelled, "end long press");
        }
    }

    pub fn is_longpress_reserved(&self, action: &LongpressAction) -> bool {
        self.reserved.contains(action)
    }

    /// Number of pending long-press timers (start and repeat).
    pub fn pending_longpress_timers(&self) -> usize {
        self.longpress_timers.len()
    }

    pub fn next_longpress_deadline(&self) -> Option<Timestamp> {
        self.longpress_timers.next_deadline()
    }

    /// Fire the earliest long-press timer due at `now`. Returns its deadline.
    pub fn fire_next_longpress(&mut self, now: Timestamp) -> Option<Timestamp> {
        let (_, fired_at, fire) = self.longpress_timers.pop_due(now)?;
        let actions = match fire {
            LongpressFire::Start(action) => action.start,
            LongpressFire::Repeat(action) => action.repeat,
        };
        let _span = debug_span!("longpress_fire", at = fired_at.as_millis()).entered();
        let feedback = leading_feedback(&actions, &self.state.bool_states);
        self.push_feedback(feedback);
        self.register_actions(actions);
        Some(fired_at)
    }

    pub fn close_keyboard(&mut self) {
        debug!("close keyboard");
        self.editor.close_keyboard();
        self.longpress_timers.clear();
        self.reserved.clear();
        self.pending_snapshot = None;
    }
}

/// Undo for a delete that removed `deleted`: put the text back as is.
fn reinsert_undo(deleted: String) -> Option<Action> {
    if deleted.is_empty() {
        return None;
    }
    Some(Action::Input {
        text: deleted,
        simple_insert: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferEditor;
    use kbd_core::action::LongpressDuration;
    use kbd_core::state::KeyboardLanguage;

    fn dispatcher() -> ActionDispatcher<BufferEditor> {
        ActionDispatcher::new(BufferEditor::new())
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn batch_refreshes_once_per_block() {
        let mut d = dispatcher();
        let before = d.state_refreshes();
        d.register_actions(vec![
            Action::input("a"),
            Action::input("b"),
            Action::delete(1),
            Action::Enter,
        ]);
        assert_eq!(d.state_refreshes() - before, 2);
    }

    #[test]
    fn irrelevant_only_block_refreshes_each() {
        let mut d = dispatcher();
        let before = d.state_refreshes();
        d.register_actions(vec![
            Action::SetTabBar {
                op: kbd_core::action::BoolOperation::On,
            },
            Action::MoveTab { tab: "abc".into() },
        ]);
        assert_eq!(d.state_refreshes() - before, 2);
        assert_eq!(d.state().current_tab.as_deref(), Some("abc"));
        // Moving tabs keeps the tab bar open.
        assert_eq!(d.state().bar_state, BarState::Tab);
    }

    #[test]
    fn state_follows_editor_after_batch() {
        let mut d = dispatcher();
        d.state_mut().keyboard_language = KeyboardLanguage::EnUs;
        d.register_actions(vec![Action::input("a"), Action::input("b"), Action::delete(1)]);
        assert_eq!(d.state().surrounding_text, SurroundingText::new("a", "", ""));
        assert_eq!(d.state().text_changed_count, d.editor().text_changed_count());
    }

    #[test]
    fn shift_uppercases_once() {
        let mut d = dispatcher();
        d.state_mut().keyboard_language = KeyboardLanguage::EnUs;
        d.state_mut().bool_states.set(IS_SHIFTED, true);
        d.register_actions(vec![Action::input("a"), Action::input("b")]);
        assert_eq!(d.editor().text(), "Ab");
        assert!(!d.state().bool_states.is_shifted());
    }

    #[test]
    fn caps_lock_survives_input() {
        let mut d = dispatcher();
        d.state_mut().keyboard_language = KeyboardLanguage::EnUs;
        d.register_action(Action::SetBoolState {
            key: IS_CAPS_LOCKED.into(),
            op: kbd_core::action::BoolOperation::On,
        });
        d.register_actions(vec![Action::input("a"), Action::input("b")]);
        assert_eq!(d.editor().text(), "AB");
        assert!(d.state().bool_states.is_caps_locked());
    }

    #[test]
    fn smooth_delete_records_undo() {
        let mut d = ActionDispatcher::new(BufferEditor::with_text("hello world", "", ""));
        d.register_action(Action::SmoothDelete);
        let undo = d.state().undo_action.clone().unwrap();
        assert_eq!(
            undo.action,
            Action::Input {
                text: "world".into(),
                simple_insert: true
            }
        );
        assert_eq!(undo.text_changed_count, d.editor().text_changed_count());
        assert_eq!(d.take_effects(), vec![Effect::Feedback(Feedback::SmoothDelete)]);
    }

    #[test]
    fn smooth_delete_feedback_without_deletion() {
        let mut d = dispatcher();
        d.register_action(Action::SmoothDelete);
        assert_eq!(d.take_effects(), vec![Effect::Feedback(Feedback::SmoothDelete)]);
        assert!(d.state().undo_action.is_none());
    }

    #[test]
    fn cursor_moves_keep_the_cursor_bar() {
        let mut d = ActionDispatcher::new(BufferEditor::with_text("abc", "", "def"));
        d.state_mut().has_full_access = true;
        d.state_mut().bool_states.set(IS_SHIFTED, true);
        d.register_action(Action::SetCursorBar {
            op: kbd_core::action::BoolOperation::On,
        });
        d.register_action(Action::MoveCursor { count: -1 });
        assert_eq!(d.state().bar_state, BarState::Cursor);
        assert_eq!(d.state().surrounding_text, SurroundingText::new("ab", "", "cdef"));
        d.register_action(Action::SmartMoveCursor {
            direction: kbd_core::action::ScanDirection::Forward,
            targets: vec!["f".into()],
        });
        d.register_action(Action::Paste);
        assert_eq!(d.state().bar_state, BarState::Cursor);
        assert!(d.state().bool_states.is_shifted());

        d.register_action(Action::input("x"));
        assert_eq!(d.state().bar_state, BarState::None);
    }

    #[test]
    fn trailing_irrelevant_actions_skip_refresh() {
        let mut d = dispatcher();
        let before = d.state_refreshes();
        d.register_actions(vec![
            Action::input("a"),
            Action::SetTabBar {
                op: kbd_core::action::BoolOperation::On,
            },
            Action::SetBoolState {
                key: "custom".into(),
                op: kbd_core::action::BoolOperation::On,
            },
        ]);
        assert_eq!(d.state_refreshes() - before, 1);
        assert_eq!(d.state().bar_state, BarState::Tab);
        assert_eq!(d.state().surrounding_text, SurroundingText::new("a", "", ""));
    }

    #[test]
    fn paste_requires_full_access() {
        let mut d = dispatcher();
        d.editor_mut().set_clipboard("clip");
        d.register_action(Action::Paste);
        assert_eq!(d.editor().text(), "");
        d.state_mut().has_full_access = true;
        d.register_action(Action::Paste);
        assert_eq!(d.editor().text(), "clip");
    }

    #[test]
    fn bool_switch_picks_branch() {
        let mut d = dispatcher();
        d.state_mut().keyboard_language = KeyboardLanguage::EnUs;
        let switch = Action::BoolSwitch {
            condition: "!is_caps_locked".into(),
            if_true: vec![Action::input("x")],
            if_false: vec![Action::input("y")],
        };
        d.register_action(switch.clone());
        assert_eq!(d.editor().text(), "x");
        d.register_action(Action::BoolSwitch {
            condition: "nope".into(),
            if_true: vec![Action::input("z")],
            if_false: vec![],
        });
        assert_eq!(d.editor().text(), "x");
    }

    #[test]
    fn effects_for_open_app_and_dismiss() {
        let mut d = dispatcher();
        d.register_actions(vec![
            Action::OpenApp {
                scheme: "app://settings".into(),
            },
            Action::DismissKeyboard,
        ]);
        assert_eq!(
            d.take_effects(),
            vec![
                Effect::OpenApp("app://settings".into()),
                Effect::DismissKeyboard
            ]
        );
        assert!(d.take_effects().is_empty());
    }

    #[test]
    fn longpress_start_then_repeat() {
        let mut d = dispatcher();
        d.state_mut().keyboard_language = KeyboardLanguage::EnUs;
        let action = LongpressAction::new(
            LongpressDuration::Normal,
            vec![Action::input("s")],
            vec![Action::input("r")],
        );
        d.reserve_longpress_action(&action, action.duration.delay(), Timestamp::ZERO);
        assert_eq!(d.pending_longpress_timers(), 2);
        let now = Timestamp::from_millis(650);
        while d.fire_next_longpress(now).is_some() {}
        // 400 start + repeat at 400, 500, 600
        assert_eq!(d.editor().text(), "srrr");
        d.end_longpress_action(&action);
        assert_eq!(d.pending_longpress_timers(), 0);
        assert!(d.fire_next_longpress(Timestamp::from_millis(10_000)).is_none());
    }

    #[test]
    fn equal_reservations_share_one_loop() {
        let mut d = dispatcher();
        let a = LongpressAction::new(LongpressDuration::Light, vec![], vec![Action::delete(1)]);
        let b = LongpressAction::new(LongpressDuration::Normal, vec![], vec![Action::delete(1)]);
        d.reserve_longpress_action(&a, ms(125), Timestamp::ZERO);
        d.reserve_longpress_action(&b, ms(400), Timestamp::from_millis(10));
        assert_eq!(d.pending_longpress_timers(), 1);
        d.end_longpress_action(&b);
        assert!(!d.is_longpress_reserved(&a));
        d.end_longpress_action(&a);
        assert_eq!(d.pending_longpress_timers(), 0);
    }

    #[test]
    fn close_keyboard_drops_everything() {
        let mut d = dispatcher();
        let action = LongpressAction::new(LongpressDuration::Light, vec![Action::delete(1)], vec![]);
        d.reserve_longpress_action(&action, ms(125), Timestamp::ZERO);
        d.pending_snapshot = Some(SurroundingText::default());
        d.close_keyboard();
        assert_eq!(d.pending_longpress_timers(), 0);
        assert!(d.pending_snapshot.is_none());
        assert!(d.editor().is_closed());
    }
}
