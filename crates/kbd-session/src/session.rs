use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use kbd_core::action::{Action, Feedback, LongpressAction};
use kbd_core::flick::Point;
use kbd_core::key_model::{KeyGeometry, KeyModel, KeySpec, PressStyle};
use kbd_core::state::KeyboardState;
use kbd_core::text::SurroundingText;
use kbd_core::timer::{TimerQueue, Timestamp};
use tracing::{debug, warn};

use crate::dispatcher::{ActionDispatcher, Effect};
use crate::editor::{Candidate, TextEditor};
use crate::lifecycle::{GestureHost, GestureTimer, PressLifecycle, PressState, Suggest};
use crate::simple_key::SimpleKeyLifecycle;
use crate::text_change::TextChange;

/// Name of a key in the current layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId(String);

impl KeyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for KeyId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for KeyId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug)]
enum Recognizer {
    Unified(PressLifecycle),
    Simple(SimpleKeyLifecycle),
}

#[derive(Debug)]
struct KeyEntry {
    model: Box<dyn KeyModel>,
    recognizer: Recognizer,
}

/// Gesture side effects for one key at one instant.
struct SessionHost<'a, E: TextEditor> {
    key: &'a KeyId,
    now: Timestamp,
    dispatcher: &'a mut ActionDispatcher<E>,
    timers: &'a mut TimerQueue<(KeyId, GestureTimer)>,
}

impl<E: TextEditor> GestureHost for SessionHost<'_, E> {
    fn state(&self) -> &KeyboardState {
        self.dispatcher.state()
    }

    fn feedback(&mut self, feedback: Option<Feedback>) {
        self.dispatcher.push_feedback(feedback);
    }

    fn register_actions(&mut self, actions: Vec<Action>) {
        self.dispatcher.register_actions(actions);
    }

    fn reserve_longpress(&mut self, action: &LongpressAction) {
        self.dispatcher
            .reserve_longpress_action(action, action.duration.delay(), self.now);
    }

    fn end_longpress(&mut self, action: &LongpressAction) {
        self.dispatcher.end_longpress_action(action);
    }

    fn schedule(&mut self, timer: GestureTimer, delay: Duration) {
        self.cancel(timer);
        self.timers
            .schedule_once(self.now, delay, (self.key.clone(), timer));
    }

    fn cancel(&mut self, timer: GestureTimer) {
        let key = self.key;
        self.timers
            .cancel_where(|(k, t)| k == key && *t == timer);
    }
}

/// One keyboard session: the layout's keys, the dispatcher and a single
/// virtual timeline.
///
/// Every touch first fires the timers due at its timestamp, so a host that
/// only reports touches still sees long-presses happen in order. Timers of
/// the dispatcher and of the gesture recognizers share the timeline; when
/// two are due at the same instant the dispatcher's long-press fires first.
pub struct KeyboardSession<E: TextEditor> {
    dispatcher: ActionDispatcher<E>,
    keys: HashMap<KeyId, KeyEntry>,
    gesture_timers: TimerQueue<(KeyId, GestureTimer)>,
    now: Timestamp,
}

impl<E: TextEditor> KeyboardSession<E> {
    pub fn new(editor: E) -> Self {
        Self {
            dispatcher: ActionDispatcher::new(editor),
            keys: HashMap::new(),
            gesture_timers: TimerQueue::new(),
            now: Timestamp::ZERO,
        }
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    // ------------------------------------------------------------------
    // Layout
    // ------------------------------------------------------------------

    /// Add a key, replacing (and cancelling any touch on) a key with the
    /// same id.
    pub fn register_key(
        &mut self,
        id: impl Into<KeyId>,
        model: Box<dyn KeyModel>,
        style: PressStyle,
        geometry: KeyGeometry,
    ) {
        let id = id.into();
        self.remove_key(&id);
        let recognizer = match style {
            PressStyle::Unified => Recognizer::Unified(PressLifecycle::new(geometry)),
            PressStyle::Simple => Recognizer::Simple(SimpleKeyLifecycle::default()),
        };
        debug!(key = %id, ?style, "register key");
        self.keys.insert(id, KeyEntry { model, recognizer });
    }

    pub fn register_spec(&mut self, id: impl Into<KeyId>, spec: &KeySpec, geometry: KeyGeometry) {
        self.register_key(id, spec.build(), spec.press_style(), geometry);
    }

    /// Remove a key as its view goes away. A touch in progress is cancelled.
    pub fn remove_key(&mut self, id: &KeyId) -> bool {
        if !self.keys.contains_key(id) {
            return false;
        }
        self.touch_cancel(id);
        self.keys.remove(id);
        true
    }

    pub fn has_key(&self, id: &KeyId) -> bool {
        self.keys.contains_key(id)
    }

    // ------------------------------------------------------------------
    // Touches
    // ------------------------------------------------------------------

    fn with_key(
        &mut self,
        id: &KeyId,
        now: Timestamp,
        f: impl FnOnce(&mut Recognizer, &dyn KeyModel, &mut SessionHost<'_, E>),
    ) {
        let Some(entry) = self.keys.get_mut(id) else {
            warn!(key = %id, "touch on unknown key");
            return;
        };
        let mut host = SessionHost {
            key: id,
            now,
            dispatcher: &mut self.dispatcher,
            timers: &mut self.gesture_timers,
        };
        f(&mut entry.recognizer, entry.model.as_ref(), &mut host);
    }

    pub fn touch_down(&mut self, id: &KeyId, point: Point, now: Timestamp) {
        self.advance_to(now);
        self.with_key(id, now, |recognizer, model, host| match recognizer {
            Recognizer::Unified(lifecycle) => lifecycle.touch_down(model, host, point, now),
            Recognizer::Simple(lifecycle) => lifecycle.touch_down(model, host, point, now),
        });
    }

    pub fn touch_move(&mut self, id: &KeyId, point: Point, now: Timestamp) {
        self.advance_to(now);
        self.with_key(id, now, |recognizer, model, host| match recognizer {
            Recognizer::Unified(lifecycle) => lifecycle.touch_move(model, host, point, now),
            Recognizer::Simple(lifecycle) => lifecycle.touch_move(model, host, point, now),
        });
    }

    pub fn touch_up(&mut self, id: &KeyId, point: Point, now: Timestamp) {
        self.advance_to(now);
        self.with_key(id, now, |recognizer, model, host| match recognizer {
            Recognizer::Unified(lifecycle) => lifecycle.touch_up(model, host, point, now),
            Recognizer::Simple(lifecycle) => lifecycle.touch_up(model, host, point, now),
        });
    }

    pub fn touch_cancel(&mut self, id: &KeyId) {
        let now = self.now;
        self.with_key(id, now, |recognizer, model, host| match recognizer {
            Recognizer::Unified(lifecycle) => lifecycle.touch_cancel(model, host),
            Recognizer::Simple(lifecycle) => lifecycle.touch_cancel(model, host),
        });
    }

    pub fn is_pressed(&self, id: &KeyId) -> bool {
        match self.keys.get(id).map(|entry| &entry.recognizer) {
            Some(Recognizer::Unified(lifecycle)) => lifecycle.state().is_active(),
            Some(Recognizer::Simple(lifecycle)) => lifecycle.is_pressed(),
            None => false,
        }
    }

    pub fn press_state(&self, id: &KeyId) -> Option<PressState> {
        match &self.keys.get(id)?.recognizer {
            Recognizer::Unified(lifecycle) => Some(lifecycle.state()),
            Recognizer::Simple(_) => None,
        }
    }

    pub fn suggest(&self, id: &KeyId) -> Option<Suggest> {
        match &self.keys.get(id)?.recognizer {
            Recognizer::Unified(lifecycle) => lifecycle.suggest(),
            Recognizer::Simple(_) => None,
        }
    }

    // ------------------------------------------------------------------
    // Timeline
    // ------------------------------------------------------------------

    /// Fire every timer due at `now`, each at its own deadline.
    pub fn advance_to(&mut self, now: Timestamp) {
        loop {
            let longpress = self
                .dispatcher
                .next_longpress_deadline()
                .filter(|deadline| *deadline <= now);
            let gesture = self
                .gesture_timers
                .next_deadline()
                .filter(|deadline| *deadline <= now);
            match (longpress, gesture) {
                (None, None) => break,
                (Some(l), g) if g.map_or(true, |g| l <= g) => {
                    self.dispatcher.fire_next_longpress(now);
                }
                _ => {
                    let Some((_, at, (id, timer))) = self.gesture_timers.pop_due(now) else {
                        break;
                    };
                    self.fire_gesture_timer(&id, timer, at);
                }
            }
        }
        if now > self.now {
            self.now = now;
        }
    }

    fn fire_gesture_timer(&mut self, id: &KeyId, timer: GestureTimer, at: Timestamp) {
        self.with_key(id, at, |recognizer, model, host| {
            if let Recognizer::Unified(lifecycle) = recognizer {
                lifecycle.on_timer(timer, model, host, at);
            }
        });
    }

    pub fn next_deadline(&self) -> Option<Timestamp> {
        match (
            self.dispatcher.next_longpress_deadline(),
            self.gesture_timers.next_deadline(),
        ) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn pending_gesture_timers(&self) -> usize {
        self.gesture_timers.len()
    }

    // ------------------------------------------------------------------
    // Actions and notifications
    // ------------------------------------------------------------------

    pub fn register_action(&mut self, action: Action) {
        self.dispatcher.register_action(action);
    }

    pub fn register_actions(&mut self, actions: Vec<Action>) {
        self.dispatcher.register_actions(actions);
    }

    pub fn reserve_longpress_action(&mut self, action: &LongpressAction, now: Timestamp) {
        self.advance_to(now);
        self.dispatcher
            .reserve_longpress_action(action, action.duration.delay(), now);
    }

    pub fn end_longpress_action(&mut self, action: &LongpressAction) {
        self.dispatcher.end_longpress_action(action);
    }

    pub fn complete_candidate(&mut self, candidate: Candidate) {
        self.dispatcher.complete_candidate(candidate);
    }

    pub fn notify_something_will_change(&mut self, before: SurroundingText) {
        self.dispatcher.notify_something_will_change(before);
    }

    pub fn notify_something_did_change(&mut self, after: SurroundingText) -> Option<TextChange> {
        self.dispatcher.notify_something_did_change(after)
    }

    pub fn state(&self) -> &KeyboardState {
        self.dispatcher.state()
    }

    pub fn state_mut(&mut self) -> &mut KeyboardState {
        self.dispatcher.state_mut()
    }

    pub fn editor(&self) -> &E {
        self.dispatcher.editor()
    }

    pub fn editor_mut(&mut self) -> &mut E {
        self.dispatcher.editor_mut()
    }

    pub fn dispatcher(&self) -> &ActionDispatcher<E> {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut ActionDispatcher<E> {
        &mut self.dispatcher
    }

    pub fn take_effects(&mut self) -> Vec<Effect> {
        self.dispatcher.take_effects()
    }

    /// Tear the keyboard down: every touch is cancelled and no timer
    /// survives.
    pub fn close_keyboard(&mut self) {
        let ids: Vec<KeyId> = self.keys.keys().cloned().collect();
        for id in &ids {
            self.touch_cancel(id);
        }
        self.gesture_timers.clear();
        self.dispatcher.close_keyboard();
    }
}
