//! Per-key gesture recognizer.
//!
//! One touch on a unified key is observed by two handlers in a fixed order:
//! the flick handler (`flick.rs`), then the linear handler (`linear.rs`).
//! Which of them acts is decided by the key's capabilities and by the
//! outcome locked during the touch, so exactly one of them commits.
//!
//! The recognizer owns no timers and applies no actions itself. Everything
//! with an effect outside the key goes through [`GestureHost`], in the order
//! the handlers issue it.

mod double_press;
mod flick;
mod linear;

use std::time::Duration;

use kbd_core::action::{Action, Feedback, LongpressAction};
use kbd_core::flick::{FlickDirection, Point};
use kbd_core::key_model::{KeyGeometry, KeyModel};
use kbd_core::state::KeyboardState;
use kbd_core::timer::Timestamp;
use tracing::{debug, debug_span};

pub use double_press::{DoublePressState, DoublePressTracker};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PressState {
    #[default]
    Idle,
    Started(Timestamp),
    LongPressed,
    FlickOneSuggested(FlickDirection, Timestamp),
    LongFlicked(FlickDirection),
    LinearVariations(Option<usize>),
}

impl PressState {
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// What a touch resolves to once it is held long enough. Highest priority
/// first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    LinearVariation,
    Action,
    AllFlickSuggest,
}

/// Suggestion UI the key currently wants shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suggest {
    TapBubble,
    FlickAll,
    FlickOne(FlickDirection),
    Linear(Option<usize>),
}

/// Gesture timers. A key has at most one pending timer of each kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureTimer {
    FlickLongPress,
    LinearLongPress,
    AllFlickSuggest,
    SuggestDismiss,
}

impl GestureTimer {
    pub const ALL: [GestureTimer; 4] = [
        Self::FlickLongPress,
        Self::LinearLongPress,
        Self::AllFlickSuggest,
        Self::SuggestDismiss,
    ];
}

/// Side effects of a gesture, implemented by the session.
pub trait GestureHost {
    fn state(&self) -> &KeyboardState;

    fn feedback(&mut self, feedback: Option<Feedback>);

    fn register_actions(&mut self, actions: Vec<Action>);

    /// Start the long-press timers for `action` after its own duration.
    fn reserve_longpress(&mut self, action: &LongpressAction);

    fn end_longpress(&mut self, action: &LongpressAction);

    /// Schedule `timer` for this key, replacing a pending one of the same kind.
    fn schedule(&mut self, timer: GestureTimer, delay: Duration);

    fn cancel(&mut self, timer: GestureTimer);
}

/// Highest-priority outcome the key supports in the current state.
pub fn decide_outcome(model: &dyn KeyModel, state: &KeyboardState) -> Option<Outcome> {
    if model.has_linear_variations(state) {
        Some(Outcome::LinearVariation)
    } else if model.has_longpress_action(state) {
        Some(Outcome::Action)
    } else if model.has_flick_variations(state) {
        Some(Outcome::AllFlickSuggest)
    } else {
        None
    }
}

#[derive(Debug, Clone, Default)]
pub struct PressLifecycle {
    state: PressState,
    locked: Option<Outcome>,
    origin: Point,
    last_point: Point,
    double_press: DoublePressTracker,
    suggest: Option<Suggest>,
    geometry: KeyGeometry,
}

impl PressLifecycle {
    pub fn new(geometry: KeyGeometry) -> Self {
        Self {
            geometry,
            ..Self::default()
        }
    }

    pub fn state(&self) -> PressState {
        self.state
    }

    pub fn locked_outcome(&self) -> Option<Outcome> {
        self.locked
    }

    pub fn suggest(&self) -> Option<Suggest> {
        self.suggest
    }

    pub fn double_press(&self) -> &DoublePressTracker {
        &self.double_press
    }

    // The linear handler sits out for flick keys unless a linear picker
    // was opened by the flick long-press.
    fn linear_applies(&self, model: &dyn KeyModel, state: &KeyboardState) -> bool {
        !model.has_flick_variations(state)
            || self.locked == Some(Outcome::LinearVariation)
            || matches!(self.state, PressState::LinearVariations(_))
    }

    pub fn touch_down<H: GestureHost>(
        &mut self,
        model: &dyn KeyModel,
        host: &mut H,
        point: Point,
        now: Timestamp,
    ) {
        let _span = debug_span!("touch_down", ?point, now = now.as_millis()).entered();
        if self.state.is_active() {
            debug!(state = ?self.state, "touch down while active, ignored");
            return;
        }
        self.last_point = point;
        if model.has_flick_variations(host.state()) {
            self.flick_down(model, host, point, now);
        }
        if self.linear_applies(model, host.state()) {
            self.linear_down(model, host, point, now);
        }
    }

    pub fn touch_move<H: GestureHost>(
        &mut self,
        model: &dyn KeyModel,
        host: &mut H,
        point: Point,
        now: Timestamp,
    ) {
        if !self.state.is_active() {
            return;
        }
        self.last_point = point;
        if model.has_flick_variations(host.state()) {
            self.flick_move(model, host, point, now);
        }
        if self.linear_applies(model, host.state()) {
            self.linear_move(model, host, point);
        }
    }

    /// A release point that differs from the last move is treated as one
    /// more move before the release.
    pub fn touch_up<H: GestureHost>(
        &mut self,
        model: &dyn KeyModel,
        host: &mut H,
        point: Point,
        now: Timestamp,
    ) {
        let _span = debug_span!("touch_up", ?point, now = now.as_millis()).entered();
        if !self.state.is_active() {
            debug!("touch up without touch down, ignored");
            return;
        }
        if point != self.last_point {
            self.touch_move(model, host, point, now);
        }
        if model.has_flick_variations(host.state()) {
            self.flick_up(model, host, now);
        }
        if self.state.is_active() && self.linear_applies(model, host.state()) {
            self.linear_up(model, host, now);
        }
    }

    /// The touch was taken away (another gesture, view teardown). Nothing
    /// commits and no timer of this key survives.
    pub fn touch_cancel<H: GestureHost>(&mut self, model: &dyn KeyModel, host: &mut H) {
        let _span = debug_span!("touch_cancel", state = ?self.state).entered();
        for timer in GestureTimer::ALL {
            host.cancel(timer);
        }
        let longpress = model.longpress_actions(host.state());
        host.end_longpress(&longpress);
        if let PressState::FlickOneSuggested(direction, _) | PressState::LongFlicked(direction) =
            self.state
        {
            if let Some(variation) = model.flick_variations(host.state()).get(&direction) {
                host.end_longpress(&variation.longpress);
            }
        }
        self.suggest = None;
        self.double_press.reset();
        self.reset();
    }

    pub fn on_timer<H: GestureHost>(
        &mut self,
        timer: GestureTimer,
        model: &dyn KeyModel,
        host: &mut H,
        now: Timestamp,
    ) {
        let _span = debug_span!("gesture_timer", ?timer, state = ?self.state).entered();
        match timer {
            GestureTimer::FlickLongPress => self.commit_flick_longpress(model, host),
            GestureTimer::LinearLongPress => self.linear_longpress(model, host.state()),
            GestureTimer::AllFlickSuggest => {
                if matches!(self.state, PressState::Started(_))
                    && decide_outcome(model, host.state()) == Some(Outcome::AllFlickSuggest)
                {
                    self.suggest = Some(Suggest::FlickAll);
                }
            }
            GestureTimer::SuggestDismiss => self.suggest = None,
        }
        debug!(now = now.as_millis(), state = ?self.state, suggest = ?self.suggest, "timer handled");
    }

    /// Actions committed by releasing in `LinearVariations(selection)`.
    fn linear_selection_actions(
        &self,
        model: &dyn KeyModel,
        state: &KeyboardState,
        selection: Option<usize>,
    ) -> Vec<Action> {
        let (variations, _) = model.linear_variations(state);
        match selection {
            Some(index) if !variations.is_empty() => {
                let index = index.min(variations.len() - 1);
                variations[index].actions.clone()
            }
            _ => model.press_actions(state),
        }
    }

    fn reset(&mut self) {
        self.state = PressState::Idle;
        self.locked = None;
    }
}
