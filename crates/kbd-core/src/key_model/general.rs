use std::collections::BTreeMap;

use crate::action::{leading_feedback, Action, Feedback, LongpressAction};
use crate::flick::FlickDirection;
use crate::state::KeyboardState;

use super::{KeyModel, LinearAnchor, LinearVariation, Variation, VariationSpace};

/// Data-driven key exposing a flick map, a linear picker, or both.
#[derive(Debug, Clone, Default)]
pub struct GeneralKeyModel {
    pub label: String,
    pub press: Vec<Action>,
    pub longpress: LongpressAction,
    pub double_press: Vec<Action>,
    pub flick: BTreeMap<FlickDirection, Variation>,
    pub linear: Vec<LinearVariation>,
    pub anchor: LinearAnchor,
    pub shows_tap_bubble: bool,
    /// Use the same threshold in every direction instead of the
    /// reach-adjusted table.
    pub uniform_sensitivity: bool,
}

impl GeneralKeyModel {
    pub fn new(label: impl Into<String>, press: Vec<Action>) -> Self {
        Self {
            label: label.into(),
            press,
            ..Self::default()
        }
    }

    pub fn with_longpress(mut self, longpress: LongpressAction) -> Self {
        self.longpress = longpress;
        self
    }

    pub fn with_double_press(mut self, actions: Vec<Action>) -> Self {
        self.double_press = actions;
        self
    }

    pub fn with_flick(mut self, direction: FlickDirection, variation: Variation) -> Self {
        self.flick.insert(direction, variation);
        self
    }

    pub fn with_linear(mut self, variations: Vec<LinearVariation>, anchor: LinearAnchor) -> Self {
        self.linear = variations;
        self.anchor = anchor;
        self
    }
}

impl KeyModel for GeneralKeyModel {
    fn press_actions(&self, _state: &KeyboardState) -> Vec<Action> {
        self.press.clone()
    }

    fn longpress_actions(&self, _state: &KeyboardState) -> LongpressAction {
        self.longpress.clone()
    }

    fn double_press_actions(&self, _state: &KeyboardState) -> Vec<Action> {
        self.double_press.clone()
    }

    fn variation_space(&self, _state: &KeyboardState) -> VariationSpace {
        if !self.flick.is_empty() {
            VariationSpace::FourWay(self.flick.clone())
        } else if !self.linear.is_empty() {
            VariationSpace::Linear(self.linear.clone(), self.anchor)
        } else {
            VariationSpace::None
        }
    }

    // Both kinds are exposed independently of `variation_space`.
    fn flick_variations(&self, _state: &KeyboardState) -> BTreeMap<FlickDirection, Variation> {
        self.flick.clone()
    }

    fn linear_variations(&self, _state: &KeyboardState) -> (Vec<LinearVariation>, LinearAnchor) {
        (self.linear.clone(), self.anchor)
    }

    fn has_flick_variations(&self, _state: &KeyboardState) -> bool {
        !self.flick.is_empty()
    }

    fn has_linear_variations(&self, _state: &KeyboardState) -> bool {
        !self.linear.is_empty()
    }

    fn has_longpress_action(&self, _state: &KeyboardState) -> bool {
        !self.longpress.is_empty()
    }

    fn shows_tap_bubble(&self, _state: &KeyboardState) -> bool {
        self.shows_tap_bubble
    }

    fn is_flickable(&self, direction: FlickDirection, _state: &KeyboardState) -> bool {
        self.flick.contains_key(&direction)
    }

    fn flick_sensitivity(&self, direction: FlickDirection, user_sensitivity: f64) -> f64 {
        if self.uniform_sensitivity {
            FlickDirection::uniform_threshold(user_sensitivity)
        } else {
            direction.asymmetric_threshold(user_sensitivity)
        }
    }

    fn feedback(&self, state: &KeyboardState) -> Option<Feedback> {
        leading_feedback(&self.press, &state.bool_states)
    }
}

/// Tap-and-hold key without variations, driven by the simple key lifecycle.
#[derive(Debug, Clone, Default)]
pub struct SimpleKeyModel {
    pub label: String,
    pub press: Vec<Action>,
    pub longpress: LongpressAction,
}

impl SimpleKeyModel {
    pub fn new(label: impl Into<String>, press: Vec<Action>, longpress: LongpressAction) -> Self {
        Self {
            label: label.into(),
            press,
            longpress,
        }
    }
}

impl KeyModel for SimpleKeyModel {
    fn press_actions(&self, _state: &KeyboardState) -> Vec<Action> {
        self.press.clone()
    }

    fn longpress_actions(&self, _state: &KeyboardState) -> LongpressAction {
        self.longpress.clone()
    }

    fn variation_space(&self, _state: &KeyboardState) -> VariationSpace {
        VariationSpace::None
    }

    fn feedback(&self, state: &KeyboardState) -> Option<Feedback> {
        leading_feedback(&self.press, &state.bool_states)
    }
}
