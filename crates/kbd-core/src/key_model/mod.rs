//! Key capability models.
//!
//! A `KeyModel` tells the press lifecycle what a key can do in the current
//! keyboard state: its tap actions, long-press and double-press actions, and
//! which flick or linear variations it exposes. Concrete models are picked
//! when the layout is built, usually from a serialized [`KeySpec`].

mod general;
mod special;
mod spec;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::action::{Action, Feedback, LongpressAction};
use crate::flick::FlickDirection;
use crate::state::KeyboardState;

pub use general::{GeneralKeyModel, SimpleKeyModel};
pub use special::{EnterKeyModel, KogakiKeyModel, ShiftKeyModel};
pub use spec::{KeySpec, PressStyle};

/// One flick target: what a drag toward it types, and what holding it does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variation {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub press: Vec<Action>,
    #[serde(default)]
    pub longpress: LongpressAction,
}

impl Variation {
    pub fn new(label: impl Into<String>, press: Vec<Action>) -> Self {
        Self {
            label: label.into(),
            press,
            longpress: LongpressAction::NONE,
        }
    }

    pub fn with_longpress(mut self, longpress: LongpressAction) -> Self {
        self.longpress = longpress;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearVariation {
    #[serde(default)]
    pub label: String,
    pub actions: Vec<Action>,
}

impl LinearVariation {
    pub fn new(label: impl Into<String>, actions: Vec<Action>) -> Self {
        Self {
            label: label.into(),
            actions,
        }
    }
}

/// Where the linear picker sits relative to the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinearAnchor {
    #[default]
    Center,
    /// The picker grows leftward from the key (keys at the right edge).
    Left,
    /// The picker grows rightward from the key (keys at the left edge).
    Right,
}

impl LinearAnchor {
    /// Index of the variation under a horizontal offset `dx` from the
    /// touch-down point. `None` when there is nothing to select.
    pub fn selection_index(self, dx: f64, count: usize, geometry: KeyGeometry) -> Option<usize> {
        if count == 0 {
            return None;
        }
        let n = count as f64;
        let cell = geometry.width + geometry.spacing;
        let span = n * geometry.width + (n - 1.0) * geometry.spacing;
        let origin = match self {
            Self::Center => -span / 2.0,
            Self::Right => -geometry.width / 2.0,
            Self::Left => geometry.width / 2.0 - span,
        };
        let raw = ((dx - origin) / cell).floor();
        let clamped = raw.clamp(0.0, n - 1.0);
        Some(clamped as usize)
    }
}

/// Design metrics of a key, used to bucket horizontal drags.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyGeometry {
    pub width: f64,
    pub spacing: f64,
}

impl Default for KeyGeometry {
    fn default() -> Self {
        Self {
            width: 32.0,
            spacing: 6.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VariationSpace {
    #[default]
    None,
    FourWay(BTreeMap<FlickDirection, Variation>),
    Linear(Vec<LinearVariation>, LinearAnchor),
}

pub trait KeyModel: std::fmt::Debug {
    fn press_actions(&self, state: &KeyboardState) -> Vec<Action>;

    fn longpress_actions(&self, state: &KeyboardState) -> LongpressAction;

    fn double_press_actions(&self, _state: &KeyboardState) -> Vec<Action> {
        Vec::new()
    }

    fn variation_space(&self, state: &KeyboardState) -> VariationSpace;

    fn flick_variations(&self, state: &KeyboardState) -> BTreeMap<FlickDirection, Variation> {
        match self.variation_space(state) {
            VariationSpace::FourWay(map) => map,
            _ => BTreeMap::new(),
        }
    }

    fn linear_variations(&self, state: &KeyboardState) -> (Vec<LinearVariation>, LinearAnchor) {
        match self.variation_space(state) {
            VariationSpace::Linear(list, anchor) => (list, anchor),
            _ => (Vec::new(), LinearAnchor::Center),
        }
    }

    fn shows_tap_bubble(&self, _state: &KeyboardState) -> bool {
        false
    }

    fn is_flickable(&self, _direction: FlickDirection, _state: &KeyboardState) -> bool {
        false
    }

    /// Drag distance needed to commit to `direction`.
    fn flick_sensitivity(&self, direction: FlickDirection, user_sensitivity: f64) -> f64 {
        direction.asymmetric_threshold(user_sensitivity)
    }

    fn feedback(&self, state: &KeyboardState) -> Option<Feedback>;

    fn has_flick_variations(&self, state: &KeyboardState) -> bool {
        !self.flick_variations(state).is_empty()
    }

    fn has_linear_variations(&self, state: &KeyboardState) -> bool {
        !self.linear_variations(state).0.is_empty()
    }

    fn has_longpress_action(&self, state: &KeyboardState) -> bool {
        !self.longpress_actions(state).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GEOMETRY: KeyGeometry = KeyGeometry {
        width: 30.0,
        spacing: 10.0,
    };

    #[test]
    fn centered_picker_buckets() {
        // span = 3*30 + 2*10 = 110, origin = -55
        let idx = |dx| LinearAnchor::Center.selection_index(dx, 3, GEOMETRY);
        assert_eq!(idx(0.0), Some(1));
        assert_eq!(idx(-50.0), Some(0));
        assert_eq!(idx(30.0), Some(2));
        assert_eq!(idx(-500.0), Some(0));
        assert_eq!(idx(500.0), Some(2));
    }

    #[test]
    fn right_growing_picker_starts_at_key() {
        let idx = |dx| LinearAnchor::Right.selection_index(dx, 3, GEOMETRY);
        assert_eq!(idx(0.0), Some(0));
        assert_eq!(idx(30.0), Some(1));
        assert_eq!(idx(70.0), Some(2));
    }

    #[test]
    fn left_growing_picker_ends_at_key() {
        let idx = |dx| LinearAnchor::Left.selection_index(dx, 3, GEOMETRY);
        assert_eq!(idx(0.0), Some(2));
        assert_eq!(idx(-30.0), Some(1));
        assert_eq!(idx(-70.0), Some(0));
    }

    #[test]
    fn empty_picker_selects_nothing() {
        assert_eq!(LinearAnchor::Center.selection_index(0.0, 0, GEOMETRY), None);
        assert_eq!(LinearAnchor::Center.selection_index(99.0, 1, GEOMETRY), Some(0));
    }
}
