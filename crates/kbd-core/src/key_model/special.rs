use std::collections::BTreeMap;

use crate::action::{Action, BoolOperation, CharacterTypeChange, Feedback, LongpressAction};
use crate::flick::FlickDirection;
use crate::state::{EnterKeyState, KeyboardState, ReturnKeyType, IS_CAPS_LOCKED, IS_SHIFTED};

use super::{KeyModel, Variation, VariationSpace};

fn set_flag(key: &str, op: BoolOperation) -> Action {
    Action::SetBoolState {
        key: key.to_string(),
        op,
    }
}

/// Shift: tap cycles shift, double tap or hold engages caps lock.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShiftKeyModel;

impl KeyModel for ShiftKeyModel {
    fn press_actions(&self, state: &KeyboardState) -> Vec<Action> {
        let flags = &state.bool_states;
        if flags.is_caps_locked() {
            vec![set_flag(IS_CAPS_LOCKED, BoolOperation::Off)]
        } else if flags.is_shifted() {
            vec![set_flag(IS_SHIFTED, BoolOperation::Off)]
        } else {
            vec![set_flag(IS_SHIFTED, BoolOperation::On)]
        }
    }

    fn longpress_actions(&self, _state: &KeyboardState) -> LongpressAction {
        LongpressAction {
            start: vec![set_flag(IS_CAPS_LOCKED, BoolOperation::Toggle)],
            ..LongpressAction::NONE
        }
    }

    fn double_press_actions(&self, state: &KeyboardState) -> Vec<Action> {
        if state.bool_states.is_caps_locked() {
            Vec::new()
        } else {
            vec![set_flag(IS_CAPS_LOCKED, BoolOperation::On)]
        }
    }

    fn variation_space(&self, _state: &KeyboardState) -> VariationSpace {
        VariationSpace::None
    }

    fn feedback(&self, _state: &KeyboardState) -> Option<Feedback> {
        Some(Feedback::TabOrOtherKey)
    }
}

/// Enter confirms a pending composition, otherwise inserts a newline.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnterKeyModel;

impl KeyModel for EnterKeyModel {
    fn press_actions(&self, state: &KeyboardState) -> Vec<Action> {
        match state.enter_key_state {
            EnterKeyState::Complete => vec![Action::Enter],
            EnterKeyState::Return(_) => vec![Action::input("\n")],
        }
    }

    fn longpress_actions(&self, _state: &KeyboardState) -> LongpressAction {
        LongpressAction::NONE
    }

    fn variation_space(&self, _state: &KeyboardState) -> VariationSpace {
        VariationSpace::None
    }

    fn feedback(&self, state: &KeyboardState) -> Option<Feedback> {
        match state.enter_key_state {
            EnterKeyState::Return(ReturnKeyType::Default) => Some(Feedback::Click),
            _ => Some(Feedback::TabOrOtherKey),
        }
    }
}

/// Small-kana / dakuten key. The flick map is user-configurable.
#[derive(Debug, Clone, Default)]
pub struct KogakiKeyModel {
    pub flick: BTreeMap<FlickDirection, Variation>,
}

impl KogakiKeyModel {
    pub fn new(flick: BTreeMap<FlickDirection, Variation>) -> Self {
        Self { flick }
    }
}

impl KeyModel for KogakiKeyModel {
    fn press_actions(&self, _state: &KeyboardState) -> Vec<Action> {
        vec![Action::ChangeCharacterType {
            behavior: CharacterTypeChange::Default,
        }]
    }

    fn longpress_actions(&self, _state: &KeyboardState) -> LongpressAction {
        LongpressAction::NONE
    }

    fn variation_space(&self, _state: &KeyboardState) -> VariationSpace {
        VariationSpace::FourWay(self.flick.clone())
    }

    fn is_flickable(&self, direction: FlickDirection, _state: &KeyboardState) -> bool {
        self.flick.contains_key(&direction)
    }

    fn flick_sensitivity(&self, direction: FlickDirection, user_sensitivity: f64) -> f64 {
        direction.asymmetric_threshold(user_sensitivity)
    }

    fn feedback(&self, _state: &KeyboardState) -> Option<Feedback> {
        Some(Feedback::TabOrOtherKey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_cycles_through_flags() {
        let mut state = KeyboardState::default();
        assert_eq!(
            ShiftKeyModel.press_actions(&state),
            vec![set_flag(IS_SHIFTED, BoolOperation::On)]
        );
        state.bool_states.set(IS_SHIFTED, true);
        assert_eq!(
            ShiftKeyModel.press_actions(&state),
            vec![set_flag(IS_SHIFTED, BoolOperation::Off)]
        );
        assert_eq!(
            ShiftKeyModel.double_press_actions(&state),
            vec![set_flag(IS_CAPS_LOCKED, BoolOperation::On)]
        );
        state.bool_states.set(IS_CAPS_LOCKED, true);
        assert_eq!(
            ShiftKeyModel.press_actions(&state),
            vec![set_flag(IS_CAPS_LOCKED, BoolOperation::Off)]
        );
        assert!(ShiftKeyModel.double_press_actions(&state).is_empty());
        assert!(ShiftKeyModel.has_longpress_action(&state));
    }

    #[test]
    fn enter_depends_on_enter_state() {
        let mut state = KeyboardState::default();
        assert_eq!(EnterKeyModel.press_actions(&state), vec![Action::input("\n")]);
        assert_eq!(EnterKeyModel.feedback(&state), Some(Feedback::Click));
        state.enter_key_state = EnterKeyState::Return(ReturnKeyType::Search);
        assert_eq!(EnterKeyModel.feedback(&state), Some(Feedback::TabOrOtherKey));
        state.enter_key_state = EnterKeyState::Complete;
        assert_eq!(EnterKeyModel.press_actions(&state), vec![Action::Enter]);
        assert!(!EnterKeyModel.has_longpress_action(&state));
    }

    #[test]
    fn kogaki_flicks_only_where_configured() {
        let state = KeyboardState::default();
        let mut flick = BTreeMap::new();
        flick.insert(
            FlickDirection::Left,
            Variation::new(
                "゛",
                vec![Action::ChangeCharacterType {
                    behavior: CharacterTypeChange::Dakuten,
                }],
            ),
        );
        let key = KogakiKeyModel::new(flick);
        assert!(key.has_flick_variations(&state));
        assert!(key.is_flickable(FlickDirection::Left, &state));
        assert!(!key.is_flickable(FlickDirection::Top, &state));
        assert_eq!(key.flick_sensitivity(FlickDirection::Top, 2.0), 25.0);
    }
}
