use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::action::{Action, LongpressAction};
use crate::flick::FlickDirection;

use super::{
    EnterKeyModel, GeneralKeyModel, KeyModel, KogakiKeyModel, LinearAnchor, LinearVariation,
    ShiftKeyModel, SimpleKeyModel, Variation,
};

/// Which touch state machine drives a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressStyle {
    /// Flick and linear recognizers racing over one touch.
    Unified,
    /// Tap and hold only, cancelled by dragging off the key.
    Simple,
}

/// Serialized key description, e.g. in a layout or replay script:
///
/// ```toml
/// kind = "general"
/// label = "あ"
/// press = [{ type = "input", text = "あ" }]
/// flick.left = { label = "い", press = [{ type = "input", text = "い" }] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KeySpec {
    General {
        #[serde(default)]
        label: String,
        #[serde(default)]
        press: Vec<Action>,
        #[serde(default)]
        longpress: LongpressAction,
        #[serde(default)]
        double_press: Vec<Action>,
        #[serde(default)]
        flick: BTreeMap<FlickDirection, Variation>,
        #[serde(default)]
        linear: Vec<LinearVariation>,
        #[serde(default)]
        anchor: LinearAnchor,
        #[serde(default)]
        shows_tap_bubble: bool,
        #[serde(default)]
        uniform_sensitivity: bool,
    },
    Shift,
    Enter,
    Kogaki {
        #[serde(default)]
        flick: BTreeMap<FlickDirection, Variation>,
    },
    Simple {
        #[serde(default)]
        label: String,
        #[serde(default)]
        press: Vec<Action>,
        #[serde(default)]
        longpress: LongpressAction,
    },
}

impl KeySpec {
    pub fn press_style(&self) -> PressStyle {
        match self {
            Self::Simple { .. } => PressStyle::Simple,
            _ => PressStyle::Unified,
        }
    }

    pub fn build(&self) -> Box<dyn KeyModel> {
        match self {
            Self::General {
                label,
                press,
                longpress,
                double_press,
                flick,
                linear,
                anchor,
                shows_tap_bubble,
                uniform_sensitivity,
            } => Box::new(GeneralKeyModel {
                label: label.clone(),
                press: press.clone(),
                longpress: longpress.clone(),
                double_press: double_press.clone(),
                flick: flick.clone(),
                linear: linear.clone(),
                anchor: *anchor,
                shows_tap_bubble: *shows_tap_bubble,
                uniform_sensitivity: *uniform_sensitivity,
            }),
            Self::Shift => Box::new(ShiftKeyModel),
            Self::Enter => Box::new(EnterKeyModel),
            Self::Kogaki { flick } => Box::new(KogakiKeyModel::new(flick.clone())),
            Self::Simple {
                label,
                press,
                longpress,
            } => Box::new(SimpleKeyModel::new(label.clone(), press.clone(), longpress.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::LongpressDuration;
    use crate::state::KeyboardState;

    #[test]
    fn general_key_from_toml() {
        let spec: KeySpec = toml::from_str(
            r#"
kind = "general"
label = "あ"
press = [{ type = "input", text = "あ" }]
longpress = { duration = "light", start = [{ type = "input", text = "ぁ" }] }

[flick.left]
label = "い"
press = [{ type = "input", text = "い" }]

[flick.top]
label = "う"
press = [{ type = "input", text = "う" }]
"#,
        )
        .unwrap();
        assert_eq!(spec.press_style(), PressStyle::Unified);
        let key = spec.build();
        let state = KeyboardState::default();
        assert_eq!(key.press_actions(&state), vec![Action::input("あ")]);
        assert_eq!(key.longpress_actions(&state).duration, LongpressDuration::Light);
        assert!(key.is_flickable(FlickDirection::Left, &state));
        assert!(key.is_flickable(FlickDirection::Top, &state));
        assert!(!key.is_flickable(FlickDirection::Bottom, &state));
        assert_eq!(
            key.flick_variations(&state)[&FlickDirection::Top].press,
            vec![Action::input("う")]
        );
    }

    #[test]
    fn unit_and_simple_kinds() {
        let shift: KeySpec = toml::from_str(r#"kind = "shift""#).unwrap();
        assert_eq!(shift, KeySpec::Shift);
        let delete: KeySpec = toml::from_str(
            r#"
kind = "simple"
press = [{ type = "delete", count = 1 }]
longpress = { repeat = [{ type = "delete", count = 1 }] }
"#,
        )
        .unwrap();
        assert_eq!(delete.press_style(), PressStyle::Simple);
        let state = KeyboardState::default();
        assert!(delete.build().has_longpress_action(&state));
    }
}
