mod linear;
mod proptest_fsm;

use kbd_core::action::{Action, LongpressAction, LongpressDuration};
use kbd_core::flick::FlickDirection;
use kbd_core::key_model::{
    EnterKeyModel, GeneralKeyModel, LinearAnchor, LinearVariation, ShiftKeyModel, SimpleKeyModel,
    Variation,
};
use kbd_core::timer::Timestamp;

pub(super) fn at(ms: u64) -> Timestamp {
    Timestamp::from_millis(ms)
}

/// あ-row flick key: あ on tap, い/う/え/お on left/top/right/bottom.
pub(super) fn kana_key() -> GeneralKeyModel {
    GeneralKeyModel::new("あ", vec![Action::input("あ")])
        .with_flick(FlickDirection::Left, Variation::new("い", vec![Action::input("い")]))
        .with_flick(FlickDirection::Top, Variation::new("う", vec![Action::input("う")]))
        .with_flick(FlickDirection::Right, Variation::new("え", vec![Action::input("え")]))
        .with_flick(FlickDirection::Bottom, Variation::new("お", vec![Action::input("お")]))
}

/// Flick key with a long-press on the key and on its top variation.
pub(super) fn kana_key_with_longpress() -> GeneralKeyModel {
    GeneralKeyModel::new("か", vec![Action::input("か")])
        .with_longpress(LongpressAction::new(
            LongpressDuration::Normal,
            vec![Action::input("カ")],
            vec![],
        ))
        .with_flick(FlickDirection::Left, Variation::new("き", vec![Action::input("き")]))
        .with_flick(
            FlickDirection::Top,
            Variation::new("く", vec![Action::input("く")]).with_longpress(LongpressAction::new(
                LongpressDuration::Light,
                vec![Action::input("ク")],
                vec![],
            )),
        )
}

/// Latin key with accented variations and a long-press action, which the
/// variations outrank.
pub(super) fn accent_key() -> GeneralKeyModel {
    GeneralKeyModel::new("a", vec![Action::input("a")])
        .with_longpress(LongpressAction::new(
            LongpressDuration::Normal,
            vec![Action::input("A")],
            vec![],
        ))
        .with_linear(
            vec![
                LinearVariation::new("a", vec![Action::input("a")]),
                LinearVariation::new("à", vec![Action::input("à")]),
                LinearVariation::new("á", vec![Action::input("á")]),
            ],
            LinearAnchor::Center,
        )
}

pub(super) fn plain_key(text: &str) -> GeneralKeyModel {
    GeneralKeyModel::new(text, vec![Action::input(text)])
}

pub(super) fn delete_key() -> SimpleKeyModel {
    SimpleKeyModel::new(
        "⌫",
        vec![Action::delete(1)],
        LongpressAction::new(LongpressDuration::Normal, vec![], vec![Action::delete(1)]),
    )
}

pub(super) fn shift_key() -> ShiftKeyModel {
    ShiftKeyModel
}

pub(super) fn enter_key() -> EnterKeyModel {
    EnterKeyModel
}
