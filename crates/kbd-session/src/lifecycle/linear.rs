use kbd_core::flick::Point;
use kbd_core::key_model::KeyModel;
use kbd_core::state::KeyboardState;
use kbd_core::timer::Timestamp;
use tracing::debug;

use super::{decide_outcome, GestureHost, GestureTimer, Outcome, PressLifecycle, PressState, Suggest};

impl PressLifecycle {
    pub(super) fn linear_down<H: GestureHost>(
        &mut self,
        model: &dyn KeyModel,
        host: &mut H,
        point: Point,
        now: Timestamp,
    ) {
        self.locked = None;
        host.feedback(model.feedback(host.state()));
        if model.shows_tap_bubble(host.state()) {
            self.suggest = Some(Suggest::TapBubble);
        }
        self.state = PressState::Started(now);
        self.origin = point;
        self.double_press.touch_down(now);

        let longpress = model.longpress_actions(host.state());
        if decide_outcome(model, host.state()) == Some(Outcome::Action) {
            host.reserve_longpress(&longpress);
        }
        host.schedule(GestureTimer::LinearLongPress, longpress.duration.delay());
    }

    pub(super) fn linear_longpress(&mut self, model: &dyn KeyModel, state: &KeyboardState) {
        if !self.state.is_active() || self.locked.is_some() {
            return;
        }
        let outcome = decide_outcome(model, state);
        debug!(?outcome, "linear long press");
        match outcome {
            Some(Outcome::LinearVariation) => {
                if model.has_linear_variations(state) {
                    self.state = PressState::LinearVariations(None);
                    self.suggest = Some(Suggest::Linear(None));
                } else {
                    self.state = PressState::LongPressed;
                }
            }
            Some(Outcome::Action) => self.state = PressState::LongPressed,
            Some(Outcome::AllFlickSuggest) => {
                if model.has_flick_variations(state) {
                    self.suggest = Some(Suggest::FlickAll);
                }
                self.state = PressState::LongPressed;
            }
            // Nothing to hold for; the release still counts as a tap.
            None => {}
        }
        self.locked = outcome;
    }

    pub(super) fn linear_move<H: GestureHost>(
        &mut self,
        model: &dyn KeyModel,
        host: &mut H,
        point: Point,
    ) {
        if let PressState::LinearVariations(current) = self.state {
            let (variations, anchor) = model.linear_variations(host.state());
            let selection =
                anchor.selection_index(point.x - self.origin.x, variations.len(), self.geometry);
            if selection != current {
                debug!(?selection, "linear selection");
            }
            self.state = PressState::LinearVariations(selection);
            self.suggest = Some(Suggest::Linear(selection));
        }
    }

    pub(super) fn linear_up<H: GestureHost>(
        &mut self,
        model: &dyn KeyModel,
        host: &mut H,
        now: Timestamp,
    ) {
        self.double_press.touch_up(now);
        let longpress = model.longpress_actions(host.state());
        host.end_longpress(&longpress);
        self.suggest = None;
        host.cancel(GestureTimer::LinearLongPress);

        match self.state {
            PressState::Started(started) => {
                let double = model.double_press_actions(host.state());
                if !double.is_empty() && self.double_press.second_press_completed() {
                    debug!("double press");
                    host.register_actions(double);
                    self.double_press.reset();
                } else {
                    let tap = now.since(started) < longpress.duration.delay()
                        || decide_outcome(model, host.state()).is_none();
                    if tap {
                        host.register_actions(model.press_actions(host.state()));
                    }
                }
            }
            PressState::LinearVariations(selection) => {
                let actions = self.linear_selection_actions(model, host.state(), selection);
                host.register_actions(actions);
            }
            _ => {}
        }

        for timer in GestureTimer::ALL {
            host.cancel(timer);
        }
        self.reset();
    }
}
