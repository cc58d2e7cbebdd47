use kbd_core::flick::{FlickDirection, Point};
use kbd_core::key_model::KeyModel;
use kbd_core::settings::settings;
use kbd_core::timer::Timestamp;
use tracing::debug;

use super::{decide_outcome, GestureHost, GestureTimer, Outcome, PressLifecycle, PressState, Suggest};

impl PressLifecycle {
    pub(super) fn flick_down<H: GestureHost>(
        &mut self,
        model: &dyn KeyModel,
        host: &mut H,
        point: Point,
        now: Timestamp,
    ) {
        self.locked = None;
        host.cancel(GestureTimer::SuggestDismiss);
        host.cancel(GestureTimer::AllFlickSuggest);
        self.suggest = if model.shows_tap_bubble(host.state()) {
            Some(Suggest::TapBubble)
        } else {
            None
        };
        self.state = PressState::Started(now);
        self.origin = point;
        host.feedback(model.feedback(host.state()));

        let longpress = model.longpress_actions(host.state());
        if decide_outcome(model, host.state()) == Some(Outcome::Action) {
            host.reserve_longpress(&longpress);
        }
        host.schedule(
            GestureTimer::AllFlickSuggest,
            settings().gesture.all_flick_suggest_delay(),
        );
        host.schedule(GestureTimer::FlickLongPress, longpress.duration.delay());
    }

    /// The direction `point` drags toward, if the key flicks that way and
    /// the drag is past that direction's threshold.
    fn flick_target(
        &self,
        model: &dyn KeyModel,
        host: &impl GestureHost,
        point: Point,
    ) -> Option<FlickDirection> {
        let direction = self.origin.direction_to(&point);
        let threshold =
            model.flick_sensitivity(direction, settings().gesture.flick_sensitivity);
        (model.is_flickable(direction, host.state()) && self.origin.distance(&point) > threshold)
            .then_some(direction)
    }

    pub(super) fn flick_move<H: GestureHost>(
        &mut self,
        model: &dyn KeyModel,
        host: &mut H,
        point: Point,
        now: Timestamp,
    ) {
        let target = self.flick_target(model, &*host, point);
        let variations = model.flick_variations(host.state());
        match self.state {
            PressState::Started(started) => {
                if let Some(direction) = target {
                    debug!(?direction, "flick committed to direction");
                    host.cancel(GestureTimer::FlickLongPress);
                    self.suggest = Some(Suggest::FlickOne(direction));
                    self.state = PressState::FlickOneSuggested(direction, now);
                    host.cancel(GestureTimer::SuggestDismiss);
                    host.end_longpress(&model.longpress_actions(host.state()));
                    host.cancel(GestureTimer::AllFlickSuggest);
                    if let Some(variation) = variations.get(&direction) {
                        host.reserve_longpress(&variation.longpress);
                    }
                } else {
                    let duration = model.longpress_actions(host.state()).duration.delay();
                    if now.since(started) >= duration {
                        self.commit_flick_longpress(model, host);
                    }
                }
            }
            PressState::FlickOneSuggested(previous, since) => match target {
                Some(direction) if direction != previous => {
                    self.suggest = Some(Suggest::FlickOne(direction));
                    if let Some(variation) = variations.get(&previous) {
                        host.end_longpress(&variation.longpress);
                    }
                    self.state = PressState::FlickOneSuggested(direction, now);
                    if let Some(variation) = variations.get(&direction) {
                        host.reserve_longpress(&variation.longpress);
                    }
                }
                _ => {
                    let held_past = variations.get(&previous).is_some_and(|variation| {
                        now.since(since) >= variation.longpress.duration.delay()
                    });
                    if held_past {
                        self.state = PressState::LongFlicked(previous);
                    }
                }
            },
            PressState::LongFlicked(previous) => {
                if let Some(direction) = target.filter(|d| *d != previous) {
                    self.suggest = Some(Suggest::FlickOne(direction));
                    if let Some(variation) = variations.get(&previous) {
                        host.end_longpress(&variation.longpress);
                    }
                    self.state = PressState::FlickOneSuggested(direction, now);
                    if let Some(variation) = variations.get(&direction) {
                        host.reserve_longpress(&variation.longpress);
                    }
                }
            }
            PressState::LongPressed => {
                let showing_one = matches!(self.suggest, Some(Suggest::FlickOne(_)));
                if self.locked == Some(Outcome::AllFlickSuggest) && !showing_one {
                    if let Some(direction) = target {
                        self.suggest = Some(Suggest::FlickOne(direction));
                        self.state = PressState::FlickOneSuggested(direction, now);
                        host.end_longpress(&model.longpress_actions(host.state()));
                        host.cancel(GestureTimer::AllFlickSuggest);
                        if let Some(variation) = variations.get(&direction) {
                            host.reserve_longpress(&variation.longpress);
                        }
                    }
                }
            }
            PressState::Idle | PressState::LinearVariations(_) => {}
        }
    }

    /// Runs when the flick long-press timer fires, or on a move observed
    /// after the long-press duration. Only a touch still in `Started` is
    /// affected.
    pub(super) fn commit_flick_longpress<H: GestureHost>(
        &mut self,
        model: &dyn KeyModel,
        host: &mut H,
    ) {
        if !matches!(self.state, PressState::Started(_)) {
            return;
        }
        self.state = PressState::LongPressed;
        if self.locked.is_some() {
            return;
        }
        host.cancel(GestureTimer::AllFlickSuggest);
        let outcome = decide_outcome(model, host.state());
        debug!(?outcome, "flick long press");
        match outcome {
            Some(Outcome::LinearVariation) => {
                if model.has_linear_variations(host.state()) {
                    self.state = PressState::LinearVariations(None);
                    self.suggest = Some(Suggest::Linear(None));
                }
            }
            Some(Outcome::Action) | None => {}
            Some(Outcome::AllFlickSuggest) => self.suggest = Some(Suggest::FlickAll),
        }
        self.locked = outcome;
    }

    pub(super) fn flick_up<H: GestureHost>(
        &mut self,
        model: &dyn KeyModel,
        host: &mut H,
        now: Timestamp,
    ) {
        host.schedule(
            GestureTimer::SuggestDismiss,
            settings().gesture.suggest_dismiss_delay(),
        );
        let longpress = model.longpress_actions(host.state());
        let variations = model.flick_variations(host.state());
        match self.state {
            PressState::Started(started) if now.since(started) >= longpress.duration.delay() => {
                self.state = PressState::LongPressed;
            }
            PressState::FlickOneSuggested(direction, since) => {
                let held_past = variations.get(&direction).is_some_and(|variation| {
                    now.since(since) >= variation.longpress.duration.delay()
                });
                if held_past {
                    self.state = PressState::LongFlicked(direction);
                }
            }
            _ => {}
        }

        host.cancel(GestureTimer::FlickLongPress);
        host.end_longpress(&longpress);
        host.cancel(GestureTimer::AllFlickSuggest);
        if let PressState::FlickOneSuggested(direction, _) | PressState::LongFlicked(direction) =
            self.state
        {
            if let Some(variation) = variations.get(&direction) {
                host.end_longpress(&variation.longpress);
            }
        }

        let actions = match self.state {
            PressState::Started(_) => model.press_actions(host.state()),
            PressState::FlickOneSuggested(direction, _) => variations
                .get(&direction)
                .map(|variation| variation.press.clone())
                .unwrap_or_default(),
            PressState::LongFlicked(direction) => variations
                .get(&direction)
                .filter(|variation| variation.longpress.is_empty())
                .map(|variation| variation.press.clone())
                .unwrap_or_default(),
            PressState::LinearVariations(selection) => {
                self.linear_selection_actions(model, host.state(), selection)
            }
            PressState::LongPressed | PressState::Idle => Vec::new(),
        };
        debug!(state = ?self.state, ?actions, "flick released");
        if !actions.is_empty() {
            host.register_actions(actions);
        }
        self.double_press.reset();
        self.reset();
    }
}
