//! Tap-and-hold recognizer for keys without variations (delete, space,
//! mode switches). Dragging off the key cancels the hold.

use kbd_core::flick::Point;
use kbd_core::key_model::KeyModel;
use kbd_core::settings::settings;
use kbd_core::timer::Timestamp;
use tracing::{debug, debug_span};

use crate::lifecycle::GestureHost;

#[derive(Debug, Clone, Default)]
pub struct SimpleKeyLifecycle {
    pressed: bool,
    started_at: Option<Timestamp>,
    origin: Point,
    last_point: Point,
}

impl SimpleKeyLifecycle {
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn touch_down<H: GestureHost>(
        &mut self,
        model: &dyn KeyModel,
        host: &mut H,
        point: Point,
        now: Timestamp,
    ) {
        let _span = debug_span!("simple_touch_down", ?point, now = now.as_millis()).entered();
        self.pressed = true;
        self.started_at = Some(now);
        self.origin = point;
        self.last_point = point;
        host.feedback(model.feedback(host.state()));
        host.reserve_longpress(&model.longpress_actions(host.state()));
    }

    pub fn touch_move<H: GestureHost>(
        &mut self,
        model: &dyn KeyModel,
        host: &mut H,
        point: Point,
        now: Timestamp,
    ) {
        if self.started_at.is_none() {
            return;
        }
        self.last_point = point;
        if self.origin.distance(&point) > settings().gesture.simple_key_cancel_distance {
            if self.pressed {
                debug!(?point, "dragged off, hold cancelled");
            }
            self.pressed = false;
            self.started_at = Some(now);
            host.end_longpress(&model.longpress_actions(host.state()));
        }
    }

    pub fn touch_up<H: GestureHost>(
        &mut self,
        model: &dyn KeyModel,
        host: &mut H,
        point: Point,
        now: Timestamp,
    ) {
        let _span = debug_span!("simple_touch_up", ?point, now = now.as_millis()).entered();
        if point != self.last_point {
            self.touch_move(model, host, point, now);
        }
        let Some(started) = self.started_at.take() else {
            debug!("touch up without touch down, ignored");
            return;
        };
        self.pressed = false;
        let longpress = model.longpress_actions(host.state());
        host.end_longpress(&longpress);
        let quick = now.since(started) < longpress.duration.delay();
        let near = self.origin.distance(&point) < settings().gesture.simple_key_tap_max_distance;
        if quick && near {
            host.register_actions(model.press_actions(host.state()));
        }
    }

    pub fn touch_cancel<H: GestureHost>(&mut self, model: &dyn KeyModel, host: &mut H) {
        self.pressed = false;
        self.started_at = None;
        host.end_longpress(&model.longpress_actions(host.state()));
    }
}
