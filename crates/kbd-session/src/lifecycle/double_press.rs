use kbd_core::settings::settings;
use kbd_core::timer::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DoublePressState {
    #[default]
    Inactive,
    FirstPressStarted,
    FirstPressCompleted,
    SecondPressStarted,
    SecondPressCompleted,
}

/// Recognizes two quick taps on the same key. Each press must be released
/// within `double_press.max_press_ms` and the second must start within
/// `double_press.max_gap_ms` of the first release.
#[derive(Debug, Clone, Default)]
pub struct DoublePressTracker {
    state: DoublePressState,
    updated_at: Timestamp,
}

impl DoublePressTracker {
    pub fn state(&self) -> DoublePressState {
        self.state
    }

    pub fn second_press_completed(&self) -> bool {
        self.state == DoublePressState::SecondPressCompleted
    }

    pub fn touch_down(&mut self, now: Timestamp) {
        use DoublePressState::*;
        self.state = match self.state {
            Inactive | FirstPressStarted | SecondPressStarted | SecondPressCompleted => FirstPressStarted,
            FirstPressCompleted => {
                if now.since(self.updated_at) > settings().double_press.max_gap() {
                    FirstPressStarted
                } else {
                    SecondPressStarted
                }
            }
        };
        self.updated_at = now;
    }

    pub fn touch_up(&mut self, now: Timestamp) {
        use DoublePressState::*;
        let within = now.since(self.updated_at) <= settings().double_press.max_press();
        self.state = match self.state {
            Inactive | FirstPressCompleted | SecondPressCompleted => Inactive,
            FirstPressStarted if within => FirstPressCompleted,
            SecondPressStarted if within => SecondPressCompleted,
            FirstPressStarted | SecondPressStarted => Inactive,
        };
        self.updated_at = now;
    }

    pub fn reset(&mut self) {
        self.state = DoublePressState::Inactive;
    }
}
