use std::time::Duration;

use super::{ButtonState, ButtonStateMachine};

impl ButtonStateMachine {
    pub fn new(button_name: impl Into<String>) -> Self {
        Self::with_min_press(button_name, Duration::ZERO)
    }

    /// Presses shorter than `min_press` complete silently.
    pub fn with_min_press(button_name: impl Into<String>, min_press: Duration) -> Self {
        Self {
            state: ButtonState::Idle,
            button_name: button_name.into(),
            min_press,
        }
    }
}
