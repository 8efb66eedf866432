use std::time::Duration;
use tokio::time::Instant;

mod new;
mod on_sample;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Idle,
    /// Rising edge seen at `since`.
    Pressed { since: Instant },
}

/// Turns raw line samples into press events. Owned by the polling loop only.
#[derive(Debug)]
pub struct ButtonStateMachine {
    state: ButtonState,
    button_name: String,
    min_press: Duration,
}

impl ButtonStateMachine {
    pub fn state(&self) -> ButtonState {
        self.state
    }

    pub fn is_pressed(&self) -> bool {
        matches!(self.state, ButtonState::Pressed { .. })
    }

    pub fn button_name(&self) -> &str {
        &self.button_name
    }
}
