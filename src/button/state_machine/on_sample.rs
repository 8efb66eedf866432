use tokio::time::Instant;

use crate::button::PressEvent;
use crate::error::Result;
use crate::log_debug;

use super::{ButtonState, ButtonStateMachine};

impl ButtonStateMachine {
    /// Feed one tick. A failed read leaves the state untouched.
    pub fn on_sample(&mut self, sample: Result<bool>, now: Instant) -> Option<PressEvent> {
        let pressed = match sample {
            Ok(level) => level,
            Err(e) => {
                log_debug!("[{}] skipping tick: {}", self.button_name, e);
                return None;
            }
        };

        match (pressed, self.state) {
            (true, ButtonState::Idle) => {
                self.state = ButtonState::Pressed { since: now };
                log_debug!("[{}] rising edge", self.button_name);
                None
            }
            (false, ButtonState::Pressed { since }) => {
                self.state = ButtonState::Idle;
                let held = now.saturating_duration_since(since);

                if held < self.min_press {
                    log_debug!(
                        "[{}] press of {} ms below threshold, ignored",
                        self.button_name,
                        held.as_millis()
                    );
                    return None;
                }

                Some(PressEvent {
                    duration_millis: u64::try_from(held.as_millis()).unwrap_or(u64::MAX),
                    button_name: self.button_name.clone(),
                })
            }
            _ => None,
        }
    }
}
