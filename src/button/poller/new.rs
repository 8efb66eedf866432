use std::time::Duration;

use crate::button::{ButtonStateMachine, EventPublisher};
use crate::util::io::gpio::GpioInput;

use super::Poller;

impl<G: GpioInput> Poller<G> {
    pub fn new(
        gpio: G,
        machine: ButtonStateMachine,
        publisher: EventPublisher,
        interval: Duration,
    ) -> Self {
        Self {
            gpio,
            machine,
            publisher,
            interval,
        }
    }
}
