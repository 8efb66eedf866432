use std::time::Duration;

use crate::button::{ButtonStateMachine, EventPublisher};
use crate::util::io::gpio::GpioInput;

mod new;
mod run;

/// What one polling loop did before it was stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub ticks: u64,
    pub read_errors: u64,
    pub events: u64,
    pub dropped: u64,
}

/// Samples the line every `interval` and publishes completed presses.
pub struct Poller<G: GpioInput> {
    gpio: G,
    machine: ButtonStateMachine,
    publisher: EventPublisher,
    interval: Duration,
}

impl<G: GpioInput> std::fmt::Debug for Poller<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("machine", &self.machine)
            .field("publisher", &self.publisher)
            .field("interval", &self.interval)
            .finish()
    }
}
