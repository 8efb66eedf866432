//! Press detection and the two loops that run for the life of the process.

pub mod command;
pub mod poller;
pub mod publisher;
pub mod state_machine;

pub use command::{CommandHandler, CommandIntake, DiscardCommands};
pub use poller::{PollSummary, Poller};
pub use publisher::EventPublisher;
pub use state_machine::{ButtonState, ButtonStateMachine};

/// One completed press. Published once, then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PressEvent {
    pub duration_millis: u64,
    pub button_name: String,
}

impl PressEvent {
    pub fn content_type(&self) -> String {
        press_content_type(&self.button_name)
    }
}

/// Content type that lets subscribers of the shared events topic tell buttons apart.
pub fn press_content_type(button_name: &str) -> String {
    format!("application/button_press_{}", button_name)
}
