pub mod button;
pub mod config;
pub mod error;
pub mod runtime;
pub mod util;

pub use config::ButtonConfig;
pub use runtime::{Runtime, RunSummary};
