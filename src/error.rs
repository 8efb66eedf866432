use thiserror::Error;

#[derive(Error, Debug)]
pub enum ButtonError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GPIO error: {0}")]
    Gpio(String),

    #[error("Bus error: {0}")]
    Bus(String),
}

impl From<lapin::Error> for ButtonError {
    fn from(error: lapin::Error) -> Self {
        ButtonError::Bus(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ButtonError>;
