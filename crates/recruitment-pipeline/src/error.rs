use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::recruitment::sandbox::{SandboxError, SeedError};
use crate::workflows::recruitment::{BindingError, ClientError};
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Client(ClientError),
    Binding(BindingError),
    Sandbox(SandboxError),
    Seed(SeedError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Client(err) => write!(f, "pipeline error: {}", err),
            AppError::Binding(err) => write!(f, "view error: {}", err),
            AppError::Sandbox(err) => write!(f, "sandbox error: {}", err),
            AppError::Seed(err) => write!(f, "seed error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Client(err) => Some(err),
            AppError::Binding(err) => Some(err),
            AppError::Sandbox(err) => Some(err),
            AppError::Seed(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ClientError> for AppError {
    fn from(value: ClientError) -> Self {
        Self::Client(value)
    }
}

impl From<BindingError> for AppError {
    fn from(value: BindingError) -> Self {
        Self::Binding(value)
    }
}

impl From<SandboxError> for AppError {
    fn from(value: SandboxError) -> Self {
        Self::Sandbox(value)
    }
}

impl From<SeedError> for AppError {
    fn from(value: SeedError) -> Self {
        Self::Seed(value)
    }
}
