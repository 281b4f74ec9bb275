use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum KinematicsError {
    #[error("division by zero: {0} is zero")]
    DivisionByZero(&'static str),
    #[error("invalid distance: {0} m")]
    InvalidDistance(f64),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("invalid target: {0}")]
    InvalidTarget(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("bad response: {0}")]
    BadResponse(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum NavError {
    #[error("kinematics error: {0}")]
    Kinematics(#[from] KinematicsError),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid state: {0}")]
    State(String),
    #[error("vision error: {0}")]
    Vision(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing dispatcher")]
    MissingDispatch,
    #[error("missing config provider")]
    MissingConfig,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
