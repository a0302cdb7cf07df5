use thiserror::Error;

use crate::wizard::{FieldErrors, Step};

/// Errors returned by the REST backend client.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Transport(String),
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("Invalid response: {0}")]
    Decode(String),
    #[error("Not signed in")]
    Unauthenticated,
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

/// Errors raised by a collection actor or its client.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("An update for {0} is already in progress")]
    MutationInFlight(String),
    #[error("Index {index} out of range for list of {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

/// Errors surfaced by board actions.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BoardError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Cannot move from {from} to {to}")]
    InvalidTransition { from: String, to: String },
    #[error("{0}")]
    Invalid(FieldErrors),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum WizardError {
    #[error("{0}")]
    Validation(FieldErrors),
    #[error("Registration can only be submitted from the final step (currently on {0})")]
    NotOnFinalStep(Step),
    #[error("Could not encode {field}: {reason}")]
    Encode { field: &'static str, reason: String },
    #[error("Registration failed: {0}")]
    Submit(ApiError),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuthError {
    #[error("Identity provider error: {0}")]
    Provider(String),
    #[error("Signed-in account is a {actual} account, expected {expected}")]
    WrongRole { expected: String, actual: String },
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Session cache error: {0}")]
    Cache(String),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
