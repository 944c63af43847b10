//! src/error.rs
//! ============================================================================
//! # Error types for the event registry
//!
//! Two families of failures exist:
//!
//! - [`RegistryError`]: structural problems found while registering or
//!   unregistering a listener (and config I/O). These reach the caller.
//! - [`HandlerFailure`]: a handler that returned an error or panicked while an
//!   event was dispatched. These are logged and never reach the caller of
//!   `fire`.

use std::any::Any;

use thiserror::Error;

use crate::event::EventType;

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors surfaced by registration, unregistration and config handling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A declared handler does not take exactly one event parameter.
    #[error("handler must take exactly one parameter: {listener}::{handler} declares {found}")]
    ParameterArity {
        listener: &'static str,
        handler: &'static str,
        found: usize,
    },

    /// A declared handler takes the base event type instead of a concrete kind.
    #[error("handler parameter must be a concrete event type: {listener}::{handler} takes {found}")]
    InvalidEventType {
        listener: &'static str,
        handler: &'static str,
        found: &'static str,
    },

    /// Registry configuration could not be read, parsed or written.
    #[error("Registry configuration error: {0}")]
    Config(String),
}

impl RegistryError {
    /// Short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistryError::ParameterArity { .. } => "parameter_arity",
            RegistryError::InvalidEventType { .. } => "invalid_event_type",
            RegistryError::Config(_) => "config",
        }
    }

    pub(crate) fn parameter_arity(
        listener: &'static str,
        handler: &'static str,
        found: usize,
    ) -> Self {
        Self::ParameterArity {
            listener,
            handler,
            found,
        }
    }

    pub(crate) fn invalid_event_type(
        listener: &'static str,
        handler: &'static str,
        found: EventType,
    ) -> Self {
        Self::InvalidEventType {
            listener,
            handler,
            found: found.name(),
        }
    }
}

/// Why a single handler invocation did not complete.
#[derive(Debug, Error)]
pub enum HandlerFailure {
    /// The handler returned an error.
    #[error("handler returned an error: {0:#}")]
    Error(#[from] anyhow::Error),

    /// The handler panicked; the payload message is kept when it is a string.
    #[error("handler panicked: {0}")]
    Panicked(String),

    /// The binding received an event or listener of an unexpected type.
    #[error("handler expected {expected}, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

impl HandlerFailure {
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerFailure::Error(_) => "handler_error",
            HandlerFailure::Panicked(_) => "handler_panicked",
            HandlerFailure::TypeMismatch { .. } => "handler_type_mismatch",
        }
    }

    /// Build a failure from a `catch_unwind` payload.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let info: String = if let Some(msg) = payload.downcast_ref::<&'static str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "unknown panic".to_string()
        };

        Self::Panicked(info)
    }
}
