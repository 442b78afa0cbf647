//! Error types and the process-wide error side channel.
//!
//! Every fallible operation returns [`Result`]. In addition, entry points that
//! parse, decode or construct values call [`report`] on failure, which records
//! the [`ErrorCode`] in a process-wide errno and forwards the message to an
//! optional handler installed with [`set_error_handler`]. The handler is for
//! logging and telemetry only; callers must still inspect the returned
//! `Result`.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicI32, Ordering};
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ChronotopeError>;

/// Errors raised by the value algebra.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChronotopeError {
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Value out of range: {0}")]
    OutOfRange(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Memory allocation failed: {0}")]
    MemoryAlloc(String),

    #[error("Aggregation error: {0}")]
    Aggregation(String),

    #[error("Invalid argument: {0}")]
    InvalidArg(String),

    #[error("Invalid argument type: {0}")]
    InvalidArgType(String),

    #[error("Invalid argument value: {0}")]
    InvalidArgValue(String),

    #[error("Feature not supported: {0}")]
    FeatureNotSupported(String),

    #[error("Invalid text input: {0}")]
    TextInput(String),

    #[error("Invalid WKB input: {0}")]
    WkbInput(String),

    #[error("WKB output error: {0}")]
    WkbOutput(String),
}

/// Numeric error codes, stable across releases.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Success = 0,
    InternalError = 1,
    InternalTypeError = 2,
    ValueOutOfRange = 3,
    DivisionByZero = 4,
    MemoryAllocError = 5,
    AggregationError = 6,
    InvalidArg = 10,
    InvalidArgType = 11,
    InvalidArgValue = 12,
    FeatureNotSupported = 13,
    TextInput = 22,
    TextOutput = 23,
    WkbInput = 24,
    WkbOutput = 25,
}

impl ErrorCode {
    fn from_i32(code: i32) -> Self {
        match code {
            1 => Self::InternalError,
            2 => Self::InternalTypeError,
            3 => Self::ValueOutOfRange,
            4 => Self::DivisionByZero,
            5 => Self::MemoryAllocError,
            6 => Self::AggregationError,
            10 => Self::InvalidArg,
            11 => Self::InvalidArgType,
            12 => Self::InvalidArgValue,
            13 => Self::FeatureNotSupported,
            22 => Self::TextInput,
            23 => Self::TextOutput,
            24 => Self::WkbInput,
            25 => Self::WkbOutput,
            _ => Self::Success,
        }
    }
}

/// Severity passed to the error handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorLevel {
    Notice,
    Warning,
    Error,
}

impl ChronotopeError {
    /// The stable numeric code of this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Internal(_) => ErrorCode::InternalError,
            Self::OutOfRange(_) => ErrorCode::ValueOutOfRange,
            Self::DivisionByZero => ErrorCode::DivisionByZero,
            Self::MemoryAlloc(_) => ErrorCode::MemoryAllocError,
            Self::Aggregation(_) => ErrorCode::AggregationError,
            Self::InvalidArg(_) => ErrorCode::InvalidArg,
            Self::InvalidArgType(_) => ErrorCode::InvalidArgType,
            Self::InvalidArgValue(_) => ErrorCode::InvalidArgValue,
            Self::FeatureNotSupported(_) => ErrorCode::FeatureNotSupported,
            Self::TextInput(_) => ErrorCode::TextInput,
            Self::WkbInput(_) => ErrorCode::WkbInput,
            Self::WkbOutput(_) => ErrorCode::WkbOutput,
        }
    }
}

/// Callback invoked for every reported error.
pub type ErrorHandler = Box<dyn Fn(ErrorLevel, ErrorCode, &str) + Send + Sync>;

static ERROR_HANDLER: Lazy<RwLock<Option<ErrorHandler>>> = Lazy::new(|| RwLock::new(None));
static ERRNO: AtomicI32 = AtomicI32::new(0);

/// Install the process-wide error handler, replacing any previous one.
pub fn set_error_handler<F>(handler: F)
where
    F: Fn(ErrorLevel, ErrorCode, &str) + Send + Sync + 'static,
{
    *ERROR_HANDLER.write() = Some(Box::new(handler));
}

/// Remove the process-wide error handler.
pub fn clear_error_handler() {
    *ERROR_HANDLER.write() = None;
}

/// Code of the last reported error, `ErrorCode::Success` if none.
pub fn errno() -> ErrorCode {
    ErrorCode::from_i32(ERRNO.load(Ordering::Acquire))
}

/// Reset the errno and return its previous value.
pub fn errno_reset() -> ErrorCode {
    ErrorCode::from_i32(ERRNO.swap(0, Ordering::AcqRel))
}

/// Record an error in the side channel: errno, log and handler.
pub fn report(err: &ChronotopeError) {
    let code = err.code();
    ERRNO.store(code as i32, Ordering::Release);
    log::debug!("chronotope error {:?}: {}", code, err);

    if let Some(handler) = ERROR_HANDLER.read().as_ref() {
        handler(ErrorLevel::Error, code, &err.to_string());
    }
}

/// Report the error of a failed result on its way out.
pub trait ReportExt {
    #[must_use]
    fn reported(self) -> Self;
}

impl<T> ReportExt for Result<T> {
    fn reported(self) -> Self {
        if let Err(e) = &self {
            report(e);
        }
        self
    }
}
