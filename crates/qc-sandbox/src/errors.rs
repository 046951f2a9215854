//! # Error Types
//!
//! All error types for the ledger sandbox.

use crate::domain::value_objects::{Address, Hash};
use thiserror::Error;

// =============================================================================
// SANDBOX ERRORS
// =============================================================================

/// Errors returned by simulator operations.
#[derive(Debug, Error, Clone)]
pub enum SandboxError {
    /// An external-out message was submitted for delivery.
    #[error("external-out messages cannot be sent")]
    InvalidMessageKind,

    /// Contract descriptor carries a malformed address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Contract descriptor carries malformed init code.
    #[error("invalid init.code: {0}")]
    InvalidInitCode(CellError),

    /// Contract descriptor carries malformed init data.
    #[error("invalid init.data: {0}")]
    InvalidInitData(CellError),

    /// A drain is already running on this instance.
    #[error("message queue is already being drained")]
    DrainInProgress,

    /// Queue refused another message.
    #[error("message queue is full: limit {limit}")]
    QueueFull { limit: usize },

    /// Another clock step would overflow the logical time.
    #[error("logical clock exhausted at lt {lt}")]
    ClockExhausted { lt: u64 },

    /// Get-method returned a failure exit code.
    #[error("get-method {method} failed with exit code {exit_code}")]
    Query { method: String, exit_code: i32 },

    /// Get-method succeeded but its stack has an unexpected shape.
    #[error("unexpected get-method result: {0}")]
    UnexpectedResult(String),

    /// Cell construction or parsing failed.
    #[error("cell error: {0}")]
    Cell(#[from] CellError),

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Account store or executor failure, surfaced verbatim.
    #[error(transparent)]
    Account(#[from] AccountError),
}

impl SandboxError {
    /// Returns true for errors raised before any queue mutation.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidMessageKind
                | Self::InvalidAddress(_)
                | Self::InvalidInitCode(_)
                | Self::InvalidInitData(_)
        )
    }
}

// =============================================================================
// ACCOUNT ERRORS
// =============================================================================

/// Errors from the account store and the accounts it hands out.
#[derive(Debug, Error, Clone)]
pub enum AccountError {
    /// The state-transition unit failed.
    #[error("executor failure: {0}")]
    Executor(#[from] ExecutorError),

    /// Storage backend failure.
    #[error("storage failure: {0}")]
    Store(String),

    /// Account unknown to a store that does not create accounts lazily.
    #[error("account not found: {0}")]
    NotFound(Address),
}

// =============================================================================
// EXECUTOR ERRORS
// =============================================================================

/// Hard failures of the state-transition unit.
///
/// A contract rejecting a message is not an error; it yields an aborted
/// transaction. These errors abort the whole drain.
#[derive(Debug, Error, Clone)]
pub enum ExecutorError {
    /// Code hash not registered with the executor (get-methods only).
    #[error("no contract registered for code hash {0}")]
    UnknownCode(Hash),

    /// An inbound external message was not accepted by the account.
    #[error("external message to {address} not accepted, exit code {exit_code}")]
    ExternalNotAccepted { address: Address, exit_code: i32 },

    /// Get-method called on an account that is not active.
    #[error("get-method on non-active account {0}")]
    InactiveAccount(Address),

    /// Contract requested a fatal failure.
    #[error("fatal: {0}")]
    Fatal(String),

    /// Cell handling inside the executor failed.
    #[error("cell error: {0}")]
    Cell(#[from] CellError),
}

// =============================================================================
// CELL ERRORS
// =============================================================================

/// Errors building, parsing or validating cells.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CellError {
    /// Data exceeds the per-cell bit limit.
    #[error("too many bits: {bits} > {max}")]
    TooManyBits { bits: usize, max: usize },

    /// Refs exceed the per-cell limit.
    #[error("too many refs: {refs} > {max}")]
    TooManyRefs { refs: usize, max: usize },

    /// Declared bit length disagrees with data length.
    #[error("bit length {bits} does not match {bytes} data bytes")]
    BitLengthMismatch { bits: usize, bytes: usize },

    /// Tree deeper than allowed.
    #[error("cell depth exceeds {max}")]
    DepthExceeded { max: u16 },

    /// Read past the end of the data.
    #[error("cell underflow: wanted {wanted} bits, {left} left")]
    Underflow { wanted: usize, left: usize },

    /// Read past the last ref.
    #[error("cell ref underflow")]
    RefUnderflow,

    /// Address workchain cannot be serialized.
    #[error("address workchain out of range")]
    InvalidAddress,
}

// =============================================================================
// CONFIG ERRORS
// =============================================================================

/// Errors loading or validating [`crate::config::SandboxConfig`].
#[derive(Debug, Error, Clone)]
pub enum ConfigError {
    /// A field has an unusable value.
    #[error("invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// JSON could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),
}

// =============================================================================
// TESTS
// =============================================================================
