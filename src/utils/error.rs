//! Error types for memcache-discovery

use std::fmt;
use std::io;
use std::num::ParseIntError;

use thiserror::Error;

/// Top-level resolution error
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Framing error: {0}")]
    Framing(#[from] FramingError),

    #[error("Expected {expected} bytes in config payload, but got {actual} instead")]
    Consistency { expected: usize, actual: usize },

    #[error("Node format error: {0}")]
    NodeFormat(#[from] NodeFormatError),
}

/// Coarse classification of a [`DiscoveryError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Transport,
    Framing,
    Consistency,
    NodeFormat,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Config => "config",
            ErrorKind::Transport => "transport",
            ErrorKind::Framing => "framing",
            ErrorKind::Consistency => "consistency",
            ErrorKind::NodeFormat => "node-format",
        };
        f.write_str(name)
    }
}

impl DiscoveryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DiscoveryError::Config(_) => ErrorKind::Config,
            DiscoveryError::Transport(_) => ErrorKind::Transport,
            DiscoveryError::Framing(_) => ErrorKind::Framing,
            DiscoveryError::Consistency { .. } => ErrorKind::Consistency,
            DiscoveryError::NodeFormat(_) => ErrorKind::NodeFormat,
        }
    }

    /// Whether an immediate retry has a reasonable chance of succeeding.
    ///
    /// Transport failures and truncated payloads are usually transient;
    /// a peer that speaks the wrong protocol or advertises malformed
    /// members is not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DiscoveryError::Transport(_) | DiscoveryError::Consistency { .. }
        )
    }
}

/// Connection-level errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to resolve {address}: {source}")]
    Resolve { address: String, source: io::Error },

    #[error("No addresses found for {0}")]
    NoAddresses(String),

    #[error("Failed to connect to {address}: {source}")]
    Connect { address: String, source: io::Error },

    #[error("Failed to send config request: {0}")]
    Write(io::Error),

    #[error("Failed to read config response: {0}")]
    Read(io::Error),

    #[error("{0}")]
    Context(#[from] ContextError),
}

impl TransportError {
    /// Map a read failure, recovering deadline/cancellation errors raised
    /// by the guarded stream.
    pub fn from_read(err: io::Error) -> Self {
        let is_context = err
            .get_ref()
            .map(|inner| inner.is::<ContextError>())
            .unwrap_or(false);
        if !is_context {
            return TransportError::Read(err);
        }
        match err.into_inner().map(|inner| inner.downcast::<ContextError>()) {
            Some(Ok(ctx)) => TransportError::Context(*ctx),
            _ => TransportError::Read(io::Error::new(
                io::ErrorKind::Other,
                "context error lost",
            )),
        }
    }
}

/// Resolve-context expiry
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    #[error("operation deadline exceeded")]
    DeadlineExceeded,

    #[error("operation cancelled")]
    Cancelled,
}

impl From<ContextError> for io::Error {
    fn from(err: ContextError) -> Self {
        let kind = match err {
            ContextError::DeadlineExceeded => io::ErrorKind::TimedOut,
            // Not Interrupted: buffered readers retry those
            ContextError::Cancelled => io::ErrorKind::ConnectionAborted,
        };
        io::Error::new(kind, err)
    }
}

/// Line of the config response, for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseLine {
    Header,
    Version,
    Nodes,
}

impl fmt::Display for ResponseLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResponseLine::Header => "config metadata",
            ResponseLine::Version => "config version",
            ResponseLine::Nodes => "node list",
        };
        f.write_str(name)
    }
}

/// Response framing errors
#[derive(Error, Debug)]
pub enum FramingError {
    #[error("Failed to read {line}: line not terminated before end of stream")]
    Unreadable { line: ResponseLine },

    #[error("Config metadata exceeds {limit} bytes without a line terminator")]
    HeaderTooLong { limit: u64 },

    #[error("Invalid UTF-8 in {line}")]
    InvalidUtf8 { line: ResponseLine },

    #[error("Expected 4 components in config metadata, and received {count}, meta: {header}")]
    HeaderTokenCount { count: usize, header: String },

    #[error("Failed to parse config size from metadata: {header}, error: {source}")]
    InvalidPayloadSize {
        header: String,
        source: ParseIntError,
    },

    #[error("Failed to parse config version {raw:?}: {source}")]
    InvalidVersion { raw: String, source: ParseIntError },
}

/// Node entry errors
#[derive(Error, Debug)]
pub enum NodeFormatError {
    #[error("Node not in expected format (host|ip|port): {entry:?} has {fields} field(s)")]
    FieldCount { entry: String, fields: usize },

    #[error("Failed to parse port in node {entry:?}: {source}")]
    InvalidPort { entry: String, source: ParseIntError },

    #[error("Node {entry:?} has an empty {field}")]
    EmptyField { entry: String, field: &'static str },
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;
