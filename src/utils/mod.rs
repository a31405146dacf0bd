//! Utility modules

pub mod error;

pub use error::{
    ContextError, DiscoveryError, ErrorKind, FramingError, NodeFormatError, ResponseLine, Result,
    TransportError,
};
