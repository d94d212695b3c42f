//! Error types for the session, classifier, report and delivery seams
//!
//! Orchestration code (HTTP handlers, CLI) works in `anyhow::Result` and adds
//! context; the enums here are what the narrow interfaces hand back.

use thiserror::Error;

/// Errors raised by a video session or its aggregator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The session was ended; no further frames are accepted
    #[error("Session has ended")]
    Ended,

    /// Sampling policy could not be built from the supplied values
    #[error("Invalid sampling policy: {message}")]
    InvalidPolicy {
        /// Error message
        message: String,
    },

    /// The transport asked to reconnect more often than allowed
    #[error("Reconnect limit reached: attempt {attempts} exceeds maximum of {max}")]
    ReconnectLimit {
        /// Attempt number that was rejected
        attempts: u32,
        /// Configured maximum
        max: u32,
    },
}

/// Failure of a single classifier invocation
///
/// The aggregator treats every variant identically (last-known-good label is
/// kept); the distinction only matters for logs and stats.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassificationError {
    /// Classifier ran but found no face in the frame
    #[error("No face found in frame")]
    NoFace,

    /// Frame could not be handed to the classifier
    #[error("Invalid frame: {reason}")]
    InvalidInput {
        /// Failure reason
        reason: String,
    },

    /// Classifier service failed (transport, timeout, bad reply)
    #[error("Classifier error: {message}")]
    Internal {
        /// Error message
        message: String,
    },
}

/// Report rendering failures
#[derive(Error, Debug)]
pub enum ReportError {
    /// I/O operation failed while writing the report
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// PDF backend rejected the document
    #[error("Rendering failed: {message}")]
    Render {
        /// Error message
        message: String,
    },
}

/// Report delivery failures
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// Recipient address did not parse
    #[error("Invalid recipient address {address}: {reason}")]
    InvalidRecipient {
        /// Address as supplied
        address: String,
        /// Parser message
        reason: String,
    },

    /// Secret referenced by configuration is not present in the environment
    #[error("Missing credentials: environment variable {variable} is not set")]
    MissingCredentials {
        /// Environment variable name
        variable: String,
    },

    /// Message could not be assembled
    #[error("Failed to build message: {reason}")]
    Message {
        /// Failure reason
        reason: String,
    },

    /// SMTP transport failed
    #[error("Transport error: {reason}")]
    Transport {
        /// Failure reason
        reason: String,
    },
}
