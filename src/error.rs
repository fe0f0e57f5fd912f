//! Error handling for the voice pool
//!
//! Every build failure propagates to the caller of the pool-build entry
//! point. Nothing here is retried: each variant is permanent for a given
//! attempt.

use thiserror::Error;

/// Result type alias for voice pool operations
pub type Result<T> = std::result::Result<T, VoicePoolError>;

/// Broad failure class of a [`VoicePoolError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid context, destination or option, reported before any allocation
    Configuration,
    /// The external voice-processing module could not be registered
    DependencyLoad,
    /// Buffer or node allocation failed
    ResourceAllocation,
    /// Malformed graph shape (filter bank, input counts, edges)
    Topology,
    /// File system access (config, module and WAV files)
    Io,
}

/// Main error type for voice pool operations
#[derive(Error, Debug)]
pub enum VoicePoolError {
    // Configuration Errors
    #[error("Invalid processing context: {reason}")]
    InvalidContext { reason: String },

    #[error("Invalid destination: {reason}")]
    InvalidDestination { reason: String },

    #[error("Invalid option '{option}': got {value}, expected {expected}")]
    InvalidOption {
        option: String,
        value: String,
        expected: String,
    },

    #[error("Voice pool already built (state: {state})")]
    AlreadyBuilt { state: String },

    // Dependency Errors
    #[error("Failed to register module '{module}': {reason}")]
    ModuleLoad { module: String, reason: String },

    #[error("Registering module '{module}' timed out after {timeout_ms}ms")]
    ModuleTimeout { module: String, timeout_ms: u64 },

    #[error("Processor '{processor}' is not registered")]
    ProcessorNotRegistered { processor: String },

    // Resource Errors
    #[error("Out of memory: {details}")]
    OutOfMemory { details: String },

    #[error("Node allocation failed: {details}")]
    NodeAllocation { details: String },

    // Topology Errors
    #[error("Filter bank has no frequencies")]
    EmptyFilterBank,

    #[error("Voice unit must declare exactly {expected} inputs, found {actual}")]
    InputCountMismatch { expected: usize, actual: usize },

    #[error("Invalid connection: {reason}")]
    InvalidConnection { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

impl VoicePoolError {
    /// Get the failure class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            VoicePoolError::InvalidContext { .. }
            | VoicePoolError::InvalidDestination { .. }
            | VoicePoolError::InvalidOption { .. }
            | VoicePoolError::AlreadyBuilt { .. }
            | VoicePoolError::Serialization(_) => ErrorKind::Configuration,
            VoicePoolError::ModuleLoad { .. }
            | VoicePoolError::ModuleTimeout { .. }
            | VoicePoolError::ProcessorNotRegistered { .. } => ErrorKind::DependencyLoad,
            VoicePoolError::OutOfMemory { .. } | VoicePoolError::NodeAllocation { .. } => {
                ErrorKind::ResourceAllocation
            }
            VoicePoolError::EmptyFilterBank
            | VoicePoolError::InputCountMismatch { .. }
            | VoicePoolError::InvalidConnection { .. } => ErrorKind::Topology,
            VoicePoolError::Io(_) | VoicePoolError::Wav(_) => ErrorKind::Io,
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            VoicePoolError::InvalidContext { .. } => "INVALID_CONTEXT",
            VoicePoolError::InvalidDestination { .. } => "INVALID_DESTINATION",
            VoicePoolError::InvalidOption { .. } => "INVALID_OPTION",
            VoicePoolError::AlreadyBuilt { .. } => "ALREADY_BUILT",
            VoicePoolError::ModuleLoad { .. } => "MODULE_LOAD",
            VoicePoolError::ModuleTimeout { .. } => "MODULE_TIMEOUT",
            VoicePoolError::ProcessorNotRegistered { .. } => "PROCESSOR_NOT_REGISTERED",
            VoicePoolError::OutOfMemory { .. } => "OUT_OF_MEMORY",
            VoicePoolError::NodeAllocation { .. } => "NODE_ALLOCATION",
            VoicePoolError::EmptyFilterBank => "EMPTY_FILTER_BANK",
            VoicePoolError::InputCountMismatch { .. } => "INPUT_COUNT_MISMATCH",
            VoicePoolError::InvalidConnection { .. } => "INVALID_CONNECTION",
            VoicePoolError::Io(_) => "IO_ERROR",
            VoicePoolError::Serialization(_) => "SERIALIZATION_ERROR",
            VoicePoolError::Wav(_) => "WAV_ERROR",
        }
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            VoicePoolError::InvalidContext { .. } => vec![
                "Create a fresh processing context with a non-zero sample rate",
                "A closed context cannot host a new voice pool",
            ],
            VoicePoolError::InvalidDestination { .. } => vec![
                "Pass a node created by the same context",
                "Omit the destination to use the context's primary output",
            ],
            VoicePoolError::InvalidOption { .. } => vec![
                "filter.f must be positive and strictly ascending",
                "filter.Q must be greater than zero",
            ],
            VoicePoolError::AlreadyBuilt { .. } => {
                vec!["Construct a new manager against a fresh context to rebuild"]
            }
            VoicePoolError::ModuleLoad { .. } | VoicePoolError::ModuleTimeout { .. } => vec![
                "Check that the voice processor module path is correct",
                "The voice processor is a hard dependency; the pool cannot be built without it",
            ],
            VoicePoolError::ProcessorNotRegistered { .. } => {
                vec!["Register the module declaring this processor before creating voices"]
            }
            VoicePoolError::OutOfMemory { .. } | VoicePoolError::NodeAllocation { .. } => vec![
                "Lower maxVoices",
                "Use a lower sample rate to shrink noise buffers",
            ],
            VoicePoolError::EmptyFilterBank => vec!["Configure at least one filter frequency"],
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = VoicePoolError::ModuleLoad {
            module: "voice.js".to_string(),
            reason: "not found".to_string(),
        };
        assert_eq!(err.error_code(), "MODULE_LOAD");
        assert_eq!(err.kind(), ErrorKind::DependencyLoad);
    }

    #[test]
    fn test_taxonomy() {
        assert_eq!(
            VoicePoolError::InvalidDestination {
                reason: "unknown node".to_string()
            }
            .kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            VoicePoolError::OutOfMemory {
                details: "noise buffer".to_string()
            }
            .kind(),
            ErrorKind::ResourceAllocation
        );
        assert_eq!(VoicePoolError::EmptyFilterBank.kind(), ErrorKind::Topology);
        assert_eq!(
            VoicePoolError::InputCountMismatch {
                expected: 2,
                actual: 1
            }
            .kind(),
            ErrorKind::Topology
        );
    }

    #[test]
    fn test_recovery_suggestions() {
        let err = VoicePoolError::ModuleTimeout {
            module: "voice.js".to_string(),
            timeout_ms: 100,
        };
        assert!(!err.recovery_suggestions().is_empty());
        assert!(err.to_string().contains("100ms"));
    }
}
