use crate::engine::EngineError;

/// Error returned by a single kernel invocation.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum KernelError {
    /// The function-variant selector is not known to the kernel family. Only the current
    /// benchmark cell is skipped.
    #[error("unknown {kernel} variant {name:?}")]
    UnknownVariant { kernel: &'static str, name: String },

    /// The engine rejected a primitive call; the invocation is aborted without retry.
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
