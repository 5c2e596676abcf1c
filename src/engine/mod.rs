//! Capability interface of the homomorphic arithmetic engine.
//!
//! The kernels in this crate never touch ciphertext internals. They only issue the primitive
//! calls listed on [`HeEngine`]: packing, encryption, slot-wise multiplication and addition,
//! cyclic rotation and the engine's own polynomial evaluator. Key material is produced through
//! `&mut self` before any kernel runs and is read-only afterwards, so an engine can be shared
//! across the worker threads of the parallel matrix-vector variant.

pub mod context;
pub mod simulated;

pub use context::{context_summary, create_engine};
pub use simulated::{OpCounts, SimCiphertext, SimPlaintext, SimulatedEngine};

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Security level requested from the engine. Only recorded; parameter selection is the
/// engine's responsibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecurityLevel {
    #[default]
    #[serde(rename = "128-classic")]
    Classic128,
    #[serde(rename = "192-classic")]
    Classic192,
    #[serde(rename = "256-classic")]
    Classic256,
    #[serde(rename = "not-set")]
    NotSet,
}

impl std::fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SecurityLevel::Classic128 => "HEStd_128_classic",
            SecurityLevel::Classic192 => "HEStd_192_classic",
            SecurityLevel::Classic256 => "HEStd_256_classic",
            SecurityLevel::NotSet => "HEStd_NotSet",
        };
        f.write_str(label)
    }
}

/// Parameters an engine context is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineParams {
    /// Ring dimension `N`; the packed slot count is `N / 2`.
    pub ring_dim: u32,
    /// Maximum multiplicative level a ciphertext may reach.
    pub multiplicative_depth: u32,
    /// Bit size of the scaling factor.
    pub scale_mod_size: u32,
    pub security_level: SecurityLevel,
}

impl EngineParams {
    pub fn new(
        ring_dim: u32,
        multiplicative_depth: u32,
        scale_mod_size: u32,
        security_level: SecurityLevel,
    ) -> Self {
        Self { ring_dim, multiplicative_depth, scale_mod_size, security_level }
    }

    pub fn slot_count(&self) -> usize {
        (self.ring_dim / 2) as usize
    }
}

/// Failures reported by the engine. They abort the current kernel invocation and are never
/// retried.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("invalid engine parameters: {0}")]
    InvalidParams(String),

    #[error("{len} values do not fit into {slots} slots")]
    SlotOverflow { len: usize, slots: usize },

    #[error("multiplicative depth exhausted: level {level} exceeds budget {budget}")]
    DepthExhausted { level: usize, budget: usize },

    #[error("no rotation key generated for shift {shift}")]
    MissingRotationKey { shift: i32 },

    #[error("no relinearization key generated")]
    MissingMultKey,

    #[error("operation needs at least one operand")]
    EmptyOperands,

    #[error("polynomial evaluation needs degree >= 1, got {0} coefficients")]
    InvalidPolynomial(usize),
}

/// Primitive operations the kernels are allowed to use.
pub trait HeEngine: Send + Sync {
    type Plaintext: Debug + Clone + Send + Sync;
    type Ciphertext: Debug + Clone + Send + Sync;

    fn params(&self) -> &EngineParams;

    fn slot_count(&self) -> usize {
        self.params().slot_count()
    }

    /// Slot-packed real-valued encoding. Unused trailing slots are zero.
    fn pack(&self, values: &[f64]) -> Result<Self::Plaintext, EngineError>;
    /// Returns the first `len` slots of a decoded plaintext.
    fn unpack(&self, pt: &Self::Plaintext, len: usize) -> Vec<f64>;

    fn encrypt(&self, pt: &Self::Plaintext) -> Result<Self::Ciphertext, EngineError>;
    fn decrypt(&self, ct: &Self::Ciphertext) -> Result<Self::Plaintext, EngineError>;

    fn eval_mult(
        &self,
        lhs: &Self::Ciphertext,
        rhs: &Self::Ciphertext,
    ) -> Result<Self::Ciphertext, EngineError>;
    fn eval_mult_plain(
        &self,
        ct: &Self::Ciphertext,
        pt: &Self::Plaintext,
    ) -> Result<Self::Ciphertext, EngineError>;
    fn eval_mult_scalar(
        &self,
        ct: &Self::Ciphertext,
        scalar: f64,
    ) -> Result<Self::Ciphertext, EngineError>;

    fn eval_add(
        &self,
        lhs: &Self::Ciphertext,
        rhs: &Self::Ciphertext,
    ) -> Result<Self::Ciphertext, EngineError>;
    fn eval_add_many(&self, cts: &[Self::Ciphertext]) -> Result<Self::Ciphertext, EngineError>;

    /// Cyclic left rotation of the packed slots: `out[j] = in[(j + shift) mod slots]`.
    fn eval_rotate(
        &self,
        ct: &Self::Ciphertext,
        shift: i32,
    ) -> Result<Self::Ciphertext, EngineError>;

    /// Engine-native evaluation of `Σ coeffs[k] x^k` over the full coefficient list.
    fn eval_poly(
        &self,
        ct: &Self::Ciphertext,
        coeffs: &[f64],
    ) -> Result<Self::Ciphertext, EngineError>;

    fn gen_mult_key(&mut self) -> Result<(), EngineError>;
    fn gen_rotate_keys(&mut self, shifts: &[i32]) -> Result<(), EngineError>;
}
