//! Encrypted polynomial evaluation.
//!
//! [`PolyEvalVariant::Custom`] evaluates only the odd-degree terms of the coefficient list on
//! top of the power tree in [`power_tree`]; this is the shape of Chebyshev-style approximations
//! of odd functions such as `sin`. Even-indexed coefficients, the constant term included, are
//! not applied. [`PolyEvalVariant::EngineNative`] hands the full coefficient list to the
//! engine's own evaluator, so the two only agree when every even coefficient is zero.

pub mod power_tree;

pub use power_tree::{PowerSchedule, PowerTable, compute_odd_powers, compute_powers, schedule_powers};

use crate::{
    engine::{EngineError, HeEngine},
    error::KernelError,
};
use std::{fmt, str::FromStr};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolyEvalVariant {
    Custom,
    EngineNative,
}

impl PolyEvalVariant {
    pub fn name(&self) -> &'static str {
        match self {
            PolyEvalVariant::Custom => "custom",
            PolyEvalVariant::EngineNative => "engine-native",
        }
    }
}

impl fmt::Display for PolyEvalVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PolyEvalVariant {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "custom" | "chebyshev" => Ok(PolyEvalVariant::Custom),
            "engine-native" | "openfhe" => Ok(PolyEvalVariant::EngineNative),
            other => {
                Err(KernelError::UnknownVariant { kernel: "polyeval", name: other.to_string() })
            }
        }
    }
}

/// Evaluates `Σ coeffs[2i+1] x^(2i+1)` over the odd powers of `x`.
///
/// Lists with fewer than two entries fail with [`EngineError::InvalidPolynomial`], the same
/// error the engine-native path reports.
pub fn evaluate_odd_chebyshev<E: HeEngine>(
    engine: &E,
    x: &E::Ciphertext,
    coeffs: &[f64],
) -> Result<E::Ciphertext, KernelError> {
    if coeffs.len() < 2 {
        return Err(EngineError::InvalidPolynomial(coeffs.len()).into());
    }
    let degree = coeffs.len() - 1;
    let powers = compute_odd_powers(engine, x, degree)?;
    let mut result = engine.eval_mult_scalar(&powers[0], coeffs[1])?;
    for i in 1..coeffs.len() / 2 {
        let term = engine.eval_mult_scalar(&powers[i], coeffs[2 * i + 1])?;
        result = engine.eval_add(&result, &term)?;
    }
    debug!("odd polynomial of degree {} evaluated over {} powers", degree, powers.len());
    Ok(result)
}

pub fn poly_eval<E: HeEngine>(
    engine: &E,
    variant: PolyEvalVariant,
    x: &E::Ciphertext,
    coeffs: &[f64],
) -> Result<E::Ciphertext, KernelError> {
    match variant {
        PolyEvalVariant::Custom => evaluate_odd_chebyshev(engine, x, coeffs),
        PolyEvalVariant::EngineNative => Ok(engine.eval_poly(x, coeffs)?),
    }
}
