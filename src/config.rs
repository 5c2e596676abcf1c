//! Benchmark configuration.
//!
//! The configuration is read from a TOML file once, validated once, and then handed by
//! reference to every component that needs it.

use crate::engine::{EngineError, SecurityLevel};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    path::{Path, PathBuf},
};
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    Ckks,
    Bfv,
    Bgv,
}

impl Display for Scheme {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Scheme::Ckks => f.write_str("CKKS"),
            Scheme::Bfv => f.write_str("BFV"),
            Scheme::Bgv => f.write_str("BGV"),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("only CKKS is supported, got {0}")]
    UnsupportedScheme(Scheme),

    #[error("chebyshev coefficient list needs at least 2 entries, got {0}")]
    MalformedCoefficients(usize),

    #[error("ring dimension {0} is not a power of two >= 2")]
    InvalidRingDim(u32),

    #[error("{0} must be at least 1")]
    NonPositive(&'static str),

    #[error("{0} must be a finite number")]
    NonFinite(&'static str),

    #[error("engine rejected parameters: {0}")]
    Engine(#[from] EngineError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FheConfig {
    pub scheme: Scheme,
    pub scale_mod_size: u32,
    pub security_level: SecurityLevel,
    /// Directory key bundles are written to.
    pub key_dir: PathBuf,
    pub key_file: String,
    /// Seed for input sampling and engine noise. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for FheConfig {
    fn default() -> Self {
        Self {
            scheme: Scheme::Ckks,
            scale_mod_size: 50,
            security_level: SecurityLevel::Classic128,
            key_dir: PathBuf::from("keys"),
            key_file: "keys.json".to_string(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatVecConfig {
    pub ring_dims: Vec<u32>,
    pub depth: u32,
    pub matrix_sizes: Vec<usize>,
    pub max_matrix_value: f64,
    pub max_vector_value: f64,
    /// Extra rotation keys generated for the sequential variant.
    pub rotation_indices: Vec<i32>,
    pub output_csv: PathBuf,
    pub function_variants: Vec<String>,
}

impl Default for MatVecConfig {
    fn default() -> Self {
        Self {
            ring_dims: vec![8192],
            depth: 2,
            matrix_sizes: vec![4, 8, 16],
            max_matrix_value: 10.0,
            max_vector_value: 10.0,
            rotation_indices: vec![1],
            output_csv: PathBuf::from("matvec.csv"),
            function_variants: vec!["sequential".to_string(), "parallel".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolyEvalConfig {
    pub ring_dims: Vec<u32>,
    pub depth: u32,
    pub vector_sizes: Vec<usize>,
    pub max_vector_value: f64,
    pub output_csv: PathBuf,
    pub chebyshev_coeffs: Vec<f64>,
    pub function_variants: Vec<String>,
}

impl Default for PolyEvalConfig {
    fn default() -> Self {
        Self {
            ring_dims: vec![8192],
            depth: 6,
            vector_sizes: vec![8, 64],
            max_vector_value: 1.0,
            output_csv: PathBuf::from("polyeval.csv"),
            chebyshev_coeffs: vec![0.0, 1.0, 0.0, -0.1667],
            function_variants: vec!["custom".to_string(), "engine-native".to_string()],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub fhe: FheConfig,
    pub matvec: MatVecConfig,
    pub polyeval: PolyEvalConfig,
}

impl BenchConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Loads and validates in one step; the form used by the binary.
    pub fn load_validated(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fhe.scheme != Scheme::Ckks {
            return Err(ConfigError::UnsupportedScheme(self.fhe.scheme));
        }
        if self.polyeval.chebyshev_coeffs.len() < 2 {
            return Err(ConfigError::MalformedCoefficients(self.polyeval.chebyshev_coeffs.len()));
        }
        for &ring_dim in self.matvec.ring_dims.iter().chain(&self.polyeval.ring_dims) {
            if ring_dim < 2 || !ring_dim.is_power_of_two() {
                return Err(ConfigError::InvalidRingDim(ring_dim));
            }
        }
        if self.matvec.depth == 0 {
            return Err(ConfigError::NonPositive("matvec.depth"));
        }
        if self.polyeval.depth == 0 {
            return Err(ConfigError::NonPositive("polyeval.depth"));
        }
        if self.matvec.matrix_sizes.contains(&0) {
            return Err(ConfigError::NonPositive("matvec.matrix_sizes"));
        }
        if self.polyeval.vector_sizes.contains(&0) {
            return Err(ConfigError::NonPositive("polyeval.vector_sizes"));
        }
        let bounds = [
            ("matvec.max_matrix_value", self.matvec.max_matrix_value),
            ("matvec.max_vector_value", self.matvec.max_vector_value),
            ("polyeval.max_vector_value", self.polyeval.max_vector_value),
        ];
        if let Some((name, _)) = bounds.iter().find(|(_, bound)| !bound.is_finite()) {
            return Err(ConfigError::NonFinite(*name));
        }
        if let Some(idx) = self.polyeval.chebyshev_coeffs.iter().position(|c| !c.is_finite()) {
            warn!("chebyshev coefficient {idx} is not finite");
            return Err(ConfigError::NonFinite("polyeval.chebyshev_coeffs"));
        }
        Ok(())
    }
}
