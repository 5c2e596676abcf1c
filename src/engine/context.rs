use super::{EngineParams, HeEngine, SimulatedEngine};
use crate::config::{ConfigError, FheConfig, Scheme};
use tracing::info;

/// Creates an engine context for one kernel configuration.
///
/// Only the approximate real-arithmetic scheme is accepted; anything else is a configuration
/// error the caller is expected to treat as fatal.
pub fn create_engine(
    fhe: &FheConfig,
    depth: u32,
    ring_dim: u32,
    seed: Option<u64>,
) -> Result<SimulatedEngine, ConfigError> {
    if fhe.scheme != Scheme::Ckks {
        return Err(ConfigError::UnsupportedScheme(fhe.scheme));
    }
    if ring_dim < 2 || !ring_dim.is_power_of_two() {
        return Err(ConfigError::InvalidRingDim(ring_dim));
    }
    let params = EngineParams::new(ring_dim, depth, fhe.scale_mod_size, fhe.security_level);
    Ok(SimulatedEngine::new(params, seed)?)
}

pub fn context_summary<E: HeEngine>(engine: &E, scheme: Scheme) {
    let params = engine.params();
    info!(
        "scheme={} ring_dim={} slots={} depth={} scale_bits={} security={}",
        scheme,
        params.ring_dim,
        engine.slot_count(),
        params.multiplicative_depth,
        params.scale_mod_size,
        params.security_level
    );
}
