use super::{EngineError, EngineParams, HeEngine};
use crate::storage::KeyBundle;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rand_distr::{Distribution, Normal};
use std::{
    collections::BTreeSet,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};
use tracing::debug;

/// Plaintext of the simulated engine: one real value per slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SimPlaintext {
    slots: Vec<f64>,
}

impl SimPlaintext {
    pub fn slots(&self) -> &[f64] {
        &self.slots
    }
}

/// Ciphertext of the simulated engine. The slot values are kept in the clear; the level tracks
/// how many multiplications the value went through.
#[derive(Debug, Clone, PartialEq)]
pub struct SimCiphertext {
    slots: Vec<f64>,
    level: usize,
}

impl SimCiphertext {
    pub fn level(&self) -> usize {
        self.level
    }
}

/// Snapshot of the primitive calls issued against an engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpCounts {
    pub encryptions: usize,
    pub rotations: usize,
    pub ct_mults: usize,
    pub plain_mults: usize,
    pub scalar_mults: usize,
    pub additions: usize,
    pub poly_evals: usize,
}

#[derive(Debug, Default)]
struct Counters {
    encryptions: AtomicUsize,
    rotations: AtomicUsize,
    ct_mults: AtomicUsize,
    plain_mults: AtomicUsize,
    scalar_mults: AtomicUsize,
    additions: AtomicUsize,
    poly_evals: AtomicUsize,
}

impl Counters {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> OpCounts {
        OpCounts {
            encryptions: self.encryptions.load(Ordering::Relaxed),
            rotations: self.rotations.load(Ordering::Relaxed),
            ct_mults: self.ct_mults.load(Ordering::Relaxed),
            plain_mults: self.plain_mults.load(Ordering::Relaxed),
            scalar_mults: self.scalar_mults.load(Ordering::Relaxed),
            additions: self.additions.load(Ordering::Relaxed),
            poly_evals: self.poly_evals.load(Ordering::Relaxed),
        }
    }
}

/// Plain-`f64` model of an approximate-arithmetic (CKKS-like) engine.
///
/// It enforces the parts of the engine contract the kernels depend on:
/// - slot capacity of `ring_dim / 2`,
/// - a multiplicative depth budget,
/// - relinearization and per-shift rotation keys,
/// - small Gaussian noise on encryption and after each multiplication.
///
/// Noise is drawn from a seeded ChaCha stream, so runs with the same seed decrypt to the same
/// values as long as the call order is the same.
#[derive(Debug)]
pub struct SimulatedEngine {
    params: EngineParams,
    seed: Option<u64>,
    noise: Option<Normal<f64>>,
    rng: Mutex<ChaCha20Rng>,
    mult_key: bool,
    rotation_keys: BTreeSet<usize>,
    counters: Counters,
}

impl SimulatedEngine {
    pub fn new(params: EngineParams, seed: Option<u64>) -> Result<Self, EngineError> {
        if params.ring_dim < 2 || !params.ring_dim.is_power_of_two() {
            return Err(EngineError::InvalidParams(format!(
                "ring dimension {} is not a power of two >= 2",
                params.ring_dim
            )));
        }
        if params.multiplicative_depth == 0 {
            return Err(EngineError::InvalidParams("multiplicative depth must be >= 1".into()));
        }
        let sigma = 2f64.powi(-((params.scale_mod_size / 2) as i32));
        let rng = match seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_rng(&mut rand::rng()),
        };
        let engine = Self {
            params,
            seed,
            noise: None,
            rng: Mutex::new(rng),
            mult_key: false,
            rotation_keys: BTreeSet::new(),
            counters: Counters::default(),
        };
        Ok(engine.with_noise(sigma))
    }

    /// Replaces the noise standard deviation. `0.0` makes the engine exact.
    pub fn with_noise(mut self, sigma: f64) -> Self {
        self.noise = if sigma > 0.0 { Normal::new(0.0, sigma).ok() } else { None };
        self
    }

    /// Rebuilds an engine with the parameters and key set of a stored bundle.
    pub fn from_key_bundle(bundle: &KeyBundle) -> Result<Self, EngineError> {
        let mut engine = Self::new(bundle.params, bundle.seed)?;
        if bundle.mult_key {
            engine.gen_mult_key()?;
        }
        engine.gen_rotate_keys(&bundle.rotation_shifts)?;
        Ok(engine)
    }

    pub fn key_bundle(&self) -> KeyBundle {
        KeyBundle {
            params: self.params,
            seed: self.seed,
            mult_key: self.mult_key,
            rotation_shifts: self.rotation_shifts(),
        }
    }

    pub fn has_mult_key(&self) -> bool {
        self.mult_key
    }

    /// Normalized shifts a rotation key exists for, ascending.
    pub fn rotation_shifts(&self) -> Vec<i32> {
        self.rotation_keys.iter().map(|&shift| shift as i32).collect()
    }

    pub fn op_counts(&self) -> OpCounts {
        self.counters.snapshot()
    }

    fn normalize_shift(&self, shift: i32) -> usize {
        (shift as i64).rem_euclid(self.slot_count() as i64) as usize
    }

    fn check_level(&self, level: usize) -> Result<usize, EngineError> {
        let budget = self.params.multiplicative_depth as usize;
        if level > budget {
            return Err(EngineError::DepthExhausted { level, budget });
        }
        Ok(level)
    }

    fn perturb(&self, slots: &mut [f64]) {
        let Some(noise) = self.noise else {
            return;
        };
        let mut rng = self.rng.lock().expect("noise rng lock poisoned");
        for slot in slots.iter_mut() {
            *slot += noise.sample(&mut *rng);
        }
    }
}

impl HeEngine for SimulatedEngine {
    type Plaintext = SimPlaintext;
    type Ciphertext = SimCiphertext;

    fn params(&self) -> &EngineParams {
        &self.params
    }

    fn pack(&self, values: &[f64]) -> Result<SimPlaintext, EngineError> {
        let slots = self.slot_count();
        if values.len() > slots {
            return Err(EngineError::SlotOverflow { len: values.len(), slots });
        }
        let mut packed = vec![0.0; slots];
        packed[..values.len()].copy_from_slice(values);
        Ok(SimPlaintext { slots: packed })
    }

    fn unpack(&self, pt: &SimPlaintext, len: usize) -> Vec<f64> {
        pt.slots.iter().take(len).copied().collect()
    }

    fn encrypt(&self, pt: &SimPlaintext) -> Result<SimCiphertext, EngineError> {
        Counters::bump(&self.counters.encryptions);
        let mut slots = pt.slots.clone();
        self.perturb(&mut slots);
        Ok(SimCiphertext { slots, level: 0 })
    }

    fn decrypt(&self, ct: &SimCiphertext) -> Result<SimPlaintext, EngineError> {
        Ok(SimPlaintext { slots: ct.slots.clone() })
    }

    fn eval_mult(
        &self,
        lhs: &SimCiphertext,
        rhs: &SimCiphertext,
    ) -> Result<SimCiphertext, EngineError> {
        if !self.mult_key {
            return Err(EngineError::MissingMultKey);
        }
        Counters::bump(&self.counters.ct_mults);
        let level = self.check_level(lhs.level.max(rhs.level) + 1)?;
        let mut slots: Vec<f64> = lhs.slots.iter().zip(&rhs.slots).map(|(a, b)| a * b).collect();
        self.perturb(&mut slots);
        Ok(SimCiphertext { slots, level })
    }

    fn eval_mult_plain(
        &self,
        ct: &SimCiphertext,
        pt: &SimPlaintext,
    ) -> Result<SimCiphertext, EngineError> {
        Counters::bump(&self.counters.plain_mults);
        let level = self.check_level(ct.level + 1)?;
        let mut slots: Vec<f64> = ct.slots.iter().zip(&pt.slots).map(|(a, b)| a * b).collect();
        self.perturb(&mut slots);
        Ok(SimCiphertext { slots, level })
    }

    fn eval_mult_scalar(&self, ct: &SimCiphertext, scalar: f64) -> Result<SimCiphertext, EngineError> {
        Counters::bump(&self.counters.scalar_mults);
        let level = self.check_level(ct.level + 1)?;
        let mut slots: Vec<f64> = ct.slots.iter().map(|a| a * scalar).collect();
        self.perturb(&mut slots);
        Ok(SimCiphertext { slots, level })
    }

    fn eval_add(&self, lhs: &SimCiphertext, rhs: &SimCiphertext) -> Result<SimCiphertext, EngineError> {
        Counters::bump(&self.counters.additions);
        let slots = lhs.slots.iter().zip(&rhs.slots).map(|(a, b)| a + b).collect();
        Ok(SimCiphertext { slots, level: lhs.level.max(rhs.level) })
    }

    fn eval_add_many(&self, cts: &[SimCiphertext]) -> Result<SimCiphertext, EngineError> {
        let (first, rest) = cts.split_first().ok_or(EngineError::EmptyOperands)?;
        let mut acc = first.clone();
        for ct in rest {
            Counters::bump(&self.counters.additions);
            for (a, b) in acc.slots.iter_mut().zip(&ct.slots) {
                *a += b;
            }
            acc.level = acc.level.max(ct.level);
        }
        Ok(acc)
    }

    fn eval_rotate(&self, ct: &SimCiphertext, shift: i32) -> Result<SimCiphertext, EngineError> {
        let shift = self.normalize_shift(shift);
        if shift == 0 {
            return Ok(ct.clone());
        }
        if !self.rotation_keys.contains(&shift) {
            return Err(EngineError::MissingRotationKey { shift: shift as i32 });
        }
        Counters::bump(&self.counters.rotations);
        let mut slots = ct.slots.clone();
        slots.rotate_left(shift);
        Ok(SimCiphertext { slots, level: ct.level })
    }

    fn eval_poly(&self, ct: &SimCiphertext, coeffs: &[f64]) -> Result<SimCiphertext, EngineError> {
        if coeffs.len() < 2 {
            return Err(EngineError::InvalidPolynomial(coeffs.len()));
        }
        if !self.mult_key {
            return Err(EngineError::MissingMultKey);
        }
        Counters::bump(&self.counters.poly_evals);
        let degree = coeffs.len() - 1;
        let depth = (usize::BITS - (degree - 1).leading_zeros()) as usize + 1;
        let level = self.check_level(ct.level + depth)?;
        let mut slots: Vec<f64> = ct
            .slots
            .iter()
            .map(|&x| coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c))
            .collect();
        self.perturb(&mut slots);
        Ok(SimCiphertext { slots, level })
    }

    fn gen_mult_key(&mut self) -> Result<(), EngineError> {
        self.mult_key = true;
        debug!("generated relinearization key");
        Ok(())
    }

    fn gen_rotate_keys(&mut self, shifts: &[i32]) -> Result<(), EngineError> {
        for &shift in shifts {
            let shift = self.normalize_shift(shift);
            if shift != 0 {
                self.rotation_keys.insert(shift);
            }
        }
        debug!("rotation keys available for shifts {:?}", self.rotation_keys);
        Ok(())
    }
}
