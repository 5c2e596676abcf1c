//! Depth-minimizing schedule for the powers `x^1..x^d` of an encrypted value.
//!
//! Every power `i >= 2` is the product of two earlier powers `j` and `i - j`. Its level is
//! `max(level[j], level[i - j]) + 1`; the scheduler picks, for each `i`, the smallest `j` in
//! `[1, i/2]` that minimizes that level. The tie-break on the smallest `j` fixes which products
//! are evaluated and therefore the noise profile of every power.

use crate::engine::{EngineError, HeEngine};
use std::collections::BTreeMap;
use tracing::debug;

/// Plan produced by [`schedule_powers`]. Indexed by exponent; index 0 is unused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerSchedule {
    levels: Vec<usize>,
    factors: Vec<Option<(usize, usize)>>,
}

impl PowerSchedule {
    pub fn degree(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn level(&self, exponent: usize) -> usize {
        self.levels[exponent]
    }

    /// `(j, i - j)` for `i >= 2`, `None` for `x^1`.
    pub fn factors(&self, exponent: usize) -> Option<(usize, usize)> {
        self.factors[exponent]
    }

    /// Level of the deepest power.
    pub fn depth(&self) -> usize {
        self.levels.iter().copied().max().unwrap_or(0)
    }
}

/// Computes levels and factor pairs for all exponents `1..=degree`.
///
/// Panics if `degree < 1`.
pub fn schedule_powers(degree: usize) -> PowerSchedule {
    assert!(degree >= 1, "power schedule needs degree >= 1, got {degree}");
    let mut levels = vec![0usize; degree + 1];
    let mut factors = vec![None; degree + 1];
    for i in 2..=degree {
        let mut min_level = i;
        let mut candidate = None;
        for j in 1..=i / 2 {
            let level = levels[j].max(levels[i - j]) + 1;
            if level < min_level {
                min_level = level;
                candidate = Some(j);
            }
        }
        let Some(j) = candidate else {
            panic!("no factorization candidate for exponent {i}");
        };
        levels[i] = min_level;
        factors[i] = Some((j, i - j));
    }
    PowerSchedule { levels, factors }
}

/// Encrypted powers keyed by exponent, with the level each one was scheduled at.
#[derive(Debug, Clone)]
pub struct PowerTable<C> {
    powers: BTreeMap<usize, C>,
    levels: BTreeMap<usize, usize>,
}

impl<C> PowerTable<C> {
    pub fn get(&self, exponent: usize) -> Option<&C> {
        self.powers.get(&exponent)
    }

    pub fn level(&self, exponent: usize) -> Option<usize> {
        self.levels.get(&exponent).copied()
    }

    pub fn len(&self) -> usize {
        self.powers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.powers.is_empty()
    }

    /// Consumes the table and returns the odd powers in ascending exponent order.
    pub fn into_odd_powers(self) -> Vec<C> {
        self.powers.into_iter().filter(|(exp, _)| exp % 2 == 1).map(|(_, ct)| ct).collect()
    }
}

/// Evaluates the schedule for `degree` against the engine, starting from `x = x^1`.
pub fn compute_powers<E: HeEngine>(
    engine: &E,
    x: &E::Ciphertext,
    degree: usize,
) -> Result<PowerTable<E::Ciphertext>, EngineError> {
    let schedule = schedule_powers(degree);
    debug!("power tree for degree {} has depth {}", degree, schedule.depth());
    let mut powers = BTreeMap::new();
    let mut levels = BTreeMap::new();
    powers.insert(1, x.clone());
    levels.insert(1, 0);
    for i in 2..=degree {
        let (j, k) = schedule.factors(i).expect("exponents >= 2 always have factors");
        let product = engine.eval_mult(&powers[&j], &powers[&k])?;
        powers.insert(i, product);
        levels.insert(i, schedule.level(i));
    }
    Ok(PowerTable { powers, levels })
}

/// Odd powers `x^1, x^3, ...` up to `degree`, ascending; `⌈degree / 2⌉` entries.
pub fn compute_odd_powers<E: HeEngine>(
    engine: &E,
    x: &E::Ciphertext,
    degree: usize,
) -> Result<Vec<E::Ciphertext>, EngineError> {
    Ok(compute_powers(engine, x, degree)?.into_odd_powers())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineParams, SecurityLevel, SimulatedEngine};

    #[test]
    fn test_schedule_degree_five() {
        let schedule = schedule_powers(5);
        assert_eq!(schedule.degree(), 5);
        let levels: Vec<usize> = (1..=5).map(|i| schedule.level(i)).collect();
        assert_eq!(levels, vec![0, 1, 2, 2, 3]);
        assert_eq!(schedule.factors(1), None);
        assert_eq!(schedule.factors(2), Some((1, 1)));
        assert_eq!(schedule.factors(3), Some((1, 2)));
        // j = 1 gives level 3, j = 2 gives level 2
        assert_eq!(schedule.factors(4), Some((2, 2)));
        // j = 1 and j = 2 both reach level 3; the lower index wins
        assert_eq!(schedule.factors(5), Some((1, 4)));
        assert_eq!(schedule.depth(), 3);
    }

    #[test]
    fn test_schedule_depth_is_logarithmic() {
        for degree in 1..=64usize {
            let schedule = schedule_powers(degree);
            let expected = (usize::BITS - degree.leading_zeros() - 1) as usize
                + usize::from(!degree.is_power_of_two());
            assert_eq!(schedule.depth(), expected, "degree {degree}");
        }
    }

    #[test]
    #[should_panic(expected = "degree >= 1")]
    fn test_schedule_rejects_zero_degree() {
        schedule_powers(0);
    }

    #[test]
    fn test_odd_powers() {
        let params = EngineParams::new(16, 4, 50, SecurityLevel::Classic128);
        let mut engine = SimulatedEngine::new(params, None).unwrap().with_noise(0.0);
        engine.gen_mult_key().unwrap();
        let x = engine.encrypt(&engine.pack(&[2.0, -1.0]).unwrap()).unwrap();

        let table = compute_powers(&engine, &x, 6).unwrap();
        assert_eq!(table.len(), 6);
        assert_eq!(table.level(1), Some(0));
        for exponent in 1..=6 {
            assert_eq!(table.get(exponent).unwrap().level(), table.level(exponent).unwrap());
        }

        for degree in 1..=7usize {
            let odd = compute_odd_powers(&engine, &x, degree).unwrap();
            assert_eq!(odd.len(), degree.div_ceil(2));
            for (idx, ct) in odd.iter().enumerate() {
                let exponent = 2 * idx + 1;
                let pt = engine.decrypt(ct).unwrap();
                assert_eq!(
                    engine.unpack(&pt, 2),
                    vec![2f64.powi(exponent as i32), (-1f64).powi(exponent as i32)]
                );
            }
            assert_eq!(odd[0].level(), 0);
        }
    }
}
