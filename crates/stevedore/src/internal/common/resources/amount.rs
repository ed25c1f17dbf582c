use derive_more::{Add, AddAssign, Sub, SubAssign, Sum};
use serde::{Deserialize, Serialize};

pub type ResourceUnits = u32;
pub type ResourceFractions = u32;

pub const FRACTIONS_PER_UNIT: ResourceFractions = 10_000;
pub const FRACTIONS_MAX_DIGITS: usize = 4; // = log10(FRACTIONS_PER_UNIT)

/// Quantity of one consumable (cores, bytes of memory, connections, ...).
/// Stored as fixed-point number so that fractional requests (e.g. half a GPU)
/// compose without rounding errors.
#[derive(
    Debug,
    Default,
    Serialize,
    Clone,
    Copy,
    Hash,
    Eq,
    Deserialize,
    PartialEq,
    Ord,
    PartialOrd,
    AddAssign,
    SubAssign,
    Sub,
    Add,
    Sum,
)]
pub struct ResourceAmount(u64);

impl ResourceAmount {
    pub const ZERO: ResourceAmount = ResourceAmount(0);

    pub fn new(units: ResourceUnits, fractions: ResourceFractions) -> Self {
        assert!(fractions < FRACTIONS_PER_UNIT);
        ResourceAmount(units as u64 * FRACTIONS_PER_UNIT as u64 + fractions as u64)
    }

    pub fn new_units(units: ResourceUnits) -> Self {
        ResourceAmount(units as u64 * FRACTIONS_PER_UNIT as u64)
    }

    pub fn from_float(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        Some(ResourceAmount(
            (value * FRACTIONS_PER_UNIT as f64).round() as u64,
        ))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn units(&self) -> ResourceUnits {
        (self.0 / (FRACTIONS_PER_UNIT as u64)) as ResourceUnits
    }

    pub fn fractions(&self) -> ResourceFractions {
        (self.0 % (FRACTIONS_PER_UNIT as u64)) as ResourceFractions
    }

    pub fn total_fractions(&self) -> u64 {
        self.0
    }

    /// How many times `demand` fits into `self`.
    /// Returns `None` for a zero demand, which fits arbitrarily many times.
    pub fn fits(&self, demand: ResourceAmount) -> Option<u64> {
        if demand.is_zero() {
            None
        } else {
            Some(self.0 / demand.0)
        }
    }

    pub fn checked_sub(&self, other: ResourceAmount) -> Option<ResourceAmount> {
        self.0.checked_sub(other.0).map(ResourceAmount)
    }
}

impl std::fmt::Display for ResourceAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let fractions = self.fractions();
        write!(f, "{}", self.units())?;
        if fractions != 0 {
            let num = format!("{:01$}", fractions, FRACTIONS_MAX_DIGITS);
            write!(f, ".{}", num.trim_end_matches('0'))?;
        }
        Ok(())
    }
}
