use crate::core::units::{DAYS_IN_MONTH, MONTHS_PER_YEAR};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::hash::Hash;
use std::ops::{Add, Index, IndexMut, Mul, Sub};

/// Twelve monthly values, January first.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MonthVector([f64; MONTHS_PER_YEAR]);

impl MonthVector {
    pub const fn new(values: [f64; MONTHS_PER_YEAR]) -> Self {
        Self(values)
    }

    pub fn zeros() -> Self {
        Self([0.; MONTHS_PER_YEAR])
    }

    pub fn constant(value: f64) -> Self {
        Self([value; MONTHS_PER_YEAR])
    }

    pub fn from_fn(f: impl FnMut(usize) -> f64) -> Self {
        Self(std::array::from_fn(f))
    }

    /// Like `from_fn`, for calculations that can fail for a given month.
    pub fn try_from_fn(mut f: impl FnMut(usize) -> anyhow::Result<f64>) -> anyhow::Result<Self> {
        let mut values = [0.; MONTHS_PER_YEAR];
        for (month_idx, value) in values.iter_mut().enumerate() {
            *value = f(month_idx)?;
        }
        Ok(Self(values))
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self(self.0.map(f))
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.0.iter()
    }

    pub fn values(&self) -> [f64; MONTHS_PER_YEAR] {
        self.0
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Arithmetic mean over the twelve months (not weighted by month length).
    pub fn mean(&self) -> f64 {
        self.sum() / MONTHS_PER_YEAR as f64
    }

    /// Scale each month by its number of days, e.g. to turn a mean power into watt-days.
    pub fn times_days_in_month(&self) -> Self {
        Self::from_fn(|m| self.0[m] * DAYS_IN_MONTH[m] as f64)
    }
}

impl From<[f64; MONTHS_PER_YEAR]> for MonthVector {
    fn from(values: [f64; MONTHS_PER_YEAR]) -> Self {
        Self(values)
    }
}

impl Index<usize> for MonthVector {
    type Output = f64;

    fn index(&self, month_idx: usize) -> &Self::Output {
        &self.0[month_idx]
    }
}

impl IndexMut<usize> for MonthVector {
    fn index_mut(&mut self, month_idx: usize) -> &mut Self::Output {
        &mut self.0[month_idx]
    }
}

impl Add for MonthVector {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::from_fn(|m| self.0[m] + rhs.0[m])
    }
}

impl Sub for MonthVector {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::from_fn(|m| self.0[m] - rhs.0[m])
    }
}

impl Mul for MonthVector {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self::from_fn(|m| self.0[m] * rhs.0[m])
    }
}

impl Mul<f64> for MonthVector {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        self.map(|value| value * rhs)
    }
}

/// Month vectors keyed by a closed set of categories (e.g. kinds of heat loss).
///
/// Entries are added by the stage that owns the category and are never removed; inserting an
/// existing category replaces its vector in place, keeping the original position.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
#[serde(bound(
    serialize = "K: Serialize + Hash + Eq",
    deserialize = "K: Deserialize<'de> + Hash + Eq"
))]
pub struct MonthlyMap<K: Hash + Eq>(IndexMap<K, MonthVector>);

impl<K: Hash + Eq> Default for MonthlyMap<K> {
    fn default() -> Self {
        Self(IndexMap::new())
    }
}

impl<K: Hash + Eq + Copy> MonthlyMap<K> {
    pub fn insert(&mut self, category: K, values: MonthVector) {
        self.0.insert(category, values);
    }

    pub fn get(&self, category: K) -> Option<&MonthVector> {
        self.0.get(&category)
    }

    pub fn contains(&self, category: K) -> bool {
        self.0.contains_key(&category)
    }

    pub fn categories(&self) -> impl Iterator<Item = K> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &MonthVector)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Element-wise sum over every category; all zeros when there are none.
    pub fn total(&self) -> MonthVector {
        self.0
            .values()
            .fold(MonthVector::zeros(), |acc, values| acc + *values)
    }
}
