//! Resource counters reported by AI collaborators.
//!
//! Collaborators expose *cumulative* counters for their whole lifetime. The
//! engine never resets them: it takes a snapshot before and after a call and
//! keeps the field-wise difference ([`MetricSnapshot::delta`]).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Token usage, cost and elapsed time counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    #[serde(default)]
    pub usage: BTreeMap<String, u64>,

    #[serde(default)]
    pub cost: BTreeMap<String, f64>,

    #[serde(default)]
    pub elapsed: BTreeMap<String, f64>,
}

impl MetricSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_usage(mut self, counter: impl Into<String>, value: u64) -> Self {
        self.usage.insert(counter.into(), value);
        self
    }

    pub fn with_cost(mut self, counter: impl Into<String>, value: f64) -> Self {
        self.cost.insert(counter.into(), value);
        self
    }

    pub fn with_elapsed(mut self, counter: impl Into<String>, value: f64) -> Self {
        self.elapsed.insert(counter.into(), value);
        self
    }

    /// `after - before`, field by field.
    ///
    /// Counters absent from `before` count from zero. Counters are
    /// non-decreasing, so a negative difference can only come from a
    /// misbehaving collaborator and is clamped to zero.
    pub fn delta(after: &Self, before: &Self) -> Self {
        Self {
            usage: after
                .usage
                .iter()
                .map(|(k, v)| {
                    let prev = before.usage.get(k).copied().unwrap_or(0);
                    (k.clone(), v.saturating_sub(prev))
                })
                .collect(),
            cost: diff_floats(&after.cost, &before.cost),
            elapsed: diff_floats(&after.elapsed, &before.elapsed),
        }
    }

    /// Field-wise sum of two snapshots.
    pub fn add(&self, other: &Self) -> Self {
        let mut out = self.clone();
        for (k, v) in &other.usage {
            *out.usage.entry(k.clone()).or_insert(0) += v;
        }
        for (k, v) in &other.cost {
            *out.cost.entry(k.clone()).or_insert(0.0) += v;
        }
        for (k, v) in &other.elapsed {
            *out.elapsed.entry(k.clone()).or_insert(0.0) += v;
        }
        out
    }

    /// Sum of any number of snapshots.
    pub fn sum<'a>(snapshots: impl IntoIterator<Item = &'a MetricSnapshot>) -> Self {
        snapshots
            .into_iter()
            .fold(Self::default(), |acc, s| acc.add(s))
    }

    pub fn is_empty(&self) -> bool {
        self.usage.is_empty() && self.cost.is_empty() && self.elapsed.is_empty()
    }
}

fn diff_floats(after: &BTreeMap<String, f64>, before: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    after
        .iter()
        .map(|(k, v)| {
            let prev = before.get(k).copied().unwrap_or(0.0);
            (k.clone(), (v - prev).max(0.0))
        })
        .collect()
}
