//! Data types produced by the aggregation pipeline.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::analyzers::tier::PerformanceTier;
use crate::analyzers::utility::round2;

/// Classroom count per tier. All four tiers are always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierCounts([usize; 4]);

impl TierCounts {
    pub fn get(&self, tier: PerformanceTier) -> usize {
        self.0[tier.index()]
    }

    pub(crate) fn increment(&mut self, tier: PerformanceTier) {
        self.0[tier.index()] += 1;
    }

    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    pub fn from_array(counts: [usize; 4]) -> Self {
        Self(counts)
    }
}

impl Serialize for TierCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        for tier in PerformanceTier::ALL {
            map.serialize_entry(&tier, &self.get(tier))?;
        }
        map.end()
    }
}

/// Share of classrooms per tier, in percent rounded to one decimal.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TierPercents([f64; 4]);

impl TierPercents {
    pub fn get(&self, tier: PerformanceTier) -> f64 {
        self.0[tier.index()]
    }

    pub(crate) fn from_array(percents: [f64; 4]) -> Self {
        Self(percents)
    }
}

impl Serialize for TierPercents {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        for tier in PerformanceTier::ALL {
            map.serialize_entry(&tier, &self.get(tier))?;
        }
        map.end()
    }
}

/// Totals for any set of classrooms (one instructor, one program, the institution).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateStats {
    pub total_count: usize,
    pub average: f64,
    pub tier_counts: TierCounts,
    pub tier_percents: TierPercents,
}

impl AggregateStats {
    /// Average rounded to two decimals, as printed in reports.
    pub fn display_average(&self) -> f64 {
        round2(self.average)
    }
}

/// Widths (percent) of the four stacked-bar segments, best tier first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LayoutSegments {
    pub excellent: f64,
    pub good: f64,
    pub acceptable: f64,
    pub unsatisfactory: f64,
}

impl LayoutSegments {
    pub fn values(&self) -> [f64; 4] {
        [self.excellent, self.good, self.acceptable, self.unsatisfactory]
    }

    pub fn get(&self, tier: PerformanceTier) -> f64 {
        self.values()[tier.index()]
    }
}
