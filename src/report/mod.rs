//! Report tree composed from normalized classrooms.
//!
//! The tree has three levels (institution → programs → instructors) and
//! carries, at every node, the aggregate stats and stacked-bar layout a
//! renderer needs. Composition is pure: no I/O happens here.

pub mod compose;
pub mod filters;

pub use compose::{classroom_tiers, compose_institution, compose_instructors, compose_programs};
pub use filters::{ReportFilters, ReportLimits};

use serde::Serialize;

use crate::analyzers::tier::{PerformanceTier, TierBands};
use crate::analyzers::types::{AggregateStats, LayoutSegments};
use crate::records::ClassroomRecord;

/// One instructor and the classrooms that survived filtering, ordered by NRC.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstructorSummary {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub totals: AggregateStats,
    pub layout: LayoutSegments,
    /// Tier of the instructor's average score.
    pub average_tier: PerformanceTier,
    pub classrooms: Vec<ClassroomRecord>,
}

impl InstructorSummary {
    pub fn classroom_tiers(&self, bands: &TierBands) -> Vec<(&ClassroomRecord, PerformanceTier)> {
        classroom_tiers(&self.classrooms, bands)
    }
}

/// One academic program with its instructors ordered by display name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramReport {
    pub name: String,
    pub totals: AggregateStats,
    pub layout: LayoutSegments,
    pub instructors: Vec<InstructorSummary>,
}

/// Institution-wide totals with programs in alphabetical order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Institution {
    pub totals: AggregateStats,
    pub layout: LayoutSegments,
    pub programs: Vec<ProgramReport>,
}

impl Institution {
    /// Programs for the comparison bars: most classrooms first, ties in listing order.
    pub fn comparison_order(&self) -> Vec<&ProgramReport> {
        let mut programs: Vec<&ProgramReport> = self.programs.iter().collect();
        programs.sort_by(|a, b| b.totals.total_count.cmp(&a.totals.total_count));
        programs
    }
}
