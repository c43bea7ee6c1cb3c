use std::collections::BTreeMap;

use tracing::debug;

use crate::analyzers::aggregate::{
    aggregate, group_by_instructor, group_by_program, instructor_id_order,
    resolve_instructor_email, resolve_instructor_name,
};
use crate::analyzers::tier::{PerformanceTier, TierBands};
use crate::records::ClassroomRecord;
use crate::report::filters::{ReportFilters, limit_reached};
use crate::report::{Institution, InstructorSummary, ProgramReport};

/// Tier of every classroom, in input order.
pub fn classroom_tiers<'a>(
    records: &'a [ClassroomRecord],
    bands: &TierBands,
) -> Vec<(&'a ClassroomRecord, PerformanceTier)> {
    records
        .iter()
        .map(|r| (r, bands.classify(r.final_score)))
        .collect()
}

/// Per-instructor reports in instructor-id order.
///
/// An instructor appears only if at least one classroom passes every active
/// filter, and only those classrooms feed their totals. `limit` caps the number
/// of instructors emitted after filtering.
pub fn compose_instructors(
    records: &[ClassroomRecord],
    bands: &TierBands,
    filters: &ReportFilters,
    limit: Option<usize>,
) -> Vec<InstructorSummary> {
    let mut summaries = Vec::new();

    for (id, group) in group_by_instructor(records, None) {
        if limit_reached(limit, summaries.len()) {
            break;
        }
        let identity = Identity::resolve(&id, &group);
        match scoped_instructor(&id, &identity, &group, bands, filters) {
            Some(summary) => summaries.push(summary),
            None => debug!(instructor_id = %id, "Instructor filtered out"),
        }
    }

    summaries
}

/// Per-program reports in group order, restricted to the program allow-list.
///
/// Program reports cover every instructor of the program; id and e-mail
/// allow-lists only scope instructor and institution reports.
pub fn compose_programs(
    records: &[ClassroomRecord],
    bands: &TierBands,
    filters: &ReportFilters,
    limit: Option<usize>,
) -> Vec<ProgramReport> {
    let identities = identities(records);
    let mut programs = Vec::new();

    for (name, group) in group_by_program(records) {
        if limit_reached(limit, programs.len()) {
            break;
        }
        if !filters.allows_program(&name) {
            continue;
        }
        programs.push(program_report(
            &name,
            &group,
            &identities,
            bands,
            &ReportFilters::default(),
        ));
    }

    programs
}

/// Institution tree over every classroom that passes `filters`.
///
/// Programs are listed alphabetically ignoring case; see
/// [`Institution::comparison_order`] for the bar-chart order.
pub fn compose_institution(
    records: &[ClassroomRecord],
    bands: &TierBands,
    filters: &ReportFilters,
) -> Institution {
    let identities = identities(records);
    let mut programs: Vec<ProgramReport> = group_by_program(records)
        .into_iter()
        .map(|(name, group)| program_report(&name, &group, &identities, bands, filters))
        .filter(|program| !program.instructors.is_empty())
        .collect();
    programs.sort_by_key(|p| p.name.to_uppercase());

    let included: Vec<&ClassroomRecord> = programs
        .iter()
        .flat_map(|p| p.instructors.iter())
        .flat_map(|i| i.classrooms.iter())
        .collect();
    let totals = aggregate(included, bands);
    debug!(
        programs = programs.len(),
        classrooms = totals.total_count,
        "Composed institution report"
    );

    Institution {
        layout: totals.layout(),
        totals,
        programs,
    }
}

/// Display name and e-mail of an instructor, resolved over all of their classrooms.
#[derive(Clone)]
struct Identity {
    name: String,
    email: Option<String>,
}

impl Identity {
    fn resolve(id: &str, group: &[&ClassroomRecord]) -> Self {
        Self {
            name: resolve_instructor_name(id, group),
            email: resolve_instructor_email(group),
        }
    }
}

fn identities(records: &[ClassroomRecord]) -> BTreeMap<String, Identity> {
    group_by_instructor(records, None)
        .into_iter()
        .map(|(id, group)| {
            let identity = Identity::resolve(&id, &group);
            (id, identity)
        })
        .collect()
}

fn program_report(
    name: &str,
    group: &[&ClassroomRecord],
    identities: &BTreeMap<String, Identity>,
    bands: &TierBands,
    filters: &ReportFilters,
) -> ProgramReport {
    let mut by_instructor: BTreeMap<&str, Vec<&ClassroomRecord>> = BTreeMap::new();
    for &record in group {
        by_instructor
            .entry(record.instructor_id.as_str())
            .or_default()
            .push(record);
    }

    let mut instructors: Vec<InstructorSummary> = by_instructor
        .into_iter()
        .filter_map(|(id, records)| {
            let identity = identities
                .get(id)
                .map_or_else(|| Identity::resolve(id, &records), Identity::clone);
            scoped_instructor(id, &identity, &records, bands, filters)
        })
        .collect();
    instructors.sort_by(|a, b| {
        a.name
            .to_uppercase()
            .cmp(&b.name.to_uppercase())
            .then_with(|| instructor_id_order(&a.id, &b.id))
    });

    let totals = aggregate(
        instructors.iter().flat_map(|i| i.classrooms.iter()),
        bands,
    );

    ProgramReport {
        name: name.to_string(),
        layout: totals.layout(),
        totals,
        instructors,
    }
}

/// Builds an instructor node from the classrooms of `group` that pass
/// `filters`, or `None` when none do.
fn scoped_instructor(
    id: &str,
    identity: &Identity,
    group: &[&ClassroomRecord],
    bands: &TierBands,
    filters: &ReportFilters,
) -> Option<InstructorSummary> {
    let mut classrooms: Vec<ClassroomRecord> = group
        .iter()
        .filter(|r| filters.matches(r, identity.email.as_deref()))
        .map(|r| (*r).clone())
        .collect();
    if classrooms.is_empty() {
        return None;
    }
    classrooms.sort_by(|a, b| a.nrc.cmp(&b.nrc));

    let totals = aggregate(&classrooms, bands);
    Some(InstructorSummary {
        id: id.to_string(),
        name: identity.name.clone(),
        email: identity.email.clone(),
        layout: totals.layout(),
        average_tier: bands.classify(totals.average),
        totals,
        classrooms,
    })
}
