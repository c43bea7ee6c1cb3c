//! Aggregation of classroom sets and grouping by instructor or program.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::analyzers::tier::{PerformanceTier, TierBands};
use crate::analyzers::types::{AggregateStats, TierCounts, TierPercents};
use crate::analyzers::utility::{mean, pct, round1};
use crate::records::ClassroomRecord;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static e-mail pattern compiles")
});

/// Records keyed by a grouping value, in ascending key order.
pub type Groups<'a> = BTreeMap<String, Vec<&'a ClassroomRecord>>;

/// Records grouped by instructor id, in [`instructor_id_order`].
pub type InstructorGroups<'a> = Vec<(String, Vec<&'a ClassroomRecord>)>;

/// Aggregates any set of classrooms into counts, average and tier histogram.
///
/// An empty set produces zeroed stats.
pub fn aggregate<'a, I>(records: I, bands: &TierBands) -> AggregateStats
where
    I: IntoIterator<Item = &'a ClassroomRecord>,
{
    let finals: Vec<f64> = records.into_iter().map(|r| r.final_score).collect();
    let total_count = finals.len();

    let mut tier_counts = TierCounts::default();
    for score in &finals {
        tier_counts.increment(bands.classify(*score));
    }

    let mut percents = [0.0; 4];
    for tier in PerformanceTier::ALL {
        percents[tier.index()] = round1(pct(tier_counts.get(tier), total_count));
    }

    AggregateStats {
        total_count,
        average: mean(&finals),
        tier_counts,
        tier_percents: TierPercents::from_array(percents),
    }
}

/// Numeric ids compare by value (`9` before `10`) and come before any
/// non-numeric id; non-numeric ids compare as text.
pub fn instructor_id_order(a: &str, b: &str) -> Ordering {
    let key = |id: &str| id.parse::<u128>().ok();
    match (key(a), key(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Groups records by instructor id, optionally restricted to one program.
pub fn group_by_instructor<'a>(
    records: &'a [ClassroomRecord],
    program: Option<&str>,
) -> InstructorGroups<'a> {
    let mut groups: Groups<'a> = BTreeMap::new();
    for record in records {
        if program.is_some_and(|p| record.program != p) {
            continue;
        }
        groups
            .entry(record.instructor_id.clone())
            .or_default()
            .push(record);
    }

    let mut ordered: InstructorGroups<'a> = groups.into_iter().collect();
    ordered.sort_by(|(a, _), (b, _)| instructor_id_order(a, b));
    ordered
}

/// Groups records by program name.
pub fn group_by_program(records: &[ClassroomRecord]) -> Groups<'_> {
    let mut groups: Groups<'_> = BTreeMap::new();
    for record in records {
        groups.entry(record.program.clone()).or_default().push(record);
    }
    groups
}

/// First non-blank name among an instructor's records, else `ID <id>`.
pub fn resolve_instructor_name(instructor_id: &str, records: &[&ClassroomRecord]) -> String {
    records
        .iter()
        .map(|r| r.instructor_name.trim())
        .find(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("ID {}", instructor_id))
}

/// First syntactically valid e-mail among an instructor's records.
pub fn resolve_instructor_email(records: &[&ClassroomRecord]) -> Option<String> {
    records
        .iter()
        .map(|r| r.email.trim())
        .find(|email| is_email(email))
        .map(str::to_string)
}

pub fn is_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, program: &str, final_score: f64) -> ClassroomRecord {
        ClassroomRecord {
            instructor_id: id.to_string(),
            instructor_name: String::new(),
            email: String::new(),
            program: program.to_string(),
            nrc: "100".to_string(),
            subject: String::new(),
            phase1_score: 0.0,
            phase2_score: 0.0,
            final_score,
            review_flag: String::new(),
        }
    }

    #[test]
    fn test_aggregate_empty_set() {
        let empty: Vec<ClassroomRecord> = Vec::new();
        let stats = aggregate(&empty, &TierBands::default());
        assert_eq!(stats.total_count, 0);
        assert_eq!(stats.average, 0.0);
        for tier in PerformanceTier::ALL {
            assert_eq!(stats.tier_counts.get(tier), 0);
            assert_eq!(stats.tier_percents.get(tier), 0.0);
        }
    }

    #[test]
    fn test_group_by_program_sample() {
        let records = vec![record("1", "A", 95.0), record("2", "A", 65.0), record("3", "B", 85.0)];
        let bands = TierBands::default();
        let groups = group_by_program(&records);
        assert_eq!(groups.len(), 2);

        let a = aggregate(groups["A"].iter().copied(), &bands);
        assert_eq!(a.total_count, 2);
        assert_eq!(a.average, 80.0);
        assert_eq!(a.tier_counts.get(PerformanceTier::Excellent), 1);
        assert_eq!(a.tier_counts.get(PerformanceTier::Good), 0);
        assert_eq!(a.tier_counts.get(PerformanceTier::Acceptable), 0);
        assert_eq!(a.tier_counts.get(PerformanceTier::Unsatisfactory), 1);
        assert_eq!(a.tier_percents.get(PerformanceTier::Excellent), 50.0);

        let b = aggregate(groups["B"].iter().copied(), &bands);
        assert_eq!(b.total_count, 1);
        assert_eq!(b.average, 85.0);
    }

    #[test]
    fn test_percents_round_to_one_decimal() {
        let records = vec![record("1", "A", 95.0), record("1", "A", 85.0), record("1", "A", 75.0)];
        let stats = aggregate(&records, &TierBands::default());
        assert_eq!(stats.tier_percents.get(PerformanceTier::Excellent), 33.3);
        assert_eq!(stats.tier_percents.get(PerformanceTier::Unsatisfactory), 0.0);
    }

    #[test]
    fn test_group_by_instructor_with_program() {
        let records = vec![record("7", "A", 90.0), record("7", "B", 70.0), record("8", "B", 60.0)];
        let all = group_by_instructor(&records, None);
        let ids: Vec<&str> = all.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["7", "8"]);
        assert_eq!(all[0].1.len(), 2);

        let only_b = group_by_instructor(&records, Some("B"));
        assert_eq!(only_b.len(), 2);
        assert!(only_b.iter().all(|(_, group)| group.len() == 1));
    }

    #[test]
    fn test_numeric_ids_sort_by_value() {
        let records = vec![
            record("10", "A", 90.0),
            record("X-2", "A", 90.0),
            record("9", "A", 90.0),
            record("100", "A", 90.0),
        ];
        let ids: Vec<String> = group_by_instructor(&records, None)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec!["9", "10", "100", "X-2"]);
        assert_eq!(instructor_id_order("9", "10"), Ordering::Less);
        assert_eq!(instructor_id_order("abc", "abd"), Ordering::Less);
    }

    #[test]
    fn test_instructor_name_resolution() {
        let mut first = record("7", "A", 90.0);
        let mut second = record("7", "A", 80.0);
        second.instructor_name = "Ana Ruiz".into();
        assert_eq!(resolve_instructor_name("7", &[&first, &second]), "Ana Ruiz");

        second.instructor_name = "  ".into();
        assert_eq!(resolve_instructor_name("7", &[&first, &second]), "ID 7");

        first.instructor_name = "Luis".into();
        assert_eq!(resolve_instructor_name("7", &[&first, &second]), "Luis");
    }

    #[test]
    fn test_email_resolution_skips_invalid() {
        let mut first = record("7", "A", 90.0);
        first.email = "not-an-email".into();
        let mut second = record("7", "A", 80.0);
        second.email = "ana@uni.edu".into();
        assert_eq!(
            resolve_instructor_email(&[&first, &second]),
            Some("ana@uni.edu".to_string())
        );
        assert_eq!(resolve_instructor_email(&[&first]), None);
    }
}
