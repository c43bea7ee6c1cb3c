//! Classroom score classification and aggregation.
//!
//! Final scores are mapped to performance tiers, grouped per instructor and
//! per program, summarised into counts and averages, and turned into the
//! stacked-bar widths every report draws.

pub mod aggregate;
pub mod layout;
pub mod tier;
pub mod types;
pub mod utility;
