//! Resolution of UI-level status selections into one canonical stored
//! status plus the auxiliary fields that status is allowed to carry.
//!
//! `Late` and `LeftEarly` are independent toggles that combine into
//! `LateAndLeftEarly`; `OnTime`, `NoShow` and `DayOff` are exclusive
//! picks that wipe the toggles and any previously entered clock times.
//! A flag-based pick is only committable once its required clock times
//! are present; until then it is held in the pending overlay.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::attendance::AttendanceStatus;

/// The two combinable toggles as the editing UI sees them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FlagSet {
    pub late: bool,
    pub left_early: bool,
}

impl FlagSet {
    pub fn is_empty(self) -> bool {
        !self.late && !self.left_early
    }

    /// Canonicalization table: {} -> None, {late} -> Late,
    /// {left_early} -> LeftEarly, both -> LateAndLeftEarly.
    pub fn canonical_status(self) -> Option<AttendanceStatus> {
        match (self.late, self.left_early) {
            (false, false) => None,
            (true, false) => Some(AttendanceStatus::Late),
            (false, true) => Some(AttendanceStatus::LeftEarly),
            (true, true) => Some(AttendanceStatus::LateAndLeftEarly),
        }
    }

    /// Inverse projection used when rendering a persisted record back
    /// into toggles. Exclusive statuses map to the empty set.
    pub fn from_status(status: AttendanceStatus) -> Self {
        match status {
            AttendanceStatus::Late => Self { late: true, left_early: false },
            AttendanceStatus::LeftEarly => Self { late: false, left_early: true },
            AttendanceStatus::LateAndLeftEarly => Self { late: true, left_early: true },
            _ => Self::default(),
        }
    }
}

/// One editing gesture: either the current toggle set, or an exclusive
/// status pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selection {
    Flags { late: bool, left_early: bool },
    OnTime,
    NoShow,
    DayOff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MissingField {
    ClockIn,
    ClockOut,
}

/// Outcome of resolving a selection against the currently visible field
/// values (persisted record merged with the pending overlay).
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Ready to persist. Fields are already scrubbed to what the status
    /// is allowed to carry; everything else must be written as NULL.
    Commit {
        status: AttendanceStatus,
        clock_in: Option<NaiveTime>,
        clock_out: Option<NaiveTime>,
        notes: Option<String>,
    },
    /// Flag-based selection missing its required clock time(s). Not an
    /// error: kept in the overlay until the times arrive.
    Hold { missing: Vec<MissingField> },
    /// Empty toggle set: nothing to write, nothing to hold.
    Unset,
}

/// Force every field the status does not carry to NULL.
pub fn scrub_fields(
    status: AttendanceStatus,
    clock_in: Option<NaiveTime>,
    clock_out: Option<NaiveTime>,
    notes: Option<&str>,
) -> (Option<NaiveTime>, Option<NaiveTime>, Option<String>) {
    (
        clock_in.filter(|_| status.needs_clock_in()),
        clock_out.filter(|_| status.needs_clock_out()),
        notes.filter(|_| status.keeps_notes()).map(str::to_owned),
    )
}

/// Pure canonicalization + gating. Exclusive picks always commit (with
/// toggles and clock times cleared); flag picks commit only once every
/// required clock time is present.
pub fn resolve(
    selection: &Selection,
    clock_in: Option<NaiveTime>,
    clock_out: Option<NaiveTime>,
    notes: Option<&str>,
) -> Resolution {
    let flags = match selection {
        Selection::Flags { late, left_early } => FlagSet {
            late: *late,
            left_early: *left_early,
        },
        Selection::OnTime => {
            return commit(AttendanceStatus::OnTime, clock_in, clock_out, notes);
        }
        Selection::NoShow => {
            return commit(AttendanceStatus::NoShow, clock_in, clock_out, notes);
        }
        Selection::DayOff => {
            return commit(AttendanceStatus::DayOff, clock_in, clock_out, notes);
        }
    };

    let Some(status) = flags.canonical_status() else {
        return Resolution::Unset;
    };

    let mut missing = Vec::new();
    if status.needs_clock_in() && clock_in.is_none() {
        missing.push(MissingField::ClockIn);
    }
    if status.needs_clock_out() && clock_out.is_none() {
        missing.push(MissingField::ClockOut);
    }
    if !missing.is_empty() {
        return Resolution::Hold { missing };
    }

    commit(status, clock_in, clock_out, notes)
}

fn commit(
    status: AttendanceStatus,
    clock_in: Option<NaiveTime>,
    clock_out: Option<NaiveTime>,
    notes: Option<&str>,
) -> Resolution {
    let (clock_in, clock_out, notes) = scrub_fields(status, clock_in, clock_out, notes);
    Resolution::Commit {
        status,
        clock_in,
        clock_out,
        notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn flags(late: bool, left_early: bool) -> Selection {
        Selection::Flags { late, left_early }
    }

    #[test]
    fn canonicalization_table() {
        assert_eq!(FlagSet::default().canonical_status(), None);
        assert_eq!(
            FlagSet { late: true, left_early: false }.canonical_status(),
            Some(AttendanceStatus::Late)
        );
        assert_eq!(
            FlagSet { late: false, left_early: true }.canonical_status(),
            Some(AttendanceStatus::LeftEarly)
        );
        assert_eq!(
            FlagSet { late: true, left_early: true }.canonical_status(),
            Some(AttendanceStatus::LateAndLeftEarly)
        );
    }

    #[test]
    fn flag_roundtrip_from_status() {
        assert_eq!(
            FlagSet::from_status(AttendanceStatus::LateAndLeftEarly),
            FlagSet { late: true, left_early: true }
        );
        assert!(FlagSet::from_status(AttendanceStatus::NoShow).is_empty());
        assert!(FlagSet::from_status(AttendanceStatus::OnTime).is_empty());
    }

    #[test]
    fn empty_flag_set_resolves_to_unset() {
        assert_eq!(resolve(&flags(false, false), None, None, None), Resolution::Unset);
    }

    #[test]
    fn late_without_clock_in_is_held() {
        assert_eq!(
            resolve(&flags(true, false), None, None, None),
            Resolution::Hold { missing: vec![MissingField::ClockIn] }
        );
    }

    #[test]
    fn combined_flags_report_every_missing_time() {
        assert_eq!(
            resolve(&flags(true, true), None, None, None),
            Resolution::Hold { missing: vec![MissingField::ClockIn, MissingField::ClockOut] }
        );
        assert_eq!(
            resolve(&flags(true, true), Some(time(10, 45)), None, None),
            Resolution::Hold { missing: vec![MissingField::ClockOut] }
        );
    }

    #[test]
    fn late_with_clock_in_commits_and_drops_clock_out() {
        let resolution = resolve(
            &flags(true, false),
            Some(time(10, 45)),
            Some(time(17, 0)),
            Some("irrelevant"),
        );
        assert_eq!(
            resolution,
            Resolution::Commit {
                status: AttendanceStatus::Late,
                clock_in: Some(time(10, 45)),
                clock_out: None,
                notes: None,
            }
        );
    }

    #[test]
    fn combined_flags_commit_with_both_times() {
        let resolution = resolve(
            &flags(true, true),
            Some(time(10, 45)),
            Some(time(17, 0)),
            None,
        );
        assert_eq!(
            resolution,
            Resolution::Commit {
                status: AttendanceStatus::LateAndLeftEarly,
                clock_in: Some(time(10, 45)),
                clock_out: Some(time(17, 0)),
                notes: None,
            }
        );
    }

    #[test]
    fn exclusive_pick_clears_flags_and_clock_times() {
        let resolution = resolve(&Selection::OnTime, Some(time(10, 45)), Some(time(17, 0)), None);
        assert_eq!(
            resolution,
            Resolution::Commit {
                status: AttendanceStatus::OnTime,
                clock_in: None,
                clock_out: None,
                notes: None,
            }
        );
    }

    #[test]
    fn no_show_keeps_notes_but_not_times() {
        let resolution = resolve(
            &Selection::NoShow,
            Some(time(10, 45)),
            None,
            Some("called in sick"),
        );
        assert_eq!(
            resolution,
            Resolution::Commit {
                status: AttendanceStatus::NoShow,
                clock_in: None,
                clock_out: None,
                notes: Some("called in sick".to_owned()),
            }
        );
    }

    #[test]
    fn on_time_drops_notes() {
        let resolution = resolve(&Selection::OnTime, None, None, Some("text"));
        assert_eq!(
            resolution,
            Resolution::Commit {
                status: AttendanceStatus::OnTime,
                clock_in: None,
                clock_out: None,
                notes: None,
            }
        );
    }
}
