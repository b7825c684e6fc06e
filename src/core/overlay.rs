//! Two-layer display model: the immutable persisted record plus an
//! uncommitted per-member overlay of local edits, merged by a pure
//! projection. The overlay holds flag selections that are still gated on
//! a missing clock time, and field edits waiting on the autosave timer.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use utoipa::ToSchema;

use crate::core::status::{self, FlagSet, MissingField, Resolution, Selection};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};

/// Natural key of one editable attendance cell.
pub type OverlayKey = (u64, u64, NaiveDate);

/// Uncommitted local edits for one `(tenant, team member, date)` cell.
/// `None` fields mean "no pending edit, fall through to the record".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingEdit {
    pub flags: Option<FlagSet>,
    pub clock_in: Option<NaiveTime>,
    pub clock_out: Option<NaiveTime>,
    pub notes: Option<String>,
    /// Whether a persisted record already existed when the edit began.
    /// Governs whether the overlay survives the eventual write.
    pub record_existed: bool,
}

/// What a caller should render for one cell: persisted data with any
/// pending edits layered on top.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DisplayState {
    #[schema(example = 1003)]
    pub team_member_id: u64,

    #[schema(example = "2026-03-14", value_type = String, format = "date")]
    pub date: NaiveDate,

    /// Canonical status implied by the merged view; `None` while unset.
    /// A still-gated flag selection keeps its implied status here with
    /// the gap reported in `missing`.
    pub status: Option<AttendanceStatus>,

    pub flags: FlagSet,

    #[schema(example = "10:45:00", value_type = String, nullable = true)]
    pub clock_in: Option<NaiveTime>,

    #[schema(example = "17:00:00", value_type = String, nullable = true)]
    pub clock_out: Option<NaiveTime>,

    #[schema(nullable = true)]
    pub notes: Option<String>,

    /// Clock times still required before the current flag selection can
    /// be persisted.
    pub missing: Vec<MissingField>,

    /// True while the merged view differs from what is persisted.
    pub pending: bool,

    #[schema(nullable = true)]
    pub record_id: Option<u64>,
}

/// Merge a persisted record with the pending overlay. Overlay fields win
/// field-wise; toggles fall back to the projection of the stored status.
pub fn project(
    team_member_id: u64,
    date: NaiveDate,
    record: Option<&AttendanceRecord>,
    overlay: Option<&PendingEdit>,
) -> DisplayState {
    let record_flags = record
        .map(|r| FlagSet::from_status(r.status))
        .unwrap_or_default();
    let flags = overlay.and_then(|o| o.flags).unwrap_or(record_flags);

    let clock_in = overlay
        .and_then(|o| o.clock_in)
        .or_else(|| record.and_then(|r| r.clock_in));
    let clock_out = overlay
        .and_then(|o| o.clock_out)
        .or_else(|| record.and_then(|r| r.clock_out));
    let notes = overlay
        .and_then(|o| o.notes.clone())
        .or_else(|| record.and_then(|r| r.notes.clone()));

    // A non-empty toggle set dominates; an empty set falls back to a
    // persisted exclusive status (a cleared toggle never resurrects a
    // stored flag status).
    let status = flags.canonical_status().or_else(|| {
        record
            .map(|r| r.status)
            .filter(|s| FlagSet::from_status(*s).is_empty())
    });

    let missing = match status::resolve(
        &Selection::Flags {
            late: flags.late,
            left_early: flags.left_early,
        },
        clock_in,
        clock_out,
        notes.as_deref(),
    ) {
        Resolution::Hold { missing } => missing,
        _ => Vec::new(),
    };

    let pending = match record {
        Some(r) => {
            flags != record_flags
                || clock_in != r.clock_in
                || clock_out != r.clock_out
                || notes != r.notes
        }
        None => {
            !flags.is_empty() || clock_in.is_some() || clock_out.is_some() || notes.is_some()
        }
    };

    DisplayState {
        team_member_id,
        date,
        status,
        flags,
        clock_in,
        clock_out,
        notes,
        missing,
        pending,
        record_id: record.map(|r| r.id),
    }
}

/// In-memory registry of pending edits, keyed by the natural key. The
/// lock is only ever held for map access, never across an await.
#[derive(Debug, Default)]
pub struct OverlayRegistry {
    entries: Mutex<HashMap<OverlayKey, PendingEdit>>,
}

impl OverlayRegistry {
    pub fn get(&self, key: &OverlayKey) -> Option<PendingEdit> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    /// Apply an edit to the entry for `key`, creating it if absent.
    /// `record_existed` is only consulted on creation.
    pub fn update<F>(&self, key: OverlayKey, record_existed: bool, edit: F) -> PendingEdit
    where
        F: FnOnce(&mut PendingEdit),
    {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.entry(key).or_insert_with(|| PendingEdit {
            record_existed,
            ..PendingEdit::default()
        });
        edit(entry);
        entry.clone()
    }

    /// Settle the overlay after a successful write: entries for records
    /// that already existed are retained (so a refreshed server copy
    /// racing the local edit cannot flicker), entries for rows created by
    /// this flow are cleared.
    pub fn settle(&self, key: &OverlayKey) {
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.get_mut(key) {
            if entry.record_existed {
                return;
            }
            entries.remove(key);
        }
    }

    pub fn clear(&self, key: &OverlayKey) {
        self.entries.lock().unwrap().remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    fn key() -> OverlayKey {
        (7, 1003, date())
    }

    fn late_record() -> AttendanceRecord {
        AttendanceRecord {
            id: 42,
            tenant_id: 7,
            team_member_id: 1003,
            date: date(),
            status: AttendanceStatus::Late,
            clock_in: Some(time(10, 45)),
            clock_out: None,
            notes: None,
            recorded_by: 12,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn bare_record_projects_its_own_fields() {
        let record = late_record();
        let state = project(1003, date(), Some(&record), None);
        assert_eq!(state.status, Some(AttendanceStatus::Late));
        assert_eq!(state.flags, FlagSet { late: true, left_early: false });
        assert_eq!(state.clock_in, Some(time(10, 45)));
        assert!(!state.pending);
        assert!(state.missing.is_empty());
        assert_eq!(state.record_id, Some(42));
    }

    #[test]
    fn overlay_fields_win_over_record_fields() {
        let record = late_record();
        let overlay = PendingEdit {
            clock_in: Some(time(11, 15)),
            record_existed: true,
            ..PendingEdit::default()
        };
        let state = project(1003, date(), Some(&record), Some(&overlay));
        assert_eq!(state.clock_in, Some(time(11, 15)));
        assert!(state.pending);
    }

    #[test]
    fn gated_flag_selection_reports_missing_times() {
        let overlay = PendingEdit {
            flags: Some(FlagSet { late: true, left_early: true }),
            clock_in: Some(time(10, 45)),
            record_existed: false,
            ..PendingEdit::default()
        };
        let state = project(1003, date(), None, Some(&overlay));
        assert_eq!(state.status, Some(AttendanceStatus::LateAndLeftEarly));
        assert_eq!(state.missing, vec![MissingField::ClockOut]);
        assert!(state.pending);
        assert_eq!(state.record_id, None);
    }

    #[test]
    fn cleared_flags_do_not_resurrect_a_stored_flag_status() {
        let record = late_record();
        let overlay = PendingEdit {
            flags: Some(FlagSet::default()),
            record_existed: true,
            ..PendingEdit::default()
        };
        let state = project(1003, date(), Some(&record), Some(&overlay));
        assert_eq!(state.status, None);
        assert!(state.pending);
    }

    #[test]
    fn exclusive_status_shows_through_empty_flags() {
        let mut record = late_record();
        record.status = AttendanceStatus::NoShow;
        record.clock_in = None;
        record.notes = Some("called in sick".into());
        let state = project(1003, date(), Some(&record), None);
        assert_eq!(state.status, Some(AttendanceStatus::NoShow));
        assert_eq!(state.notes.as_deref(), Some("called in sick"));
    }

    #[test]
    fn settle_retains_overlay_for_preexisting_records() {
        let registry = OverlayRegistry::default();
        registry.update(key(), true, |e| e.notes = Some("draft".into()));
        registry.settle(&key());
        assert!(registry.get(&key()).is_some());
    }

    #[test]
    fn settle_clears_overlay_for_rows_created_by_the_flow() {
        let registry = OverlayRegistry::default();
        registry.update(key(), false, |e| e.notes = Some("draft".into()));
        registry.settle(&key());
        assert!(registry.get(&key()).is_none());
    }

    #[test]
    fn update_preserves_record_existed_on_later_edits() {
        let registry = OverlayRegistry::default();
        registry.update(key(), false, |e| e.notes = Some("a".into()));
        let entry = registry.update(key(), true, |e| e.notes = Some("b".into()));
        assert!(!entry.record_existed);
        assert_eq!(entry.notes.as_deref(), Some("b"));
    }
}
