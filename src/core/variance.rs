//! Shift-variance math: how late someone clocked in, or how early they
//! clocked out, against the nominal shift boundaries. Everything works in
//! minutes-since-midnight; overnight shifts are handled by shift-relative
//! normalization (+1440 on the side that crossed midnight), never by
//! calendar-day arithmetic.

use chrono::{NaiveTime, Timelike};

use crate::model::attendance::AttendanceRecord;

pub const MINUTES_PER_DAY: i64 = 1440;

/// Nominal shift boundaries as minutes-since-midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftWindow {
    start: i64,
    end: i64,
}

/// Which shift boundary an observation is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Start,
    End,
}

fn minutes_since_midnight(t: NaiveTime) -> i64 {
    i64::from(t.num_seconds_from_midnight()) / 60
}

impl ShiftWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            start: minutes_since_midnight(start),
            end: minutes_since_midnight(end),
        }
    }

    /// End numerically before start means the shift runs across midnight.
    pub fn wraps_midnight(&self) -> bool {
        self.end < self.start
    }
}

/// Positive variance in minutes at one boundary, clamped at zero.
///
/// For a wrapping shift the end boundary is pushed a day forward, and an
/// observed time that numerically precedes the start is treated as
/// belonging to the shift's next-day segment. Early clock-ins and late
/// clock-outs therefore never produce negative values.
pub fn boundary_variance_minutes(shift: ShiftWindow, observed: NaiveTime, boundary: Boundary) -> i64 {
    let raw = minutes_since_midnight(observed);

    match boundary {
        Boundary::Start => {
            let observed = if shift.wraps_midnight() && raw <= shift.end {
                raw + MINUTES_PER_DAY
            } else {
                raw
            };
            (observed - shift.start).max(0)
        }
        Boundary::End => {
            let (scheduled_end, observed) = if shift.wraps_midnight() {
                let observed = if raw < shift.start { raw + MINUTES_PER_DAY } else { raw };
                (shift.end + MINUTES_PER_DAY, observed)
            } else {
                (shift.end, raw)
            };
            (scheduled_end - observed).max(0)
        }
    }
}

pub fn late_minutes(shift: ShiftWindow, clock_in: NaiveTime) -> i64 {
    boundary_variance_minutes(shift, clock_in, Boundary::Start)
}

pub fn early_minutes(shift: ShiftWindow, clock_out: NaiveTime) -> i64 {
    boundary_variance_minutes(shift, clock_out, Boundary::End)
}

/// Combined lateness + early departure for one record.
///
/// A missing shift assignment or a missing required clock time contributes
/// zero rather than an error; only the boundaries the status actually
/// implicates are evaluated.
pub fn record_missed_minutes(record: &AttendanceRecord, shift: Option<ShiftWindow>) -> i64 {
    let Some(shift) = shift else {
        return 0;
    };

    let mut minutes = 0;
    if record.status.needs_clock_in() {
        if let Some(clock_in) = record.clock_in {
            minutes += late_minutes(shift, clock_in);
        }
    }
    if record.status.needs_clock_out() {
        if let Some(clock_out) = record.clock_out {
            minutes += early_minutes(shift, clock_out);
        }
    }
    minutes
}

pub fn minutes_to_hours(minutes: i64) -> f64 {
    minutes as f64 / 60.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::AttendanceStatus;
    use chrono::NaiveDate;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn day_shift() -> ShiftWindow {
        ShiftWindow::new(time(10, 0), time(18, 0))
    }

    fn night_shift() -> ShiftWindow {
        ShiftWindow::new(time(18, 0), time(2, 0))
    }

    fn record(
        status: AttendanceStatus,
        clock_in: Option<NaiveTime>,
        clock_out: Option<NaiveTime>,
    ) -> AttendanceRecord {
        AttendanceRecord {
            id: 1,
            tenant_id: 1,
            team_member_id: 1,
            date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            status,
            clock_in,
            clock_out,
            notes: None,
            recorded_by: 1,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn late_clock_in_on_plain_shift() {
        assert_eq!(late_minutes(day_shift(), time(10, 45)), 45);
    }

    #[test]
    fn early_clock_in_is_clamped_to_zero() {
        let shift = ShiftWindow::new(time(2, 0), time(10, 0));
        assert_eq!(late_minutes(shift, time(1, 30)), 0);
    }

    #[test]
    fn early_departure_on_plain_shift() {
        assert_eq!(early_minutes(day_shift(), time(17, 0)), 60);
    }

    #[test]
    fn overnight_clock_out_after_midnight() {
        // 18:00-02:00 shift, out at 01:00: one hour short, not a negative
        // raw subtraction.
        assert_eq!(early_minutes(night_shift(), time(1, 0)), 60);
    }

    #[test]
    fn overnight_clock_out_before_midnight() {
        assert_eq!(early_minutes(night_shift(), time(23, 0)), 180);
    }

    #[test]
    fn overnight_overstay_is_clamped() {
        assert_eq!(early_minutes(night_shift(), time(2, 30)), 0);
    }

    #[test]
    fn overnight_clock_in_after_midnight_counts_from_start() {
        // Clocking in at 01:00 belongs to the next-day segment of the
        // shift: 7 hours after the 18:00 start.
        assert_eq!(late_minutes(night_shift(), time(1, 0)), 420);
    }

    #[test]
    fn overnight_clock_in_before_start_same_evening() {
        assert_eq!(late_minutes(night_shift(), time(17, 30)), 0);
    }

    #[test]
    fn missed_minutes_for_late_and_left_early() {
        let rec = record(
            AttendanceStatus::LateAndLeftEarly,
            Some(time(10, 45)),
            Some(time(17, 0)),
        );
        assert_eq!(record_missed_minutes(&rec, Some(day_shift())), 105);
    }

    #[test]
    fn missed_minutes_without_shift_assignment_is_zero() {
        let rec = record(AttendanceStatus::Late, Some(time(10, 45)), None);
        assert_eq!(record_missed_minutes(&rec, None), 0);
    }

    #[test]
    fn missed_minutes_without_required_clock_is_zero() {
        let rec = record(AttendanceStatus::Late, None, None);
        assert_eq!(record_missed_minutes(&rec, Some(day_shift())), 0);
    }

    #[test]
    fn missed_minutes_ignores_irrelevant_boundaries() {
        // Clock-out present but the status only implicates the start.
        let rec = record(AttendanceStatus::Late, Some(time(10, 45)), Some(time(12, 0)));
        assert_eq!(record_missed_minutes(&rec, Some(day_shift())), 45);
    }

    #[test]
    fn fractional_hours() {
        assert_eq!(minutes_to_hours(45), 0.75);
        assert_eq!(minutes_to_hours(0), 0.0);
    }
}
