use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Canonical attendance status, stored as a snake_case string column.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    sqlx::Type,
    strum_macros::Display,
    strum_macros::EnumString,
    ToSchema,
)]
#[sqlx(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    OnTime,
    Late,
    LeftEarly,
    LateAndLeftEarly,
    NoShow,
    DayOff,
}

impl AttendanceStatus {
    /// Statuses whose variance is measured against the shift start.
    pub fn needs_clock_in(self) -> bool {
        matches!(self, Self::Late | Self::LateAndLeftEarly)
    }

    /// Statuses whose variance is measured against the shift end.
    pub fn needs_clock_out(self) -> bool {
        matches!(self, Self::LeftEarly | Self::LateAndLeftEarly)
    }

    /// Only absence-like statuses carry free-text notes.
    pub fn keeps_notes(self) -> bool {
        matches!(self, Self::NoShow | Self::DayOff)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 42,
        "tenant_id": 7,
        "team_member_id": 1003,
        "date": "2026-03-14",
        "status": "late",
        "clock_in": "10:45:00",
        "clock_out": null,
        "notes": null,
        "recorded_by": 12,
        "created_at": "2026-03-14T10:50:00Z",
        "updated_at": "2026-03-14T10:50:00Z"
    })
)]
pub struct AttendanceRecord {
    #[schema(example = 42)]
    pub id: u64,

    #[schema(example = 7)]
    pub tenant_id: u64,

    #[schema(example = 1003)]
    pub team_member_id: u64,

    #[schema(example = "2026-03-14", value_type = String, format = "date")]
    pub date: NaiveDate,

    pub status: AttendanceStatus,

    #[schema(example = "10:45:00", value_type = String, nullable = true)]
    pub clock_in: Option<NaiveTime>,

    #[schema(example = "17:00:00", value_type = String, nullable = true)]
    pub clock_out: Option<NaiveTime>,

    #[schema(example = "called in sick", nullable = true)]
    pub notes: Option<String>,

    #[schema(example = 12)]
    pub recorded_by: u64,

    #[schema(example = "2026-03-14T10:50:00Z", value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,

    #[schema(example = "2026-03-14T10:50:00Z", value_type = String, format = "date-time")]
    pub updated_at: Option<DateTime<Utc>>,
}
