use crate::api::attendance::{
    DailyAttendanceResponse, FieldEditRequest, MarkAttendanceRequest, MonthlyAttendanceResponse,
    SelectionRequest,
};
use crate::api::report::{MemberVariance, MissedHoursReport};
use crate::core::overlay::DisplayState;
use crate::core::status::{FlagSet, MissingField, Selection};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance & Shift-Variance API",
        version = "1.0.0",
        description = r#"
## Staff Attendance Tracking

Attendance and schedule-variance service for the agency-management
platform.

### Key Features
- **Daily Attendance**
  - One canonical status per team member per day, resolved from the
    editing grid's `late` / `left_early` toggles and the exclusive
    `on_time` / `no_show` / `day_off` picks
- **Shift Variance**
  - Late and left-early hours against the assigned shift schedule,
    including shifts that span midnight
- **Monthly Views**
  - Whole-month fetches that transparently page past the storage
    layer's row cap
- **Auto-Save**
  - Keystroke-rate notes and clock-time edits are debounced per
    member/day; only the final value of a burst is persisted

### Caller Context
Every request must carry `X-Tenant-Id` and `X-Actor-Id` headers,
stamped on by the platform gateway. This service performs no
authentication of its own.

### Response Format
- JSON-based RESTful responses

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::list_daily,
        crate::api::attendance::list_monthly,
        crate::api::attendance::mark_attendance,
        crate::api::attendance::apply_selection,
        crate::api::attendance::edit_field,
        crate::api::attendance::display_state,
        crate::api::attendance::delete_attendance,

        crate::api::report::missed_hours,
    ),
    components(
        schemas(
            AttendanceRecord,
            AttendanceStatus,
            MarkAttendanceRequest,
            SelectionRequest,
            FieldEditRequest,
            Selection,
            FlagSet,
            MissingField,
            DisplayState,
            DailyAttendanceResponse,
            MonthlyAttendanceResponse,
            MemberVariance,
            MissedHoursReport
        )
    ),
    tags(
        (name = "Attendance", description = "Attendance editing and retrieval APIs"),
        (name = "Reports", description = "Derived shift-variance reporting APIs"),
    )
)]
pub struct ApiDoc;
