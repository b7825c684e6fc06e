use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::api::{Caller, store_error_response};
use crate::core::autosave::AutoSave;
use crate::error::AttendanceError;
use crate::core::overlay::{DisplayState, OverlayKey, OverlayRegistry, project};
use crate::core::status::{self, FlagSet, Resolution, Selection};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::store::attendance::{AttendanceStore, MarkAttendance, YearMonth};

#[derive(Deserialize, ToSchema)]
pub struct MarkAttendanceRequest {
    #[schema(example = 1003)]
    pub team_member_id: u64,
    #[schema(example = "2026-03-14", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "late")]
    pub status: AttendanceStatus,
    #[schema(example = "10:45:00", value_type = String, nullable = true)]
    pub clock_in: Option<NaiveTime>,
    #[schema(example = "17:00:00", value_type = String, nullable = true)]
    pub clock_out: Option<NaiveTime>,
    #[schema(example = "called in sick", nullable = true)]
    pub notes: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct SelectionRequest {
    #[schema(example = 1003)]
    pub team_member_id: u64,
    #[schema(example = "2026-03-14", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub selection: Selection,
}

/// Field-level edit; only the provided fields are touched. These fire at
/// keystroke rate from the editing grid, so persistence is debounced.
#[derive(Deserialize, ToSchema)]
pub struct FieldEditRequest {
    #[schema(example = 1003)]
    pub team_member_id: u64,
    #[schema(example = "2026-03-14", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "10:45:00", value_type = String, nullable = true)]
    pub clock_in: Option<NaiveTime>,
    #[schema(example = "17:00:00", value_type = String, nullable = true)]
    pub clock_out: Option<NaiveTime>,
    #[schema(example = "called in sick", nullable = true)]
    pub notes: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct DailyQuery {
    /// Calendar day, YYYY-MM-DD
    #[param(value_type = String, example = "2026-03-14")]
    pub date: NaiveDate,
}

#[derive(Deserialize, IntoParams)]
pub struct MonthlyQuery {
    /// Calendar month, YYYY-MM
    pub month: String,
}

#[derive(Deserialize, IntoParams)]
pub struct StateQuery {
    #[param(example = 1003)]
    pub team_member_id: u64,
    /// Calendar day, YYYY-MM-DD
    #[param(value_type = String, example = "2026-03-14")]
    pub date: NaiveDate,
}

#[derive(Serialize, ToSchema)]
pub struct DailyAttendanceResponse {
    #[schema(example = "2026-03-14", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub data: Vec<AttendanceRecord>,
}

#[derive(Serialize, ToSchema)]
pub struct MonthlyAttendanceResponse {
    #[schema(example = "2026-03")]
    pub month: String,
    #[schema(example = 2500)]
    pub total: usize,
    pub data: Vec<AttendanceRecord>,
}

/// Directly persist a canonical status for one member/day. The upsert is
/// keyed on `(team_member_id, date)`, so repeating the call can never
/// produce a second record.
#[utoipa::path(
    post,
    path = "/api/v1/attendance",
    request_body = MarkAttendanceRequest,
    responses(
        (status = 200, description = "Record upserted", body = AttendanceRecord),
        (status = 401, description = "Missing tenant/actor context"),
        (status = 500, description = "Write failed")
    ),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    caller: Caller,
    store: web::Data<AttendanceStore>,
    payload: web::Json<MarkAttendanceRequest>,
) -> actix_web::Result<impl Responder> {
    let payload = payload.into_inner();
    // Fields the status does not carry are forced to NULL on write.
    let (clock_in, clock_out, notes) = status::scrub_fields(
        payload.status,
        payload.clock_in,
        payload.clock_out,
        payload.notes.as_deref(),
    );

    let result = store
        .mark_attendance(MarkAttendance {
            tenant_id: caller.tenant_id,
            team_member_id: payload.team_member_id,
            date: payload.date,
            status: payload.status,
            clock_in,
            clock_out,
            notes,
            recorded_by: caller.actor_id,
        })
        .await;

    match result {
        Ok(record) => Ok(HttpResponse::Ok().json(record)),
        Err(e) => {
            error!(error = %e, team_member_id = payload.team_member_id, date = %payload.date, "Failed to mark attendance");
            Ok(store_error_response(&e))
        }
    }
}

/// Apply one editing gesture: a toggle-set change or an exclusive status
/// pick. Exclusive picks and satisfied toggle sets persist immediately;
/// a toggle set still missing its clock time(s) is held locally and
/// reported back via `missing` (this is not an error).
#[utoipa::path(
    put,
    path = "/api/v1/attendance/selection",
    request_body = SelectionRequest,
    responses(
        (status = 200, description = "Resulting display state", body = DisplayState),
        (status = 401, description = "Missing tenant/actor context"),
        (status = 500, description = "Write failed")
    ),
    tag = "Attendance"
)]
pub async fn apply_selection(
    caller: Caller,
    store: web::Data<AttendanceStore>,
    overlay: web::Data<OverlayRegistry>,
    autosave: web::Data<AutoSave>,
    payload: web::Json<SelectionRequest>,
) -> actix_web::Result<impl Responder> {
    let payload = payload.into_inner();
    let key: OverlayKey = (caller.tenant_id, payload.team_member_id, payload.date);

    let record = match store
        .find_by_key(caller.tenant_id, payload.team_member_id, payload.date)
        .await
    {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, team_member_id = payload.team_member_id, "Failed to load record for selection");
            return Ok(store_error_response(&e));
        }
    };

    // Record the gesture in the overlay first so the merged view the
    // state machine sees is the one the user is looking at.
    let selected_flags = match &payload.selection {
        Selection::Flags { late, left_early } => Some(FlagSet {
            late: *late,
            left_early: *left_early,
        }),
        _ => Some(FlagSet::default()),
    };
    let pending = overlay.update(key, record.is_some(), |entry| {
        entry.flags = selected_flags;
        if !matches!(payload.selection, Selection::Flags { .. }) {
            // Exclusive picks discard any clock times typed so far.
            entry.clock_in = None;
            entry.clock_out = None;
        }
    });

    let merged = project(
        payload.team_member_id,
        payload.date,
        record.as_ref(),
        Some(&pending),
    );

    match status::resolve(
        &payload.selection,
        merged.clock_in,
        merged.clock_out,
        merged.notes.as_deref(),
    ) {
        Resolution::Commit {
            status,
            clock_in,
            clock_out,
            notes,
        } => {
            let result = store
                .mark_attendance(MarkAttendance {
                    tenant_id: caller.tenant_id,
                    team_member_id: payload.team_member_id,
                    date: payload.date,
                    status,
                    clock_in,
                    clock_out,
                    notes: notes.clone(),
                    recorded_by: caller.actor_id,
                })
                .await;

            match result {
                Ok(fresh) => {
                    // The write supersedes any debounced commit in flight.
                    autosave.cancel(&key);
                    overlay.update(key, true, |entry| {
                        entry.flags = Some(FlagSet::from_status(status));
                        entry.clock_in = clock_in;
                        entry.clock_out = clock_out;
                        entry.notes = notes;
                    });
                    overlay.settle(&key);

                    let state = project(
                        payload.team_member_id,
                        payload.date,
                        Some(&fresh),
                        overlay.get(&key).as_ref(),
                    );
                    Ok(HttpResponse::Ok().json(state))
                }
                Err(e) => {
                    error!(error = %e, team_member_id = payload.team_member_id, date = %payload.date, "Failed to persist selection");
                    Ok(store_error_response(&e))
                }
            }
        }
        // Held or unset: nothing persisted, the overlay keeps the gesture.
        Resolution::Hold { .. } | Resolution::Unset => Ok(HttpResponse::Ok().json(merged)),
    }
}

/// Free-text / clock-time edit. The overlay is updated synchronously so
/// the caller can render the keystroke immediately; the write is
/// debounced per member/day and re-reads the overlay when it fires, so a
/// burst of edits lands as one write carrying the final value.
#[utoipa::path(
    patch,
    path = "/api/v1/attendance/field",
    request_body = FieldEditRequest,
    responses(
        (status = 200, description = "Display state with the pending edit applied", body = DisplayState),
        (status = 401, description = "Missing tenant/actor context"),
        (status = 500, description = "Fetch failed")
    ),
    tag = "Attendance"
)]
pub async fn edit_field(
    caller: Caller,
    store: web::Data<AttendanceStore>,
    overlay: web::Data<OverlayRegistry>,
    autosave: web::Data<AutoSave>,
    payload: web::Json<FieldEditRequest>,
) -> actix_web::Result<impl Responder> {
    let payload = payload.into_inner();
    let key: OverlayKey = (caller.tenant_id, payload.team_member_id, payload.date);

    let record = match store
        .find_by_key(caller.tenant_id, payload.team_member_id, payload.date)
        .await
    {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, team_member_id = payload.team_member_id, "Failed to load record for field edit");
            return Ok(store_error_response(&e));
        }
    };

    let pending = overlay.update(key, record.is_some(), |entry| {
        if let Some(clock_in) = payload.clock_in {
            entry.clock_in = Some(clock_in);
        }
        if let Some(clock_out) = payload.clock_out {
            entry.clock_out = Some(clock_out);
        }
        if let Some(notes) = &payload.notes {
            entry.notes = Some(notes.clone());
        }
    });

    let actor_id = caller.actor_id;
    let store_for_commit = store.get_ref().clone();
    let overlay_for_commit = overlay.clone();
    autosave.schedule(key, async move {
        commit_pending(&store_for_commit, overlay_for_commit.get_ref(), key, actor_id).await;
    });

    let state = project(
        payload.team_member_id,
        payload.date,
        record.as_ref(),
        Some(&pending),
    );
    Ok(HttpResponse::Ok().json(state))
}

/// Merged view of the persisted record and any uncommitted local edits.
#[utoipa::path(
    get,
    path = "/api/v1/attendance/state",
    params(StateQuery),
    responses(
        (status = 200, description = "Display state", body = DisplayState),
        (status = 401, description = "Missing tenant/actor context"),
        (status = 500, description = "Fetch failed")
    ),
    tag = "Attendance"
)]
pub async fn display_state(
    caller: Caller,
    store: web::Data<AttendanceStore>,
    overlay: web::Data<OverlayRegistry>,
    query: web::Query<StateQuery>,
) -> actix_web::Result<impl Responder> {
    let key: OverlayKey = (caller.tenant_id, query.team_member_id, query.date);

    let record = match store
        .find_by_key(caller.tenant_id, query.team_member_id, query.date)
        .await
    {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, team_member_id = query.team_member_id, "Failed to load display state");
            return Ok(store_error_response(&e));
        }
    };

    let state = project(
        query.team_member_id,
        query.date,
        record.as_ref(),
        overlay.get(&key).as_ref(),
    );
    Ok(HttpResponse::Ok().json(state))
}

/// All records for one day, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/attendance",
    params(DailyQuery),
    responses(
        (status = 200, description = "Records for the day", body = DailyAttendanceResponse),
        (status = 401, description = "Missing tenant/actor context"),
        (status = 500, description = "Fetch failed")
    ),
    tag = "Attendance"
)]
pub async fn list_daily(
    caller: Caller,
    store: web::Data<AttendanceStore>,
    query: web::Query<DailyQuery>,
) -> actix_web::Result<impl Responder> {
    match store.fetch_daily(caller.tenant_id, query.date).await {
        Ok(data) => Ok(HttpResponse::Ok().json(DailyAttendanceResponse {
            date: query.date,
            data,
        })),
        Err(e) => {
            error!(error = %e, date = %query.date, "Failed to fetch daily attendance");
            Ok(store_error_response(&e))
        }
    }
}

/// The whole month, however many storage pages that takes.
#[utoipa::path(
    get,
    path = "/api/v1/attendance/monthly",
    params(MonthlyQuery),
    responses(
        (status = 200, description = "Records for the month", body = MonthlyAttendanceResponse),
        (status = 400, description = "Malformed month"),
        (status = 401, description = "Missing tenant/actor context"),
        (status = 500, description = "Fetch failed")
    ),
    tag = "Attendance"
)]
pub async fn list_monthly(
    caller: Caller,
    store: web::Data<AttendanceStore>,
    query: web::Query<MonthlyQuery>,
) -> actix_web::Result<impl Responder> {
    let Some(month) = YearMonth::parse(&query.month) else {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "month must be formatted as YYYY-MM"
        })));
    };

    match store.fetch_monthly(caller.tenant_id, month).await {
        Ok(data) => Ok(HttpResponse::Ok().json(MonthlyAttendanceResponse {
            month: query.month.clone(),
            total: data.len(),
            data,
        })),
        Err(e) => {
            error!(error = %e, month = %query.month, "Failed to fetch monthly attendance");
            Ok(store_error_response(&e))
        }
    }
}

/// Hard delete by record id.
#[utoipa::path(
    delete,
    path = "/api/v1/attendance/{id}",
    params(
        ("id" = u64, Path, description = "Attendance record id")
    ),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Successfully deleted"
        })),
        (status = 401, description = "Missing tenant/actor context"),
        (status = 404, description = "Attendance record not found"),
        (status = 500, description = "Delete failed")
    ),
    tag = "Attendance"
)]
pub async fn delete_attendance(
    caller: Caller,
    store: web::Data<AttendanceStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();

    match store.delete_attendance(caller.tenant_id, id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "message": "Successfully deleted"
        }))),
        Err(e) => {
            if !matches!(e, AttendanceError::NotFound) {
                error!(error = %e, id, "Failed to delete attendance record");
            }
            Ok(store_error_response(&e))
        }
    }
}

/// Debounced commit body: runs when the per-entity timer fires, re-reads
/// the overlay and record as they are *now*, and persists only if the
/// merged state resolves to a committable status.
pub(crate) async fn commit_pending(
    store: &AttendanceStore,
    overlay: &OverlayRegistry,
    key: OverlayKey,
    recorded_by: u64,
) {
    let (tenant_id, team_member_id, date) = key;

    let record = match store.find_by_key(tenant_id, team_member_id, date).await {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, team_member_id, %date, "Auto-save fetch failed");
            return;
        }
    };
    let Some(pending) = overlay.get(&key) else {
        return;
    };

    let state = project(team_member_id, date, record.as_ref(), Some(&pending));
    let Some(selection) = selection_from_state(&state) else {
        return;
    };

    match status::resolve(
        &selection,
        state.clock_in,
        state.clock_out,
        state.notes.as_deref(),
    ) {
        Resolution::Commit {
            status,
            clock_in,
            clock_out,
            notes,
        } => {
            let result = store
                .mark_attendance(MarkAttendance {
                    tenant_id,
                    team_member_id,
                    date,
                    status,
                    clock_in,
                    clock_out,
                    notes,
                    recorded_by,
                })
                .await;
            match result {
                Ok(_) => overlay.settle(&key),
                Err(e) => {
                    // Left pending; the next edit re-arms the timer and
                    // retries the same idempotent upsert.
                    error!(error = %e, team_member_id, %date, "Auto-save write failed");
                }
            }
        }
        Resolution::Hold { .. } | Resolution::Unset => {}
    }
}

/// Reconstruct the active selection from a merged display state: live
/// toggles win, otherwise a persisted exclusive status is re-affirmed
/// (this is how a notes edit on a `NoShow` day finds its way back to the
/// upsert).
fn selection_from_state(state: &DisplayState) -> Option<Selection> {
    if !state.flags.is_empty() {
        return Some(Selection::Flags {
            late: state.flags.late,
            left_early: state.flags.left_early,
        });
    }
    match state.status? {
        AttendanceStatus::OnTime => Some(Selection::OnTime),
        AttendanceStatus::NoShow => Some(Selection::NoShow),
        AttendanceStatus::DayOff => Some(Selection::DayOff),
        _ => None,
    }
}
