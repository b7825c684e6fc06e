use std::collections::{BTreeMap, HashMap};

use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{error, warn};
use utoipa::{IntoParams, ToSchema};

use crate::api::{Caller, store_error_response};
use crate::core::variance::{ShiftWindow, minutes_to_hours, record_missed_minutes};
use crate::store::attendance::{AttendanceStore, YearMonth};
use crate::store::team_member::TeamMemberDirectory;
use crate::utils::shift_cache;

#[derive(Deserialize, IntoParams)]
pub struct ReportQuery {
    /// Calendar month, YYYY-MM
    pub month: String,
}

#[derive(Serialize, ToSchema)]
pub struct MemberVariance {
    #[schema(example = 1003)]
    pub team_member_id: u64,
    #[schema(example = "Jordan Pryce")]
    pub full_name: String,
    #[schema(example = "NIGHT", nullable = true)]
    pub shift_code: Option<String>,
    #[schema(example = 21)]
    pub records: u32,
    #[schema(example = 105)]
    pub missed_minutes: i64,
    #[schema(example = 1.75)]
    pub missed_hours: f64,
}

#[derive(Serialize, ToSchema)]
pub struct MissedHoursReport {
    #[schema(example = "2026-03")]
    pub month: String,
    pub data: Vec<MemberVariance>,
}

/// Combined lateness + early-departure hours per team member for one
/// month. Derived on request from the raw records; nothing here is
/// stored. Members without a shift assignment (or records missing their
/// required clock time) simply contribute zero.
#[utoipa::path(
    get,
    path = "/api/v1/attendance/report/missed-hours",
    params(ReportQuery),
    responses(
        (status = 200, description = "Variance aggregate for the month", body = MissedHoursReport),
        (status = 400, description = "Malformed month"),
        (status = 401, description = "Missing tenant/actor context"),
        (status = 500, description = "Fetch failed")
    ),
    tag = "Reports"
)]
pub async fn missed_hours(
    caller: Caller,
    store: web::Data<AttendanceStore>,
    directory: web::Data<TeamMemberDirectory>,
    pool: web::Data<MySqlPool>,
    query: web::Query<ReportQuery>,
) -> actix_web::Result<impl Responder> {
    let Some(month) = YearMonth::parse(&query.month) else {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "month must be formatted as YYYY-MM"
        })));
    };

    let records = match store.fetch_monthly(caller.tenant_id, month).await {
        Ok(records) => records,
        Err(e) => {
            error!(error = %e, month = %query.month, "Failed to fetch records for variance report");
            return Ok(store_error_response(&e));
        }
    };

    let members = match directory.list(caller.tenant_id).await {
        Ok(members) => members,
        Err(e) => {
            error!(error = %e, "Failed to load team member directory");
            return Ok(store_error_response(&e));
        }
    };
    let members: HashMap<u64, _> = members.into_iter().map(|m| (m.id, m)).collect();

    // Resolve each distinct shift code once through the schedule cache.
    let mut windows: HashMap<String, ShiftWindow> = HashMap::new();
    for member in members.values() {
        let Some(code) = member.shift_code.as_deref() else {
            continue;
        };
        if windows.contains_key(code) {
            continue;
        }
        match shift_cache::get_schedule(pool.get_ref(), code).await {
            Ok(Some(schedule)) => {
                windows.insert(code.to_owned(), schedule.window());
            }
            Ok(None) => {
                warn!(shift_code = code, "Unknown shift code on team member");
            }
            Err(e) => {
                error!(error = %e, shift_code = code, "Failed to resolve shift schedule");
                return Ok(store_error_response(&e));
            }
        }
    }

    let mut totals: BTreeMap<u64, (u32, i64)> = BTreeMap::new();
    for record in &records {
        let window = members
            .get(&record.team_member_id)
            .and_then(|m| m.shift_code.as_deref())
            .and_then(|code| windows.get(code))
            .copied();
        let entry = totals.entry(record.team_member_id).or_default();
        entry.0 += 1;
        entry.1 += record_missed_minutes(record, window);
    }

    let mut data: Vec<MemberVariance> = totals
        .into_iter()
        .map(|(team_member_id, (records, missed_minutes))| {
            let member = members.get(&team_member_id);
            MemberVariance {
                team_member_id,
                full_name: member.map(|m| m.full_name.clone()).unwrap_or_default(),
                shift_code: member.and_then(|m| m.shift_code.clone()),
                records,
                missed_minutes,
                missed_hours: minutes_to_hours(missed_minutes),
            }
        })
        .collect();
    data.sort_by(|a, b| {
        b.missed_minutes
            .cmp(&a.missed_minutes)
            .then_with(|| a.team_member_id.cmp(&b.team_member_id))
    });

    Ok(HttpResponse::Ok().json(MissedHoursReport {
        month: query.month.clone(),
        data,
    }))
}
