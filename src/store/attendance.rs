//! Persistence-facing attendance operations: point fetch by day, whole
//! months fetched through the storage layer's fixed page cap, the
//! natural-key upsert, and hard delete.

use std::future::Future;

use chrono::{Months, NaiveDate, NaiveTime};
use sqlx::MySqlPool;
use tracing::debug;

use crate::error::AttendanceError;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};

/// Hard cap the storage layer puts on a single query response.
pub const PAGE_SIZE: u32 = 1000;

/// A validated calendar month. Both bounds are resolved at parse time so
/// later arithmetic cannot fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearMonth {
    first: NaiveDate,
    last: NaiveDate,
}

impl YearMonth {
    /// Parse `YYYY-MM`.
    pub fn parse(s: &str) -> Option<Self> {
        let (year, month) = s.split_once('-')?;
        let year: i32 = year.parse().ok()?;
        let month: u32 = month.parse().ok()?;
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
        Some(Self { first, last })
    }

    pub fn first_day(self) -> NaiveDate {
        self.first
    }

    pub fn last_day(self) -> NaiveDate {
        self.last
    }
}

/// Sequentially drain a range-paginated query: request pages of
/// `page_size` rows, advancing the offset after each full page, until a
/// short (or empty) page signals end-of-data.
pub(crate) async fn drain_pages<T, F, Fut>(
    page_size: u32,
    mut fetch_page: F,
) -> Result<Vec<T>, AttendanceError>
where
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = Result<Vec<T>, AttendanceError>>,
{
    let mut rows = Vec::new();
    let mut offset = 0u64;
    loop {
        let page = fetch_page(offset).await?;
        let fetched = page.len();
        rows.extend(page);
        if fetched < page_size as usize {
            break;
        }
        offset += u64::from(page_size);
    }
    Ok(rows)
}

/// Write parameters for the natural-key upsert. Fields are expected to
/// be pre-scrubbed to the status's relevance (core::status::scrub_fields).
#[derive(Debug, Clone)]
pub struct MarkAttendance {
    pub tenant_id: u64,
    pub team_member_id: u64,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub clock_in: Option<NaiveTime>,
    pub clock_out: Option<NaiveTime>,
    pub notes: Option<String>,
    pub recorded_by: u64,
}

const RECORD_COLUMNS: &str = "id, tenant_id, team_member_id, `date`, status, clock_in, clock_out, notes, recorded_by, created_at, updated_at";

#[derive(Clone)]
pub struct AttendanceStore {
    pool: MySqlPool,
}

impl AttendanceStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// All records for one day, newest first.
    pub async fn fetch_daily(
        &self,
        tenant_id: u64,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM attendance_records \
             WHERE tenant_id = ? AND `date` = ? \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(tenant_id)
            .bind(date)
            .fetch_all(&self.pool)
            .await
            .map_err(AttendanceError::Fetch)
    }

    /// Every record of the month, however many pages that takes. Pages
    /// are requested sequentially, date ascending, and accumulated until
    /// a short page ends the scan.
    pub async fn fetch_monthly(
        &self,
        tenant_id: u64,
        month: YearMonth,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        let first = month.first_day();
        let last = month.last_day();
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM attendance_records \
             WHERE tenant_id = ? AND `date` BETWEEN ? AND ? \
             ORDER BY `date` ASC, id ASC \
             LIMIT ? OFFSET ?"
        );

        let rows = drain_pages(PAGE_SIZE, |offset| {
            let pool = self.pool.clone();
            let sql = sql.clone();
            async move {
                sqlx::query_as::<_, AttendanceRecord>(&sql)
                    .bind(tenant_id)
                    .bind(first)
                    .bind(last)
                    .bind(PAGE_SIZE)
                    .bind(offset)
                    .fetch_all(&pool)
                    .await
                    .map_err(AttendanceError::Fetch)
            }
        })
        .await?;

        debug!(
            tenant_id,
            month = %first.format("%Y-%m"),
            rows = rows.len(),
            "Fetched monthly attendance"
        );
        Ok(rows)
    }

    pub async fn find_by_key(
        &self,
        tenant_id: u64,
        team_member_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, AttendanceError> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM attendance_records \
             WHERE tenant_id = ? AND team_member_id = ? AND `date` = ?"
        );
        sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(tenant_id)
            .bind(team_member_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await
            .map_err(AttendanceError::Fetch)
    }

    /// Idempotent upsert on `(tenant_id, team_member_id, date)`. A single
    /// atomic statement rides the table's unique key, so two
    /// near-simultaneous calls for the same new key cannot both insert.
    pub async fn mark_attendance(
        &self,
        params: MarkAttendance,
    ) -> Result<AttendanceRecord, AttendanceError> {
        sqlx::query(
            r#"
            INSERT INTO attendance_records
                (tenant_id, team_member_id, `date`, status, clock_in, clock_out, notes, recorded_by)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                status = VALUES(status),
                clock_in = VALUES(clock_in),
                clock_out = VALUES(clock_out),
                notes = VALUES(notes),
                recorded_by = VALUES(recorded_by)
            "#,
        )
        .bind(params.tenant_id)
        .bind(params.team_member_id)
        .bind(params.date)
        .bind(params.status)
        .bind(params.clock_in)
        .bind(params.clock_out)
        .bind(params.notes.as_deref())
        .bind(params.recorded_by)
        .execute(&self.pool)
        .await
        .map_err(AttendanceError::Write)?;

        self.find_by_key(params.tenant_id, params.team_member_id, params.date)
            .await?
            .ok_or(AttendanceError::NotFound)
    }

    /// Hard delete by primary id, tenant-scoped.
    pub async fn delete_attendance(
        &self,
        tenant_id: u64,
        id: u64,
    ) -> Result<(), AttendanceError> {
        let result = sqlx::query("DELETE FROM attendance_records WHERE tenant_id = ? AND id = ?")
            .bind(tenant_id)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AttendanceError::Write)?;

        if result.rows_affected() == 0 {
            return Err(AttendanceError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn dataset(total: usize) -> Vec<u32> {
        (0..total as u32).collect()
    }

    async fn drain(total: usize, page_size: u32) -> (Vec<u32>, u32) {
        let data = dataset(total);
        let calls = Cell::new(0u32);
        let rows = drain_pages(page_size, |offset| {
            calls.set(calls.get() + 1);
            let page: Vec<u32> = data
                .iter()
                .copied()
                .skip(offset as usize)
                .take(page_size as usize)
                .collect();
            async move { Ok(page) }
        })
        .await
        .unwrap();
        (rows, calls.get())
    }

    #[actix_web::test]
    async fn month_of_2500_rows_takes_three_pages() {
        let (rows, calls) = drain(2500, 1000).await;
        assert_eq!(rows.len(), 2500);
        assert_eq!(calls, 3);
        // Nothing dropped or duplicated across page seams.
        assert_eq!(rows, dataset(2500));
    }

    #[actix_web::test]
    async fn exact_multiple_stops_on_the_empty_page() {
        let (rows, calls) = drain(2000, 1000).await;
        assert_eq!(rows.len(), 2000);
        assert_eq!(calls, 3);
    }

    #[actix_web::test]
    async fn short_first_page_stops_immediately() {
        let (rows, calls) = drain(4, 1000).await;
        assert_eq!(rows.len(), 4);
        assert_eq!(calls, 1);
    }

    #[actix_web::test]
    async fn empty_month_is_a_single_request() {
        let (rows, calls) = drain(0, 1000).await;
        assert!(rows.is_empty());
        assert_eq!(calls, 1);
    }

    #[actix_web::test]
    async fn page_errors_propagate() {
        let result: Result<Vec<u32>, _> = drain_pages(10, |_| async {
            Err(AttendanceError::Fetch(sqlx::Error::PoolClosed))
        })
        .await;
        assert!(matches!(result, Err(AttendanceError::Fetch(_))));
    }

    #[test]
    fn year_month_bounds() {
        let march = YearMonth::parse("2026-03").unwrap();
        assert_eq!(march.first_day(), NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(march.last_day(), NaiveDate::from_ymd_opt(2026, 3, 31).unwrap());

        let december = YearMonth::parse("2025-12").unwrap();
        assert_eq!(december.last_day(), NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());

        let leap_february = YearMonth::parse("2024-02").unwrap();
        assert_eq!(leap_february.last_day(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn year_month_rejects_garbage() {
        assert!(YearMonth::parse("2026-13").is_none());
        assert!(YearMonth::parse("2026-00").is_none());
        assert!(YearMonth::parse("2026").is_none());
        assert!(YearMonth::parse("march 2026").is_none());
    }
}
