use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

use crate::error::AttendanceError;
use crate::model::shift::ShiftSchedule;

/// Shift schedules are slow-moving reference data owned by the wider
/// platform, so a generous TTL is fine.
pub static SHIFT_CACHE: Lazy<Cache<String, ShiftSchedule>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(10_000)
        .time_to_live(Duration::from_secs(3600)) // 1h TTL
        .build()
});

/// Read-through lookup by shift code. An unknown code is cached nowhere
/// and simply yields `None` (variance math treats it as zero).
pub async fn get_schedule(
    pool: &MySqlPool,
    code: &str,
) -> Result<Option<ShiftSchedule>, AttendanceError> {
    if let Some(hit) = SHIFT_CACHE.get(code).await {
        return Ok(Some(hit));
    }

    let schedule = sqlx::query_as::<_, ShiftSchedule>(
        "SELECT code, start_time, end_time FROM shift_schedules WHERE code = ?",
    )
    .bind(code)
    .fetch_optional(pool)
    .await
    .map_err(AttendanceError::Fetch)?;

    if let Some(schedule) = &schedule {
        SHIFT_CACHE
            .insert(schedule.code.clone(), schedule.clone())
            .await;
    }
    Ok(schedule)
}

/// Load every shift schedule into the in-memory cache at startup.
pub async fn warmup_shift_cache(pool: &MySqlPool) -> Result<()> {
    let mut stream = sqlx::query_as::<_, ShiftSchedule>(
        "SELECT code, start_time, end_time FROM shift_schedules",
    )
    .fetch(pool);

    let mut total_count = 0usize;
    while let Some(row) = stream.next().await {
        let schedule = row?;
        SHIFT_CACHE
            .insert(schedule.code.clone(), schedule)
            .await;
        total_count += 1;
    }

    log::info!("Shift cache warmup complete: {} schedules", total_count);

    Ok(())
}
