use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::variance::ShiftWindow;

/// Named work schedule. Reference data owned by the wider platform;
/// this service only reads it. `end_time` may be numerically earlier
/// than `start_time` for shifts that span midnight.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "code": "NIGHT",
        "start_time": "18:00:00",
        "end_time": "02:00:00"
    })
)]
pub struct ShiftSchedule {
    #[schema(example = "NIGHT")]
    pub code: String,

    #[schema(example = "18:00:00", value_type = String)]
    pub start_time: NaiveTime,

    #[schema(example = "02:00:00", value_type = String)]
    pub end_time: NaiveTime,
}

impl ShiftSchedule {
    pub fn window(&self) -> ShiftWindow {
        ShiftWindow::new(self.start_time, self.end_time)
    }
}
