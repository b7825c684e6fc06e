//! Read-only lookups against the staff directory owned by the wider
//! platform. Only the fields needed to resolve shift assignments are
//! selected.

use sqlx::MySqlPool;

use crate::error::AttendanceError;
use crate::model::team_member::TeamMember;

const MEMBER_COLUMNS: &str = "id, tenant_id, full_name, shift_code, is_active";

#[derive(Clone)]
pub struct TeamMemberDirectory {
    pool: MySqlPool,
}

impl TeamMemberDirectory {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn get(
        &self,
        tenant_id: u64,
        id: u64,
    ) -> Result<Option<TeamMember>, AttendanceError> {
        let sql = format!("SELECT {MEMBER_COLUMNS} FROM team_members WHERE tenant_id = ? AND id = ?");
        sqlx::query_as::<_, TeamMember>(&sql)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AttendanceError::Fetch)
    }

    pub async fn list(&self, tenant_id: u64) -> Result<Vec<TeamMember>, AttendanceError> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM team_members WHERE tenant_id = ? ORDER BY full_name ASC"
        );
        sqlx::query_as::<_, TeamMember>(&sql)
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AttendanceError::Fetch)
    }
}
