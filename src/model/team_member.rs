use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Staff directory entry, owned by the surrounding platform.
/// Read here only to resolve the shift assignment for variance math.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct TeamMember {
    #[schema(example = 1003)]
    pub id: u64,

    #[schema(example = 7)]
    pub tenant_id: u64,

    #[schema(example = "Jordan Pryce")]
    pub full_name: String,

    #[schema(example = "NIGHT", nullable = true)]
    pub shift_code: Option<String>,

    pub is_active: bool,
}
