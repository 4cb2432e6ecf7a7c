use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One diary entry as stored by the diary service. Read-only here:
/// the report engine never writes this table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DiaryEntry {
    pub id: i64,
    pub user_id: Uuid,
    pub entry_date: NaiveDate,
    pub content: String,
    pub tags: Option<Vec<String>>,
}
