use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    pub category_id: Option<Uuid>,
    /// Size of a pending upload, only meaningful for the `storage` feature.
    pub bytes: Option<i64>,
}
