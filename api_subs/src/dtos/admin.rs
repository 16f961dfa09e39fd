use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ChangePlanRequest {
    pub plan_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ChangePlanResponse {
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub plan: String,
}

#[derive(Debug, Serialize)]
pub struct ClearCacheResponse {
    pub cleared: usize,
}
