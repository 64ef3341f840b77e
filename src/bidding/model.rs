use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 입찰 모델
// 기록된 이후 모든 필드 불변
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub id: i64,
    pub auction_id: i64,
    pub bidder_id: i64,
    pub amount: i64,
    #[serde(rename = "timestamp")]
    pub bid_time: DateTime<Utc>,
}
