use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 사용자 모델
// 자격 증명 검증은 외부 협력자 소관이므로 보관하지 않는다.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// 낙찰 기록
/// 사용자별 추가 전용 컬렉션: 한번 기록되면 변경되지 않는다.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WonAuction {
    pub id: i64,
    pub user_id: i64,
    pub auction_id: i64,
    pub amount: i64,
    pub won_at: DateTime<Utc>,
}
