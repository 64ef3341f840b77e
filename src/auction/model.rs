// region:    --- Imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use std::fmt;
use std::str::FromStr;

// endregion: --- Imports

// region:    --- Auction Status
/// 경매 상태
/// upcoming -> active -> ended 순방향 전이만 허용
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuctionStatus {
    Upcoming,
    Active,
    Ended,
}

impl AuctionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionStatus::Upcoming => "upcoming",
            AuctionStatus::Active => "active",
            AuctionStatus::Ended => "ended",
        }
    }
}

impl fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuctionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(AuctionStatus::Upcoming),
            "active" => Ok(AuctionStatus::Active),
            "ended" => Ok(AuctionStatus::Ended),
            other => Err(format!("알 수 없는 경매 상태: {}", other)),
        }
    }
}
// endregion: --- Auction Status

// region:    --- Auction Model
/// 경매 모델
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Auction {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// 외부 이미지 호스팅 참조 (핵심 로직에서는 불투명 문자열)
    pub item_image: Option<String>,
    pub base_price: i64,
    /// 단조 증가, base_price로 초기화
    pub current_price: i64,
    pub start_time: DateTime<Utc>,
    pub status: AuctionStatus,
    pub created_by: i64,
    /// 입찰했거나 참여한 사용자 (단조 증가 집합)
    pub participants: Vec<i64>,
    /// 시작 전 참가 신청한 사용자 (경매당 1회)
    pub registrations: Vec<i64>,
    /// 종료 시점에만 설정되고 이후 불변
    pub winner: Option<i64>,
    pub winning_bid: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for Auction {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        let status = AuctionStatus::from_str(&status).map_err(|e| sqlx::Error::ColumnDecode {
            index: "status".into(),
            source: e.into(),
        })?;
        Ok(Auction {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            item_image: row.try_get("item_image")?,
            base_price: row.try_get("base_price")?,
            current_price: row.try_get("current_price")?,
            start_time: row.try_get("start_time")?,
            status,
            created_by: row.try_get("created_by")?,
            participants: row.try_get("participants")?,
            registrations: row.try_get("registrations")?,
            winner: row.try_get("winner")?,
            winning_bid: row.try_get("winning_bid")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// 경매 생성 입력
#[derive(Debug, Clone)]
pub struct NewAuction {
    pub title: String,
    pub description: String,
    pub item_image: Option<String>,
    pub base_price: i64,
    pub start_time: DateTime<Utc>,
    pub created_by: i64,
}
// endregion: --- Auction Model
