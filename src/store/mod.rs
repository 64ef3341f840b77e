/// 저장소 추상화
/// 경매/입찰/사용자 레코드를 보관하는 문서 저장소 인터페이스.
/// 모든 상태 전이는 조건부 갱신(compare-and-set)으로만 수행되어야 하며,
/// 읽은 뒤 통째로 덮어쓰는 방식은 갱신 유실 레이스를 일으키므로 금지한다.
// region:    --- Imports
use crate::auction::model::{Auction, NewAuction};
use crate::auth::model::{User, WonAuction};
use crate::bidding::model::Bid;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub mod memory;
pub mod postgres;
pub mod queries;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

// endregion: --- Imports

// region:    --- New User
/// 사용자 생성 입력
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
}
// endregion: --- New User

// region:    --- Store Trait
#[async_trait]
pub trait Store: Send + Sync {
    // -- 경매

    async fn insert_auction(&self, new: NewAuction) -> Result<Auction>;

    async fn get_auction(&self, auction_id: i64) -> Result<Option<Auction>>;

    /// 생성 시각 내림차순 목록
    async fn list_auctions(&self) -> Result<Vec<Auction>>;

    /// 동일 소유자의 경매 중 시작 시각이 [start - window, start + window]
    /// 구간에 있는 것이 존재하는지 확인 (생성 시 일정 충돌 검사)
    async fn owner_schedule_conflict(
        &self,
        owner_id: i64,
        start_time: DateTime<Utc>,
        window_secs: i64,
    ) -> Result<bool>;

    /// 시작 시각이 지난 upcoming 경매를 active로 전이
    /// 조건부 갱신이므로 수동 종료나 동시 tick과 경합해도 안전하다.
    /// 전이된 경매 스냅샷을 반환한다.
    async fn promote_due_auctions(&self, now: DateTime<Utc>) -> Result<Vec<Auction>>;

    /// 시작 전 참가 신청: upcoming 상태이고 아직 신청하지 않은 경우에만 추가
    /// 조건을 만족하지 못하면 None
    async fn register_interest(&self, auction_id: i64, user_id: i64) -> Result<Option<Auction>>;

    /// 입찰 커밋 (compare-and-set)
    /// 저장된 current_price가 여전히 amount보다 낮고 status가 active인
    /// 경우에만 가격 인상 + 참가자 추가 + 입찰 기록을 하나의 원자적
    /// 연산으로 수행한다. 조건 불충족이면 None (아무것도 변경되지 않음).
    async fn commit_bid(
        &self,
        auction_id: i64,
        bidder_id: i64,
        amount: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<(Bid, Auction)>>;

    /// 경매 종료: status != ended인 경우에만 ended로 전이하고
    /// winner/winning_bid를 확정한다. 이미 종료되었으면 None.
    async fn close_auction(
        &self,
        auction_id: i64,
        winner: Option<i64>,
        winning_bid: Option<i64>,
    ) -> Result<Option<Auction>>;

    // -- 입찰

    /// 금액 내림차순, 동일 금액은 먼저 기록된 순
    async fn bids_for_auction(&self, auction_id: i64) -> Result<Vec<Bid>>;

    /// 최고 입찰 조회 (동률이면 먼저 기록된 입찰)
    async fn highest_bid(&self, auction_id: i64) -> Result<Option<Bid>>;

    // -- 사용자

    async fn insert_user(&self, new: NewUser) -> Result<User>;

    async fn get_user(&self, user_id: i64) -> Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// 낙찰 기록 추가 (사용자별 추가 전용 컬렉션)
    async fn record_won_auction(
        &self,
        user_id: i64,
        auction_id: i64,
        amount: i64,
        at: DateTime<Utc>,
    ) -> Result<WonAuction>;

    async fn won_auctions(&self, user_id: i64) -> Result<Vec<WonAuction>>;
}
// endregion: --- Store Trait
