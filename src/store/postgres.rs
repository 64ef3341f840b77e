/// Postgres 저장소 구현체
/// 모든 상태 전이는 조건부 UPDATE ... RETURNING으로 수행한다.
// region:    --- Imports
use super::{queries, NewUser, Store};
use crate::auction::model::{Auction, NewAuction};
use crate::auth::model::{User, WonAuction};
use crate::bidding::model::Bid;
use crate::database::DatabaseManager;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::Row;
use std::sync::Arc;

// endregion: --- Imports

// region:    --- Postgres Store
pub struct PostgresStore {
    db: Arc<DatabaseManager>,
}

impl PostgresStore {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn insert_auction(&self, new: NewAuction) -> Result<Auction> {
        let auction = sqlx::query_as::<_, Auction>(queries::INSERT_AUCTION)
            .bind(&new.title)
            .bind(&new.description)
            .bind(&new.item_image)
            .bind(new.base_price)
            .bind(new.start_time)
            .bind(new.created_by)
            .bind(Utc::now())
            .fetch_one(self.db.pool())
            .await?;
        Ok(auction)
    }

    async fn get_auction(&self, auction_id: i64) -> Result<Option<Auction>> {
        let auction = sqlx::query_as::<_, Auction>(queries::GET_AUCTION)
            .bind(auction_id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(auction)
    }

    async fn list_auctions(&self) -> Result<Vec<Auction>> {
        let auctions = sqlx::query_as::<_, Auction>(queries::LIST_AUCTIONS)
            .fetch_all(self.db.pool())
            .await?;
        Ok(auctions)
    }

    async fn owner_schedule_conflict(
        &self,
        owner_id: i64,
        start_time: DateTime<Utc>,
        window_secs: i64,
    ) -> Result<bool> {
        let window = Duration::seconds(window_secs);
        let row = sqlx::query(queries::OWNER_SCHEDULE_CONFLICT)
            .bind(owner_id)
            .bind(start_time - window)
            .bind(start_time + window)
            .fetch_one(self.db.pool())
            .await?;
        Ok(row.try_get("conflict")?)
    }

    async fn promote_due_auctions(&self, now: DateTime<Utc>) -> Result<Vec<Auction>> {
        let promoted = sqlx::query_as::<_, Auction>(queries::PROMOTE_DUE_AUCTIONS)
            .bind(now)
            .fetch_all(self.db.pool())
            .await?;
        Ok(promoted)
    }

    async fn register_interest(&self, auction_id: i64, user_id: i64) -> Result<Option<Auction>> {
        let auction = sqlx::query_as::<_, Auction>(queries::REGISTER_INTEREST)
            .bind(auction_id)
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(auction)
    }

    async fn commit_bid(
        &self,
        auction_id: i64,
        bidder_id: i64,
        amount: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<(Bid, Auction)>> {
        // 가격 인상과 입찰 기록은 하나의 트랜잭션으로 묶는다.
        // UPDATE가 0행이면 경합에서 밀렸거나 조건 불충족이므로 롤백.
        self.db
            .transaction(|tx| {
                Box::pin(async move {
                    let auction =
                        sqlx::query_as::<_, Auction>(queries::COMMIT_BID_RAISE_PRICE)
                            .bind(auction_id)
                            .bind(amount)
                            .bind(bidder_id)
                            .fetch_optional(&mut **tx)
                            .await?;

                    let Some(auction) = auction else {
                        return Ok(None);
                    };

                    let bid = sqlx::query_as::<_, Bid>(queries::INSERT_BID)
                        .bind(auction_id)
                        .bind(bidder_id)
                        .bind(amount)
                        .bind(at)
                        .fetch_one(&mut **tx)
                        .await?;

                    Ok(Some((bid, auction)))
                })
            })
            .await
    }

    async fn close_auction(
        &self,
        auction_id: i64,
        winner: Option<i64>,
        winning_bid: Option<i64>,
    ) -> Result<Option<Auction>> {
        let auction = sqlx::query_as::<_, Auction>(queries::CLOSE_AUCTION)
            .bind(auction_id)
            .bind(winner)
            .bind(winning_bid)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(auction)
    }

    async fn bids_for_auction(&self, auction_id: i64) -> Result<Vec<Bid>> {
        let bids = sqlx::query_as::<_, Bid>(queries::BIDS_FOR_AUCTION)
            .bind(auction_id)
            .fetch_all(self.db.pool())
            .await?;
        Ok(bids)
    }

    async fn highest_bid(&self, auction_id: i64) -> Result<Option<Bid>> {
        let bid = sqlx::query_as::<_, Bid>(queries::HIGHEST_BID)
            .bind(auction_id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(bid)
    }

    async fn insert_user(&self, new: NewUser) -> Result<User> {
        let user = sqlx::query_as::<_, User>(queries::INSERT_USER)
            .bind(&new.username)
            .bind(&new.email)
            .bind(Utc::now())
            .fetch_one(self.db.pool())
            .await?;
        Ok(user)
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(queries::GET_USER)
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(queries::FIND_USER_BY_EMAIL)
            .bind(email)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(user)
    }

    async fn record_won_auction(
        &self,
        user_id: i64,
        auction_id: i64,
        amount: i64,
        at: DateTime<Utc>,
    ) -> Result<WonAuction> {
        let won = sqlx::query_as::<_, WonAuction>(queries::INSERT_WON_AUCTION)
            .bind(user_id)
            .bind(auction_id)
            .bind(amount)
            .bind(at)
            .fetch_one(self.db.pool())
            .await?;
        Ok(won)
    }

    async fn won_auctions(&self, user_id: i64) -> Result<Vec<WonAuction>> {
        let won = sqlx::query_as::<_, WonAuction>(queries::WON_AUCTIONS)
            .bind(user_id)
            .fetch_all(self.db.pool())
            .await?;
        Ok(won)
    }
}
// endregion: --- Postgres Store
