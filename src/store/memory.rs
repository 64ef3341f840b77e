/// 인메모리 저장소 구현체
/// 테스트 및 DATABASE_URL이 없는 로컬 실행용.
/// 모든 변경 연산은 쓰기 잠금 안에서 검사와 커밋을 함께 수행하므로
/// Postgres 구현체와 동일한 조건부 갱신 계약을 만족한다.
// region:    --- Imports
use super::{NewUser, Store};
use crate::auction::model::{Auction, AuctionStatus, NewAuction};
use crate::auth::model::{User, WonAuction};
use crate::bidding::model::Bid;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

// endregion: --- Imports

// region:    --- Memory Store
#[derive(Default)]
struct Inner {
    auctions: HashMap<i64, Auction>,
    bids: Vec<Bid>,
    users: HashMap<i64, User>,
    won_auctions: Vec<WonAuction>,
    next_auction_id: i64,
    next_bid_id: i64,
    next_user_id: i64,
    next_won_id: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_auction(&self, new: NewAuction) -> Result<Auction> {
        let mut inner = self.inner.write().await;
        inner.next_auction_id += 1;
        let auction = Auction {
            id: inner.next_auction_id,
            title: new.title,
            description: new.description,
            item_image: new.item_image,
            base_price: new.base_price,
            current_price: new.base_price,
            start_time: new.start_time,
            status: AuctionStatus::Upcoming,
            created_by: new.created_by,
            participants: vec![new.created_by],
            registrations: vec![],
            winner: None,
            winning_bid: None,
            created_at: Utc::now(),
        };
        inner.auctions.insert(auction.id, auction.clone());
        Ok(auction)
    }

    async fn get_auction(&self, auction_id: i64) -> Result<Option<Auction>> {
        let inner = self.inner.read().await;
        Ok(inner.auctions.get(&auction_id).cloned())
    }

    async fn list_auctions(&self) -> Result<Vec<Auction>> {
        let inner = self.inner.read().await;
        let mut auctions: Vec<Auction> = inner.auctions.values().cloned().collect();
        auctions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(auctions)
    }

    async fn owner_schedule_conflict(
        &self,
        owner_id: i64,
        start_time: DateTime<Utc>,
        window_secs: i64,
    ) -> Result<bool> {
        let window = Duration::seconds(window_secs);
        let inner = self.inner.read().await;
        Ok(inner.auctions.values().any(|a| {
            a.created_by == owner_id
                && a.start_time >= start_time - window
                && a.start_time <= start_time + window
        }))
    }

    async fn promote_due_auctions(&self, now: DateTime<Utc>) -> Result<Vec<Auction>> {
        let mut inner = self.inner.write().await;
        let mut promoted = Vec::new();
        for auction in inner.auctions.values_mut() {
            if auction.status == AuctionStatus::Upcoming && auction.start_time <= now {
                auction.status = AuctionStatus::Active;
                promoted.push(auction.clone());
            }
        }
        Ok(promoted)
    }

    async fn register_interest(&self, auction_id: i64, user_id: i64) -> Result<Option<Auction>> {
        let mut inner = self.inner.write().await;
        let Some(auction) = inner.auctions.get_mut(&auction_id) else {
            return Ok(None);
        };
        if auction.status != AuctionStatus::Upcoming || auction.registrations.contains(&user_id) {
            return Ok(None);
        }
        auction.registrations.push(user_id);
        Ok(Some(auction.clone()))
    }

    async fn commit_bid(
        &self,
        auction_id: i64,
        bidder_id: i64,
        amount: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<(Bid, Auction)>> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;
        let Some(auction) = inner.auctions.get_mut(&auction_id) else {
            return Ok(None);
        };
        if auction.status != AuctionStatus::Active || auction.current_price >= amount {
            return Ok(None);
        }
        inner.next_bid_id += 1;
        let bid_id = inner.next_bid_id;
        auction.current_price = amount;
        if !auction.participants.contains(&bidder_id) {
            auction.participants.push(bidder_id);
        }
        let snapshot = auction.clone();
        let bid = Bid {
            id: bid_id,
            auction_id,
            bidder_id,
            amount,
            bid_time: at,
        };
        inner.bids.push(bid.clone());
        Ok(Some((bid, snapshot)))
    }

    async fn close_auction(
        &self,
        auction_id: i64,
        winner: Option<i64>,
        winning_bid: Option<i64>,
    ) -> Result<Option<Auction>> {
        let mut inner = self.inner.write().await;
        let Some(auction) = inner.auctions.get_mut(&auction_id) else {
            return Ok(None);
        };
        if auction.status == AuctionStatus::Ended {
            return Ok(None);
        }
        auction.status = AuctionStatus::Ended;
        auction.winner = winner;
        auction.winning_bid = winning_bid;
        Ok(Some(auction.clone()))
    }

    async fn bids_for_auction(&self, auction_id: i64) -> Result<Vec<Bid>> {
        let inner = self.inner.read().await;
        let mut bids: Vec<Bid> = inner
            .bids
            .iter()
            .filter(|b| b.auction_id == auction_id)
            .cloned()
            .collect();
        bids.sort_by(|a, b| {
            b.amount
                .cmp(&a.amount)
                .then(a.bid_time.cmp(&b.bid_time))
                .then(a.id.cmp(&b.id))
        });
        Ok(bids)
    }

    async fn highest_bid(&self, auction_id: i64) -> Result<Option<Bid>> {
        Ok(self.bids_for_auction(auction_id).await?.into_iter().next())
    }

    async fn insert_user(&self, new: NewUser) -> Result<User> {
        let mut inner = self.inner.write().await;
        inner.next_user_id += 1;
        let user = User {
            id: inner.next_user_id,
            username: new.username,
            email: new.email,
            created_at: Utc::now(),
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn record_won_auction(
        &self,
        user_id: i64,
        auction_id: i64,
        amount: i64,
        at: DateTime<Utc>,
    ) -> Result<WonAuction> {
        let mut inner = self.inner.write().await;
        inner.next_won_id += 1;
        let won = WonAuction {
            id: inner.next_won_id,
            user_id,
            auction_id,
            amount,
            won_at: at,
        };
        inner.won_auctions.push(won.clone());
        Ok(won)
    }

    async fn won_auctions(&self, user_id: i64) -> Result<Vec<WonAuction>> {
        let inner = self.inner.read().await;
        let mut won: Vec<WonAuction> = inner
            .won_auctions
            .iter()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect();
        won.sort_by(|a, b| b.won_at.cmp(&a.won_at));
        Ok(won)
    }
}
// endregion: --- Memory Store
