/// 경매 관련 커맨드 처리
/// 1. 경매 생성
/// 2. 시작 전 참가 신청
/// 3. 경매 종료 (낙찰자 확정)
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::auction::model::{Auction, AuctionStatus, NewAuction};
use crate::broadcast::Broadcaster;
use crate::error::{Error, Result};
use crate::store::Store;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Commands
/// 동일 소유자 경매 간 최소 시작 시각 간격 (초)
pub const SCHEDULE_COLLISION_WINDOW_SECS: i64 = 300;

/// 경매 생성 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuctionCommand {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub item_image: Option<String>,
    pub base_price: i64,
    pub start_time: DateTime<Utc>,
}

/// 1. 경매 생성
/// 시작가는 양수, 시작 시각은 엄격히 미래여야 하며 동일 소유자의
/// 다른 경매와 시작 시각이 충돌 구간 안에 있으면 거절한다.
pub async fn create_auction(
    store: &Arc<dyn Store>,
    broadcaster: &Arc<Broadcaster>,
    cmd: CreateAuctionCommand,
    owner_id: i64,
) -> Result<Auction> {
    info!(
        "{:<12} --> 경매 생성 요청: owner={}, title={:?}",
        "Command", owner_id, cmd.title
    );

    if cmd.title.trim().is_empty() {
        return Err(Error::Validation("제목은 비어 있을 수 없습니다.".to_string()));
    }
    if cmd.base_price <= 0 {
        return Err(Error::Validation("시작가는 양수여야 합니다.".to_string()));
    }
    if cmd.start_time <= Utc::now() {
        return Err(Error::conflict(
            "START_TIME_NOT_FUTURE",
            "시작 시각은 현재보다 미래여야 합니다.",
        ));
    }
    if store
        .owner_schedule_conflict(owner_id, cmd.start_time, SCHEDULE_COLLISION_WINDOW_SECS)
        .await?
    {
        return Err(Error::conflict(
            "SCHEDULE_CONFLICT",
            "같은 소유자의 다른 경매와 시작 시각이 너무 가깝습니다.",
        ));
    }

    let auction = store
        .insert_auction(NewAuction {
            title: cmd.title,
            description: cmd.description,
            item_image: cmd.item_image,
            base_price: cmd.base_price,
            start_time: cmd.start_time,
            created_by: owner_id,
        })
        .await?;

    broadcaster.broadcast_global(AuctionEvent::AuctionCreated {
        auction: auction.clone(),
    });
    broadcaster.broadcast_global(AuctionEvent::AuctionsUpdated);

    info!("{:<12} --> 경매 생성 완료: id={}", "Command", auction.id);
    Ok(auction)
}

/// 2. 시작 전 참가 신청
/// upcoming 상태에서만 가능하고, 사용자당 1회, 소유자는 자신의 경매에
/// 신청할 수 없다.
pub async fn register_for_auction(
    store: &Arc<dyn Store>,
    auction_id: i64,
    user_id: i64,
) -> Result<Auction> {
    info!(
        "{:<12} --> 참가 신청: auction={}, user={}",
        "Command", auction_id, user_id
    );

    let auction = store
        .get_auction(auction_id)
        .await?
        .ok_or_else(|| Error::NotFound("경매를 찾을 수 없습니다.".to_string()))?;

    if auction.created_by == user_id {
        return Err(Error::Forbidden(
            "소유자는 자신의 경매에 참가 신청할 수 없습니다.".to_string(),
        ));
    }
    if auction.status != AuctionStatus::Upcoming {
        return Err(Error::conflict(
            "NOT_UPCOMING",
            "참가 신청은 경매 시작 전에만 가능합니다.",
        ));
    }
    if auction.registrations.contains(&user_id) {
        return Err(Error::conflict(
            "ALREADY_REGISTERED",
            "이미 참가 신청한 경매입니다.",
        ));
    }

    // 조건부 갱신: 검사 이후 상태가 바뀌었으면 실패한다
    store
        .register_interest(auction_id, user_id)
        .await?
        .ok_or_else(|| {
            Error::conflict("NOT_UPCOMING", "참가 신청은 경매 시작 전에만 가능합니다.")
        })
}

/// 3. 경매 종료
/// 소유자만 종료할 수 있고, 이미 종료된 경매의 재종료는 오류다
/// (멱등 종료는 허용하지 않는다). 낙찰자는 최고 금액 입찰의 입찰자이며
/// 동률은 먼저 기록된 입찰이 이긴다.
pub async fn end_auction(
    store: &Arc<dyn Store>,
    broadcaster: &Arc<Broadcaster>,
    auction_id: i64,
    requester_id: i64,
) -> Result<Auction> {
    info!(
        "{:<12} --> 경매 종료 요청: auction={}, requester={}",
        "Command", auction_id, requester_id
    );

    let auction = store
        .get_auction(auction_id)
        .await?
        .ok_or_else(|| Error::NotFound("경매를 찾을 수 없습니다.".to_string()))?;

    if auction.created_by != requester_id {
        return Err(Error::Forbidden(
            "경매 소유자만 종료할 수 있습니다.".to_string(),
        ));
    }
    if auction.status == AuctionStatus::Ended {
        return Err(Error::conflict(
            "ALREADY_ENDED",
            "경매가 이미 종료되었습니다.",
        ));
    }

    // 낙찰자 계산: 입찰이 없으면 winner/winning_bid는 null로 남는다
    let highest = store.highest_bid(auction_id).await?;
    let (winner, winning_bid) = match &highest {
        Some(bid) => (Some(bid.bidder_id), Some(bid.amount)),
        None => (None, None),
    };

    // 조건부 종료: 동시 종료 요청 중 하나만 성공한다
    let ended = store
        .close_auction(auction_id, winner, winning_bid)
        .await?
        .ok_or_else(|| {
            Error::conflict("ALREADY_ENDED", "경매가 이미 종료되었습니다.")
        })?;

    // 낙찰자 프로필에 낙찰 기록 추가
    if let Some(bid) = &highest {
        store
            .record_won_auction(bid.bidder_id, auction_id, bid.amount, Utc::now())
            .await?;
    }

    let event = AuctionEvent::AuctionEnded {
        auction_id,
        winner,
        winning_bid,
    };
    broadcaster.broadcast_to_room(auction_id, event.clone()).await;
    broadcaster.broadcast_global(event);
    broadcaster.broadcast_global(AuctionEvent::AuctionsUpdated);

    info!(
        "{:<12} --> 경매 종료 완료: id={}, winner={:?}, winning_bid={:?}",
        "Command", auction_id, winner, winning_bid
    );
    Ok(ended)
}
// endregion: --- Commands
