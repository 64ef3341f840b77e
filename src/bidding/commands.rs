/// 입찰 수락 서비스
/// 입찰 요청을 현재 경매 상태에 대해 검증하고 원자적으로 반영한다.
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::auction::model::AuctionStatus;
use crate::bidding::model::Bid;
use crate::broadcast::Broadcaster;
use crate::error::{Error, Result};
use crate::store::Store;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Commands
/// 입찰 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub amount: i64,
}

/// 입찰 처리
/// 선행 조건 검사 후 저장소의 compare-and-set으로 커밋한다.
/// 검증과 커밋 사이에 다른 입찰이 끼어들 수 있으므로(같은 이벤트 루프의
/// 비동기 중단 지점), 커밋은 저장된 current_price가 여전히 입찰가보다
/// 낮은 경우에만 성공한다. 성공 시 (입찰 기록, 갱신된 현재 가격) 반환.
pub async fn place_bid(
    store: &Arc<dyn Store>,
    broadcaster: &Arc<Broadcaster>,
    auction_id: i64,
    bidder_id: i64,
    amount: i64,
) -> Result<(Bid, i64)> {
    info!(
        "{:<12} --> 입찰 요청: auction={}, bidder={}, amount={}",
        "Command", auction_id, bidder_id, amount
    );

    let auction = store
        .get_auction(auction_id)
        .await?
        .ok_or_else(|| Error::NotFound("경매를 찾을 수 없습니다.".to_string()))?;

    // 상태 검증
    match auction.status {
        AuctionStatus::Upcoming => {
            return Err(Error::conflict(
                "NOT_STARTED",
                "경매가 아직 시작되지 않았습니다.",
            ));
        }
        AuctionStatus::Ended => {
            return Err(Error::conflict(
                "ALREADY_ENDED",
                "경매가 이미 종료되었습니다.",
            ));
        }
        AuctionStatus::Active => {}
    }

    // 가격 검증: 동일 금액도 거절
    if amount <= auction.current_price {
        return Err(Error::conflict(
            "LOW_BID",
            format!(
                "입찰 금액은 현재 가격 {}보다 높아야 합니다.",
                auction.current_price
            ),
        ));
    }

    // 커밋: 저장소 수준의 조건부 갱신
    // 실패하면 검증 이후 다른 입찰/종료가 먼저 커밋된 것이다
    let Some((bid, updated)) = store
        .commit_bid(auction_id, bidder_id, amount, Utc::now())
        .await?
    else {
        warn!(
            "{:<12} --> 입찰 커밋 경합 패배: auction={}, amount={}",
            "Command", auction_id, amount
        );
        return Err(lost_commit_error(store, auction_id, amount).await?);
    };

    // 영속화 성공 이후에만 브로드캐스트
    broadcaster
        .broadcast_to_room(
            auction_id,
            AuctionEvent::BidPlaced {
                bid: bid.clone(),
                current_price: updated.current_price,
            },
        )
        .await;

    info!(
        "{:<12} --> 입찰 성공: auction={}, 현재 가격 {}",
        "Command", auction_id, updated.current_price
    );
    Ok((bid, updated.current_price))
}

/// 커밋 경합 패배 시 최신 상태를 다시 읽어 정확한 오류로 변환
async fn lost_commit_error(
    store: &Arc<dyn Store>,
    auction_id: i64,
    amount: i64,
) -> Result<Error> {
    let auction = store
        .get_auction(auction_id)
        .await?
        .ok_or_else(|| Error::NotFound("경매를 찾을 수 없습니다.".to_string()))?;

    Ok(match auction.status {
        AuctionStatus::Ended => {
            Error::conflict("ALREADY_ENDED", "경매가 이미 종료되었습니다.")
        }
        _ => Error::conflict(
            "LOW_BID",
            format!(
                "입찰 금액 {}은(는) 현재 가격 {}보다 높아야 합니다.",
                amount, auction.current_price
            ),
        ),
    })
}
// endregion: --- Commands
