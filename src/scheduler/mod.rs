/// 경매 수명주기 엔진
/// 시작 시각이 지난 upcoming 경매를 주기적으로 active로 전이하고
/// 전이 사실을 브로드캐스트한다. 전이는 저장소의 조건부 갱신이므로
/// 수동 종료나 동시 tick과 경합해도 멱등하다.
/// 종료는 소유자 수동 종료만 존재한다 (비활성 자동 종료 없음).
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::broadcast::Broadcaster;
use crate::store::Store;
use chrono::Utc;
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info};

// endregion: --- Imports

// region:    --- Auction Scheduler
/// tick 주기: 짧을수록 활성화 지연이 줄지만 저장소 부하가 늘어난다
pub const TICK_INTERVAL: Duration = Duration::from_secs(5);

/// 경매 상태 업데이트 스케줄러
pub struct AuctionScheduler {
    store: Arc<dyn Store>,
    broadcaster: Arc<Broadcaster>,
}

impl AuctionScheduler {
    pub fn new(store: Arc<dyn Store>, broadcaster: Arc<Broadcaster>) -> Self {
        Self { store, broadcaster }
    }

    /// 스케줄러 시작
    /// 저장소 오류는 기록만 하고 다음 tick을 계속한다.
    pub fn start(self) {
        tokio::spawn(async move {
            let mut interval = interval(TICK_INTERVAL);
            loop {
                interval.tick().await;
                if let Err(e) = self.tick().await {
                    error!(
                        "{:<12} --> 경매 상태 업데이트 중 오류 발생: {:?}",
                        "Scheduler", e
                    );
                }
            }
        });
    }

    /// 한 번의 상태 스윕
    /// 전이된 경매마다 auctionStarted를 전역과 해당 룸에 발행하고,
    /// 하나라도 전이되었으면 목록 재조회 신호를 보낸다.
    pub async fn tick(&self) -> crate::error::Result<()> {
        let now = Utc::now();
        let promoted = self.store.promote_due_auctions(now).await?;

        if promoted.is_empty() {
            debug!("{:<12} --> 전이 대상 없음", "Scheduler");
            return Ok(());
        }

        for auction in &promoted {
            info!(
                "{:<12} --> 경매 시작: id={}, title={:?}",
                "Scheduler", auction.id, auction.title
            );
            let event = AuctionEvent::AuctionStarted {
                auction_id: auction.id,
                auction: auction.clone(),
            };
            self.broadcaster.broadcast_global(event.clone());
            self.broadcaster.broadcast_to_room(auction.id, event).await;
        }
        self.broadcaster.broadcast_global(AuctionEvent::AuctionsUpdated);

        Ok(())
    }
}
// endregion: --- Auction Scheduler
