/// 실시간 브로드캐스트 채널
/// 경매 id로 구분되는 룸 + 전역 채널로 이벤트를 팬아웃한다.
/// 전송은 fire-and-forget: 보존/재전송 없음, 끊긴 클라이언트는 놓친
/// 이벤트를 재조회로 복구한다. 전역 싱글턴 대신 main에서 생성해
/// 필요한 서비스에 주입한다.
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use std::collections::HashMap;
use tokio::sync::broadcast;
use tokio::sync::RwLock;
use tracing::debug;

pub mod ws;

// endregion: --- Imports

// region:    --- Broadcaster
/// 룸/전역 채널 버퍼 크기
const CHANNEL_CAPACITY: usize = 256;

pub struct Broadcaster {
    global: broadcast::Sender<AuctionEvent>,
    rooms: RwLock<HashMap<i64, broadcast::Sender<AuctionEvent>>>,
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Broadcaster {
    pub fn new() -> Self {
        let (global, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            global,
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// 전역 채널 구독
    pub fn subscribe_global(&self) -> broadcast::Receiver<AuctionEvent> {
        self.global.subscribe()
    }

    /// 룸 구독 (없으면 생성)
    /// 구독 해제는 반환된 수신기를 드롭하면 된다.
    pub async fn join(&self, auction_id: i64) -> broadcast::Receiver<AuctionEvent> {
        let mut rooms = self.rooms.write().await;
        rooms
            .entry(auction_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// 룸에 이벤트 전송
    pub async fn broadcast_to_room(&self, auction_id: i64, event: AuctionEvent) {
        let mut empty = false;
        {
            let rooms = self.rooms.read().await;
            if let Some(sender) = rooms.get(&auction_id) {
                if sender.receiver_count() == 0 {
                    empty = true;
                } else {
                    // 수신자가 뒤처져 이벤트를 놓쳐도 무시한다
                    let _ = sender.send(event);
                }
            }
        }
        // 구독자가 모두 떠난 룸은 정리
        if empty {
            let mut rooms = self.rooms.write().await;
            if let Some(sender) = rooms.get(&auction_id) {
                if sender.receiver_count() == 0 {
                    rooms.remove(&auction_id);
                    debug!("{:<12} --> 빈 룸 정리: {}", "Broadcast", auction_id);
                }
            }
        }
    }

    /// 전체 클라이언트에 이벤트 전송
    pub fn broadcast_global(&self, event: AuctionEvent) {
        let _ = self.global.send(event);
    }

    /// 현재 열려 있는 룸 수
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}
// endregion: --- Broadcaster
