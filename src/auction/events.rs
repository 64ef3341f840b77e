use crate::auction::model::Auction;
use crate::bidding::model::Bid;
use serde::{Deserialize, Serialize};

/// 브로드캐스트 채널로 전파되는 실시간 이벤트
/// 클라이언트에는 {"event": ..., "data": ...} 형태의 JSON으로 전송된다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum AuctionEvent {
    // 경매 생성 (전역)
    #[serde(rename_all = "camelCase")]
    AuctionCreated { auction: Auction },

    // 경매 시작 (전역 + 해당 룸)
    #[serde(rename_all = "camelCase")]
    AuctionStarted { auction_id: i64, auction: Auction },

    // 경매 종료 (전역 + 해당 룸)
    #[serde(rename_all = "camelCase")]
    AuctionEnded {
        auction_id: i64,
        winner: Option<i64>,
        winning_bid: Option<i64>,
    },

    // 입찰 성공 (해당 룸)
    #[serde(rename_all = "camelCase")]
    BidPlaced { bid: Bid, current_price: i64 },

    // 로비 입장/퇴장 알림 (해당 룸, 순수 표시용)
    #[serde(rename_all = "camelCase")]
    UserJoinedLobby { user_id: i64, username: String },

    #[serde(rename_all = "camelCase")]
    UserLeftLobby { user_id: i64, username: String },

    // 목록 재조회 신호 (전역)
    AuctionsUpdated,
}
