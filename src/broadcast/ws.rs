/// 웹소켓 연결 처리
/// 연결마다 전역 채널을 기본 구독하고, 클라이언트의 joinAuction /
/// joinLobby 액션에 따라 경매별 룸을 추가 구독한다.
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::broadcast::Broadcaster;
use crate::handlers::AppState;
use crate::store::Store;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

// endregion: --- Imports

// region:    --- Client Messages
/// 클라이언트가 보내는 구독 액션
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    JoinAuction { auction_id: i64 },
    #[serde(rename_all = "camelCase")]
    LeaveAuction { auction_id: i64 },
    #[serde(rename_all = "camelCase")]
    JoinLobby { auction_id: i64, user_id: i64 },
    #[serde(rename_all = "camelCase")]
    LeaveLobby { auction_id: i64, user_id: i64 },
}
// endregion: --- Client Messages

// region:    --- WebSocket Handler
/// GET /ws
pub async fn handle_ws(
    State((store, broadcaster, _)): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, store, broadcaster))
}

async fn handle_socket(socket: WebSocket, store: Arc<dyn Store>, broadcaster: Arc<Broadcaster>) {
    info!("{:<12} --> 클라이언트 연결", "WebSocket");
    let (sink, stream) = socket.split();

    // 연결별 송신 큐: 모든 구독 이벤트가 이 큐를 거쳐 소켓으로 나간다
    let (tx, rx) = mpsc::unbounded_channel::<AuctionEvent>();
    let writer = tokio::spawn(write_events(sink, rx));

    // 전역 채널은 연결 즉시 구독 (목록 갱신 이벤트 수신용)
    let global_task = spawn_forwarder(broadcaster.subscribe_global(), tx.clone());

    // 룸별 포워더: join 시 생성, leave 시 중단
    let mut room_tasks: HashMap<i64, JoinHandle<()>> = HashMap::new();
    // 이 연결이 입장한 로비: 끊길 때 퇴장 알림에 사용
    let mut lobbies: HashMap<i64, (i64, String)> = HashMap::new();

    read_actions(
        stream,
        &store,
        &broadcaster,
        &tx,
        &mut room_tasks,
        &mut lobbies,
    )
    .await;

    // 연결 정리: 입장해 있던 로비에 퇴장을 알리고 모든 구독을 해제
    for (auction_id, (user_id, username)) in lobbies {
        broadcaster
            .broadcast_to_room(auction_id, AuctionEvent::UserLeftLobby { user_id, username })
            .await;
    }
    for (_, task) in room_tasks {
        task.abort();
    }
    global_task.abort();
    writer.abort();
    info!("{:<12} --> 클라이언트 연결 종료", "WebSocket");
}

/// 수신 루프: 클라이언트 액션 처리
async fn read_actions(
    mut stream: SplitStream<WebSocket>,
    store: &Arc<dyn Store>,
    broadcaster: &Arc<Broadcaster>,
    tx: &mpsc::UnboundedSender<AuctionEvent>,
    room_tasks: &mut HashMap<i64, JoinHandle<()>>,
    lobbies: &mut HashMap<i64, (i64, String)>,
) {
    while let Some(Ok(msg)) = stream.next().await {
        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let action = match serde_json::from_str::<ClientMessage>(&text) {
            Ok(action) => action,
            Err(e) => {
                debug!("{:<12} --> 잘못된 클라이언트 메시지: {:?}", "WebSocket", e);
                continue;
            }
        };

        match action {
            ClientMessage::JoinAuction { auction_id } => {
                join_room(broadcaster, tx, room_tasks, auction_id).await;
            }
            ClientMessage::LeaveAuction { auction_id } => {
                if let Some(task) = room_tasks.remove(&auction_id) {
                    task.abort();
                }
            }
            ClientMessage::JoinLobby {
                auction_id,
                user_id,
            } => {
                // 로비 입장은 룸 구독을 포함한다
                join_room(broadcaster, tx, room_tasks, auction_id).await;

                let username = match store.get_user(user_id).await {
                    Ok(Some(user)) => user.username,
                    Ok(None) => {
                        warn!("{:<12} --> 알 수 없는 사용자 로비 입장: {}", "WebSocket", user_id);
                        continue;
                    }
                    Err(e) => {
                        warn!("{:<12} --> 사용자 조회 오류: {:?}", "WebSocket", e);
                        continue;
                    }
                };

                lobbies.insert(auction_id, (user_id, username.clone()));
                broadcaster
                    .broadcast_to_room(
                        auction_id,
                        AuctionEvent::UserJoinedLobby { user_id, username },
                    )
                    .await;
            }
            ClientMessage::LeaveLobby {
                auction_id,
                user_id,
            } => {
                if let Some((_, username)) = lobbies.remove(&auction_id) {
                    broadcaster
                        .broadcast_to_room(
                            auction_id,
                            AuctionEvent::UserLeftLobby { user_id, username },
                        )
                        .await;
                }
            }
        }
    }
}

/// 룸 구독 및 포워더 기동 (이미 구독 중이면 아무것도 하지 않음)
async fn join_room(
    broadcaster: &Arc<Broadcaster>,
    tx: &mpsc::UnboundedSender<AuctionEvent>,
    room_tasks: &mut HashMap<i64, JoinHandle<()>>,
    auction_id: i64,
) {
    if room_tasks.contains_key(&auction_id) {
        return;
    }
    let rx = broadcaster.join(auction_id).await;
    room_tasks.insert(auction_id, spawn_forwarder(rx, tx.clone()));
}

/// 브로드캐스트 수신기 -> 연결 송신 큐 포워더
fn spawn_forwarder(
    mut rx: broadcast::Receiver<AuctionEvent>,
    tx: mpsc::UnboundedSender<AuctionEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if tx.send(event).is_err() {
                        break;
                    }
                }
                // 버퍼를 놓친 이벤트는 되돌리지 않는다 (클라이언트 재조회로 복구)
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// 송신 루프: 큐의 이벤트를 JSON으로 직렬화해 소켓에 쓴다
async fn write_events(
    mut sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<AuctionEvent>,
) {
    while let Some(event) = rx.recv().await {
        let text = match serde_json::to_string(&event) {
            Ok(text) => text,
            Err(_) => continue,
        };
        if sink.send(Message::Text(text)).await.is_err() {
            break;
        }
    }
}
// endregion: --- WebSocket Handler
