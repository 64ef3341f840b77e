use auctionverse::auction::events::AuctionEvent;
use auctionverse::auth::{Authenticator, SessionManager};
use auctionverse::broadcast::Broadcaster;
use auctionverse::handlers;
use auctionverse::scheduler::AuctionScheduler;
use auctionverse::store::{MemoryStore, Store};
use chrono::{Duration, Utc};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;

/// 테스트 앱 (인메모리 저장소 위에서 실제 라우터를 띄운다)
struct TestApp {
    base: String,
    store: Arc<dyn Store>,
    broadcaster: Arc<Broadcaster>,
}

/// 테스트 서버 기동
async fn spawn_app() -> TestApp {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let broadcaster = Arc::new(Broadcaster::new());
    let auth: Arc<dyn Authenticator> = Arc::new(SessionManager::new(Arc::clone(&store)));

    let router = handlers::routes((Arc::clone(&store), Arc::clone(&broadcaster), auth));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("리스너 바인딩 실패");
    let addr = listener.local_addr().expect("주소 조회 실패");
    tokio::spawn(async move {
        axum::serve(listener, router.into_make_service())
            .await
            .expect("서버 실행 실패");
    });

    TestApp {
        base: format!("http://{}", addr),
        store,
        broadcaster,
    }
}

/// 테스트용 사용자 등록
async fn register_user(client: &Client, base: &str, username: &str, email: &str) -> (i64, String) {
    let response = client
        .post(format!("{}/auth/register", base))
        .json(&json!({ "username": username, "email": email }))
        .send()
        .await
        .expect("회원 가입 요청 실패");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("응답 파싱 실패");
    (
        body["user"]["id"].as_i64().expect("사용자 id 없음"),
        body["token"].as_str().expect("토큰 없음").to_string(),
    )
}

/// 테스트용 경매 생성
async fn create_auction(
    client: &Client,
    base: &str,
    token: &str,
    title: &str,
    base_price: i64,
    start_in: Duration,
) -> Value {
    let response = client
        .post(format!("{}/auctions", base))
        .bearer_auth(token)
        .json(&json!({
            "title": title,
            "description": format!("{} 테스트용 경매입니다.", title),
            "basePrice": base_price,
            "startTime": (Utc::now() + start_in).to_rfc3339(),
        }))
        .send()
        .await
        .expect("경매 생성 요청 실패");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("응답 파싱 실패");
    body["auction"].clone()
}

/// 시작 시각 경과를 시뮬레이션해 upcoming 경매를 활성화
async fn activate_due(store: &Arc<dyn Store>) {
    store
        .promote_due_auctions(Utc::now() + Duration::days(1))
        .await
        .expect("경매 활성화 실패");
}

/// 입찰 요청 전송
async fn bid(client: &Client, base: &str, token: &str, auction_id: i64, amount: i64) -> (StatusCode, Value) {
    let response = client
        .post(format!("{}/bids/{}/bid", base, auction_id))
        .bearer_auth(token)
        .json(&json!({ "amount": amount }))
        .send()
        .await
        .expect("입찰 요청 실패");
    let status = response.status();
    let body: Value = response.json().await.expect("응답 파싱 실패");
    (status, body)
}

/// 경매 조회
async fn get_auction(client: &Client, base: &str, auction_id: i64) -> Value {
    let response = client
        .get(format!("{}/auctions/{}", base, auction_id))
        .send()
        .await
        .expect("경매 조회 실패");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("응답 파싱 실패");
    body["auction"].clone()
}

/// 회원 가입/로그인 테스트
#[tokio::test]
async fn test_register_and_login() {
    let app = spawn_app().await;
    let client = Client::new();

    let (user_id, token) = register_user(&client, &app.base, "철수", "chulsoo@example.com").await;
    assert!(user_id > 0);
    assert!(!token.is_empty());

    // 중복 이메일 거절
    let response = client
        .post(format!("{}/auth/register", app.base))
        .json(&json!({ "username": "다른철수", "email": "chulsoo@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "EMAIL_TAKEN");

    // 로그인
    let response = client
        .post(format!("{}/auth/login", app.base))
        .json(&json!({ "email": "chulsoo@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["id"].as_i64().unwrap(), user_id);

    // 미등록 이메일 로그인 거절
    let response = client
        .post(format!("{}/auth/login", app.base))
        .json(&json!({ "email": "nobody@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // 토큰 없는 프로필 조회 거절
    let response = client
        .get(format!("{}/auth/profile", app.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

/// 외부 신원 로그인 테스트
#[tokio::test]
async fn test_external_identity_login() {
    let app = spawn_app().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/external", app.base))
        .json(&json!({
            "externalId": "google-12345",
            "email": "younghee@example.com",
            "displayName": "영희"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["username"], "영희");
    let first_id = body["user"]["id"].as_i64().unwrap();

    // 같은 이메일로 다시 로그인하면 같은 사용자
    let response = client
        .post(format!("{}/auth/external", app.base))
        .json(&json!({
            "externalId": "google-12345",
            "email": "younghee@example.com",
            "displayName": "영희"
        }))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["id"].as_i64().unwrap(), first_id);

    // 필드 누락 페이로드 거절
    let response = client
        .post(format!("{}/auth/external", app.base))
        .json(&json!({ "externalId": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// 경매 생성 검증 테스트
#[tokio::test]
async fn test_create_auction_validation() {
    let app = spawn_app().await;
    let client = Client::new();
    let (_, token) = register_user(&client, &app.base, "판매자", "seller@example.com").await;

    // 과거 시작 시각 거절
    let response = client
        .post(format!("{}/auctions", app.base))
        .bearer_auth(&token)
        .json(&json!({
            "title": "과거 경매",
            "basePrice": 10000,
            "startTime": (Utc::now() - Duration::minutes(1)).to_rfc3339(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "START_TIME_NOT_FUTURE");

    // 0원 시작가 거절
    let response = client
        .post(format!("{}/auctions", app.base))
        .bearer_auth(&token)
        .json(&json!({
            "title": "공짜 경매",
            "basePrice": 0,
            "startTime": (Utc::now() + Duration::minutes(10)).to_rfc3339(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // 정상 생성
    let auction =
        create_auction(&client, &app.base, &token, "도자기", 10000, Duration::minutes(10)).await;
    assert_eq!(auction["status"], "upcoming");
    assert_eq!(auction["currentPrice"], 10000);
    assert!(auction["winner"].is_null());

    // 같은 소유자의 시작 시각 충돌 거절 (5분 간격 안)
    let response = client
        .post(format!("{}/auctions", app.base))
        .bearer_auth(&token)
        .json(&json!({
            "title": "겹치는 경매",
            "basePrice": 5000,
            "startTime": (Utc::now() + Duration::minutes(11)).to_rfc3339(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "SCHEDULE_CONFLICT");

    // 다른 소유자는 같은 시각이어도 허용
    let (_, other_token) =
        register_user(&client, &app.base, "다른판매자", "seller2@example.com").await;
    create_auction(
        &client,
        &app.base,
        &other_token,
        "다른 도자기",
        5000,
        Duration::minutes(10),
    )
    .await;
}

/// 경매 수명주기 테스트 (upcoming -> active 전이 및 브로드캐스트)
#[tokio::test]
async fn test_auction_lifecycle() {
    let app = spawn_app().await;
    let client = Client::new();
    let (_, token) = register_user(&client, &app.base, "판매자", "seller@example.com").await;

    let auction = create_auction(
        &client,
        &app.base,
        &token,
        "수명주기 경매",
        10000,
        Duration::milliseconds(1500),
    )
    .await;
    let auction_id = auction["id"].as_i64().unwrap();
    assert_eq!(auction["status"], "upcoming");

    let scheduler = AuctionScheduler::new(Arc::clone(&app.store), Arc::clone(&app.broadcaster));

    // 시작 시각 전 tick: 전이 없음
    scheduler.tick().await.unwrap();
    assert_eq!(get_auction(&client, &app.base, auction_id).await["status"], "upcoming");

    // 시작 시각 경과 후 tick: active 전이 + 이벤트 발행
    tokio::time::sleep(tokio::time::Duration::from_millis(1700)).await;
    let mut global_rx = app.broadcaster.subscribe_global();
    scheduler.tick().await.unwrap();

    assert_eq!(get_auction(&client, &app.base, auction_id).await["status"], "active");

    let event = tokio::time::timeout(tokio::time::Duration::from_secs(1), global_rx.recv())
        .await
        .expect("auctionStarted 이벤트 수신 시간 초과")
        .unwrap();
    match event {
        AuctionEvent::AuctionStarted { auction_id: id, auction } => {
            assert_eq!(id, auction_id);
            assert_eq!(auction.id, auction_id);
        }
        other => panic!("auctionStarted가 아닌 이벤트 수신: {:?}", other),
    }
    let event = tokio::time::timeout(tokio::time::Duration::from_secs(1), global_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(event, AuctionEvent::AuctionsUpdated));

    // 두 번째 tick은 아무것도 전이하지 않는다 (멱등)
    scheduler.tick().await.unwrap();
    assert!(
        tokio::time::timeout(tokio::time::Duration::from_millis(200), global_rx.recv())
            .await
            .is_err(),
        "전이 대상이 없는데 이벤트가 발행됨"
    );
}

/// 입찰 테스트 (성공, 낮은 입찰 거절, 동일 금액 거절, 상태 검증)
#[tokio::test]
async fn test_place_bid() {
    let app = spawn_app().await;
    let client = Client::new();
    let (_, seller) = register_user(&client, &app.base, "판매자", "seller@example.com").await;
    let (_, bidder) = register_user(&client, &app.base, "입찰자", "bidder@example.com").await;

    let auction =
        create_auction(&client, &app.base, &seller, "입찰 경매", 10000, Duration::minutes(5)).await;
    let auction_id = auction["id"].as_i64().unwrap();

    // 시작 전 입찰 거절
    let (status, body) = bid(&client, &app.base, &bidder, auction_id, 15000).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "NOT_STARTED");

    activate_due(&app.store).await;

    // 입찰 이벤트 수신 준비
    let mut room_rx = app.broadcaster.join(auction_id).await;

    // 정상 입찰
    let (status, body) = bid(&client, &app.base, &bidder, auction_id, 15000).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["currentPrice"], 15000);
    assert_eq!(body["bid"]["amount"], 15000);

    let event = tokio::time::timeout(tokio::time::Duration::from_secs(1), room_rx.recv())
        .await
        .expect("bidPlaced 이벤트 수신 시간 초과")
        .unwrap();
    match event {
        AuctionEvent::BidPlaced { bid, current_price } => {
            assert_eq!(bid.amount, 15000);
            assert_eq!(current_price, 15000);
        }
        other => panic!("bidPlaced가 아닌 이벤트 수신: {:?}", other),
    }

    // 현재 가격보다 낮은 입찰 거절, 상태 불변
    let (status, body) = bid(&client, &app.base, &bidder, auction_id, 12000).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "LOW_BID");
    let auction = get_auction(&client, &app.base, auction_id).await;
    assert_eq!(auction["currentPrice"], 15000);

    // 동일 금액 입찰도 항상 거절 (경계값)
    let (status, body) = bid(&client, &app.base, &bidder, auction_id, 15000).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "LOW_BID");

    // 존재하지 않는 경매 입찰
    let (status, _) = bid(&client, &app.base, &bidder, 99999, 20000).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // 입찰 이력에는 성공한 입찰만 남는다
    let response = client
        .get(format!("{}/auctions/{}/bids", app.base, auction_id))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["bids"].as_array().unwrap().len(), 1);

    // 참가자 집합에 입찰자가 추가된다
    let auction = get_auction(&client, &app.base, auction_id).await;
    let participants = auction["participants"].as_array().unwrap();
    assert_eq!(participants.len(), 2); // 소유자 + 입찰자
}

/// 경매 종료 테스트 (낙찰자 확정, 권한, 멱등 종료 금지)
#[tokio::test]
async fn test_end_auction() {
    let app = spawn_app().await;
    let client = Client::new();
    let (_, seller) = register_user(&client, &app.base, "판매자", "seller@example.com").await;
    let (winner_id, winner) = register_user(&client, &app.base, "낙찰자", "winner@example.com").await;
    let (_, other) = register_user(&client, &app.base, "다른입찰자", "other@example.com").await;

    let auction =
        create_auction(&client, &app.base, &seller, "종료 경매", 5000, Duration::minutes(5)).await;
    let auction_id = auction["id"].as_i64().unwrap();
    activate_due(&app.store).await;

    // 입찰 세 건 (수락되려면 단조 증가해야 한다)
    let (status, _) = bid(&client, &app.base, &other, auction_id, 10000).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = bid(&client, &app.base, &other, auction_id, 12000).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = bid(&client, &app.base, &winner, auction_id, 15000).await;
    assert_eq!(status, StatusCode::CREATED);

    // 소유자가 아닌 사용자의 종료 거절, 상태 불변
    let response = client
        .post(format!("{}/auctions/{}/end", app.base, auction_id))
        .bearer_auth(&other)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(get_auction(&client, &app.base, auction_id).await["status"], "active");

    // 종료 이벤트 수신 준비
    let mut room_rx = app.broadcaster.join(auction_id).await;

    // 소유자 종료: 최고 입찰자가 낙찰된다
    let response = client
        .post(format!("{}/auctions/{}/end", app.base, auction_id))
        .bearer_auth(&seller)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["auction"]["status"], "ended");
    assert_eq!(body["auction"]["winner"].as_i64().unwrap(), winner_id);
    assert_eq!(body["auction"]["winningBid"], 15000);

    let event = tokio::time::timeout(tokio::time::Duration::from_secs(1), room_rx.recv())
        .await
        .expect("auctionEnded 이벤트 수신 시간 초과")
        .unwrap();
    match event {
        AuctionEvent::AuctionEnded { winner, winning_bid, .. } => {
            assert_eq!(winner, Some(winner_id));
            assert_eq!(winning_bid, Some(15000));
        }
        other => panic!("auctionEnded가 아닌 이벤트 수신: {:?}", other),
    }

    // 재종료는 오류이고 낙찰 결과는 변하지 않는다
    let response = client
        .post(format!("{}/auctions/{}/end", app.base, auction_id))
        .bearer_auth(&seller)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "ALREADY_ENDED");
    let auction = get_auction(&client, &app.base, auction_id).await;
    assert_eq!(auction["winner"].as_i64().unwrap(), winner_id);
    assert_eq!(auction["winningBid"], 15000);

    // 종료된 경매에는 입찰할 수 없다
    let (status, body) = bid(&client, &app.base, &other, auction_id, 99000).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "ALREADY_ENDED");

    // 낙찰자 프로필에 낙찰 기록이 남는다
    let response = client
        .get(format!("{}/auth/profile", app.base))
        .bearer_auth(&winner)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let won = body["wonAuctions"].as_array().unwrap();
    assert_eq!(won.len(), 1);
    assert_eq!(won[0]["auctionId"].as_i64().unwrap(), auction_id);
    assert_eq!(won[0]["amount"], 15000);
}

/// 입찰 없는 경매 종료 테스트
#[tokio::test]
async fn test_end_auction_without_bids() {
    let app = spawn_app().await;
    let client = Client::new();
    let (_, seller) = register_user(&client, &app.base, "판매자", "seller@example.com").await;

    let auction =
        create_auction(&client, &app.base, &seller, "유찰 경매", 5000, Duration::minutes(5)).await;
    let auction_id = auction["id"].as_i64().unwrap();
    activate_due(&app.store).await;

    let response = client
        .post(format!("{}/auctions/{}/end", app.base, auction_id))
        .bearer_auth(&seller)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["auction"]["status"], "ended");
    assert!(body["auction"]["winner"].is_null());
    assert!(body["auction"]["winningBid"].is_null());
}

/// 참가 신청 규칙 테스트
#[tokio::test]
async fn test_registration_rules() {
    let app = spawn_app().await;
    let client = Client::new();
    let (_, seller) = register_user(&client, &app.base, "판매자", "seller@example.com").await;
    let (user_id, user) = register_user(&client, &app.base, "참가자", "user@example.com").await;

    let auction =
        create_auction(&client, &app.base, &seller, "신청 경매", 5000, Duration::minutes(5)).await;
    let auction_id = auction["id"].as_i64().unwrap();

    // 소유자는 자신의 경매에 신청할 수 없다
    let response = client
        .post(format!("{}/auctions/{}/register", app.base, auction_id))
        .bearer_auth(&seller)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // 정상 신청
    let response = client
        .post(format!("{}/auctions/{}/register", app.base, auction_id))
        .bearer_auth(&user)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert!(body["auction"]["registrations"]
        .as_array()
        .unwrap()
        .contains(&json!(user_id)));

    // 중복 신청 거절
    let response = client
        .post(format!("{}/auctions/{}/register", app.base, auction_id))
        .bearer_auth(&user)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "ALREADY_REGISTERED");

    // 활성화 이후 신청 거절
    activate_due(&app.store).await;
    let (_, late_user) = register_user(&client, &app.base, "지각생", "late@example.com").await;
    let response = client
        .post(format!("{}/auctions/{}/register", app.base, auction_id))
        .bearer_auth(&late_user)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "NOT_UPCOMING");
}

/// 동시성 입찰 테스트: 100과 101이 동시에 들어오면 최종 가격은 항상 101
#[tokio::test]
async fn test_concurrent_two_bids() {
    let app = spawn_app().await;
    let client = Client::new();
    let (_, seller) = register_user(&client, &app.base, "판매자", "seller@example.com").await;
    let (_, bidder_a) = register_user(&client, &app.base, "입찰자A", "a@example.com").await;
    let (_, bidder_b) = register_user(&client, &app.base, "입찰자B", "b@example.com").await;

    let auction =
        create_auction(&client, &app.base, &seller, "동시성 경매", 50, Duration::minutes(5)).await;
    let auction_id = auction["id"].as_i64().unwrap();
    activate_due(&app.store).await;

    let a = {
        let client = client.clone();
        let base = app.base.clone();
        let token = bidder_a.clone();
        tokio::spawn(async move { bid(&client, &base, &token, auction_id, 100).await })
    };
    let b = {
        let client = client.clone();
        let base = app.base.clone();
        let token = bidder_b.clone();
        tokio::spawn(async move { bid(&client, &base, &token, auction_id, 101).await })
    };
    let (ra, rb) = (a.await.unwrap(), b.await.unwrap());

    // 101은 반드시 수락된다 (100이 먼저 커밋됐더라도 101 > 100)
    assert_eq!(rb.0, StatusCode::CREATED, "101 입찰이 거절됨: {:?}", rb.1);
    // 100은 도착 순서에 따라 수락 또는 거절되지만 최종 가격을 내리지는 못한다
    if ra.0 != StatusCode::CREATED {
        assert_eq!(ra.1["code"], "LOW_BID");
    }
    let current = get_auction(&client, &app.base, auction_id).await["currentPrice"]
        .as_i64()
        .unwrap();
    assert_eq!(current, 101);
}

/// 동시성 입찰 폭주 테스트: 최종 가격은 항상 수락된 최고 입찰가
#[tokio::test]
async fn test_concurrent_bidding_storm() {
    let app = spawn_app().await;
    let client = Client::new();
    let (_, seller) = register_user(&client, &app.base, "판매자", "seller@example.com").await;

    let mut bidders = Vec::new();
    for i in 1..=5 {
        let (_, token) =
            register_user(&client, &app.base, &format!("입찰자{}", i), &format!("b{}@example.com", i))
                .await;
        bidders.push(token);
    }

    let auction =
        create_auction(&client, &app.base, &seller, "폭주 경매", 10000, Duration::minutes(5)).await;
    let auction_id = auction["id"].as_i64().unwrap();
    activate_due(&app.store).await;

    // 30개의 동시 입찰 생성
    let mut handles = Vec::new();
    for i in 1..=30i64 {
        let client = client.clone();
        let base = app.base.clone();
        let token = bidders[(i as usize) % bidders.len()].clone();
        let amount = 10000 + i * 1000;
        handles.push(tokio::spawn(async move {
            bid(&client, &base, &token, auction_id, amount).await
        }));
    }

    let mut successful_bids = 0;
    let mut failed_bids = 0;
    for handle in handles {
        let (status, body) = handle.await.unwrap();
        if status == StatusCode::CREATED {
            successful_bids += 1;
        } else {
            assert_eq!(status, StatusCode::BAD_REQUEST, "예상 밖 오류: {:?}", body);
            assert_eq!(body["code"], "LOW_BID");
            failed_bids += 1;
        }
    }
    assert_eq!(successful_bids + failed_bids, 30);
    assert!(successful_bids >= 1);

    // 최고 입찰(40000)은 어떤 커밋 순서에서도 반드시 수락된다
    let auction = get_auction(&client, &app.base, auction_id).await;
    assert_eq!(auction["currentPrice"], 40000);
    assert!(auction["currentPrice"].as_i64().unwrap() >= auction["basePrice"].as_i64().unwrap());

    // 수락된 입찰 수와 이력이 일치한다
    let response = client
        .get(format!("{}/auctions/{}/bids", app.base, auction_id))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let bids = body["bids"].as_array().unwrap();
    assert_eq!(bids.len(), successful_bids);
    // 이력은 금액 내림차순
    assert_eq!(bids[0]["amount"], 40000);
}

/// 브로드캐스트 채널 룸 격리 테스트
#[tokio::test]
async fn test_broadcaster_room_scoping() {
    let broadcaster = Broadcaster::new();

    let mut room1 = broadcaster.join(1).await;
    let mut room2 = broadcaster.join(2).await;
    let mut global = broadcaster.subscribe_global();

    broadcaster
        .broadcast_to_room(1, AuctionEvent::AuctionsUpdated)
        .await;

    // 룸 1 구독자만 수신한다
    let event = tokio::time::timeout(tokio::time::Duration::from_secs(1), room1.recv())
        .await
        .expect("룸 이벤트 수신 시간 초과")
        .unwrap();
    assert!(matches!(event, AuctionEvent::AuctionsUpdated));
    assert!(
        tokio::time::timeout(tokio::time::Duration::from_millis(100), room2.recv())
            .await
            .is_err()
    );
    assert!(
        tokio::time::timeout(tokio::time::Duration::from_millis(100), global.recv())
            .await
            .is_err()
    );

    // 전역 이벤트는 룸 구독과 무관하게 전달된다
    broadcaster.broadcast_global(AuctionEvent::AuctionsUpdated);
    let event = tokio::time::timeout(tokio::time::Duration::from_secs(1), global.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(event, AuctionEvent::AuctionsUpdated));

    // 구독자가 모두 떠난 룸은 다음 브로드캐스트에서 정리된다
    drop(room2);
    broadcaster
        .broadcast_to_room(2, AuctionEvent::AuctionsUpdated)
        .await;
    assert_eq!(broadcaster.room_count().await, 1);
}

/// 실시간 이벤트 직렬화 형식 테스트 (클라이언트 계약)
#[tokio::test]
async fn test_event_wire_format() {
    let event = AuctionEvent::AuctionEnded {
        auction_id: 7,
        winner: Some(3),
        winning_bid: Some(15000),
    };
    let value: Value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["event"], "auctionEnded");
    assert_eq!(value["data"]["auctionId"], 7);
    assert_eq!(value["data"]["winner"], 3);
    assert_eq!(value["data"]["winningBid"], 15000);

    let value: Value = serde_json::to_value(AuctionEvent::UserJoinedLobby {
        user_id: 1,
        username: "영희".to_string(),
    })
    .unwrap();
    assert_eq!(value["event"], "userJoinedLobby");
    assert_eq!(value["data"]["username"], "영희");

    let value: Value = serde_json::to_value(AuctionEvent::AuctionsUpdated).unwrap();
    assert_eq!(value["event"], "auctionsUpdated");
}
