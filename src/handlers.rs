// region:    --- Imports
use crate::auction::commands::{
    create_auction, end_auction, register_for_auction, CreateAuctionCommand,
};
use crate::auth::model::User;
use crate::auth::{Authenticator, DirectIdentityResolver, IdentityResolver};
use crate::bidding::commands::{place_bid, PlaceBidCommand};
use crate::broadcast::{ws, Broadcaster};
use crate::error::{Error, Result};
use crate::store::{NewUser, Store};
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- App State & Routes
pub type AppState = (Arc<dyn Store>, Arc<Broadcaster>, Arc<dyn Authenticator>);

/// 라우터 설정
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/auth/register", post(handle_register))
        .route("/auth/login", post(handle_login))
        .route("/auth/external", post(handle_external_auth))
        .route("/auth/profile", get(handle_get_profile))
        .route("/auctions", post(handle_create_auction).get(handle_list_auctions))
        .route("/auctions/:id", get(handle_get_auction))
        .route("/auctions/:id/bids", get(handle_get_auction_bids))
        .route("/auctions/:id/register", post(handle_register_for_auction))
        .route("/auctions/:id/end", post(handle_end_auction))
        .route("/bids/:auction_id/bid", post(handle_place_bid))
        .route("/ws", get(ws::handle_ws))
        .with_state(state)
}

/// Authorization: Bearer 토큰에서 요청 사용자 확인
async fn current_user(headers: &HeaderMap, auth: &Arc<dyn Authenticator>) -> Result<User> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| Error::Forbidden("인증이 필요합니다.".to_string()))?;
    auth.verify_token(token).await
}
// endregion: --- App State & Routes

// region:    --- Auth Handlers

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
}

/// 회원 가입
/// 자격 증명 보관은 외부 협력자 소관이므로 여기서는 프로필 생성과
/// 세션 발급만 수행한다.
pub async fn handle_register(
    State((store, _, auth)): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    info!("{:<12} --> 회원 가입 요청: {:?}", "Auth", req.email);

    if req.username.trim().is_empty() || req.email.trim().is_empty() {
        return Err(Error::Validation(
            "사용자 이름과 이메일은 필수입니다.".to_string(),
        ));
    }
    if store.find_user_by_email(&req.email).await?.is_some() {
        return Err(Error::conflict(
            "EMAIL_TAKEN",
            "이미 등록된 이메일입니다.",
        ));
    }

    let user = store
        .insert_user(NewUser {
            username: req.username,
            email: req.email,
        })
        .await?;
    let token = auth.issue_session(&user).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "user": user, "token": token })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
}

/// 로그인
pub async fn handle_login(
    State((store, _, auth)): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    info!("{:<12} --> 로그인 요청: {:?}", "Auth", req.email);

    let user = store
        .find_user_by_email(&req.email)
        .await?
        .ok_or_else(|| Error::NotFound("등록되지 않은 이메일입니다.".to_string()))?;
    let token = auth.issue_session(&user).await?;

    Ok(Json(serde_json::json!({ "user": user, "token": token })))
}

/// 외부 신원 공급자 로그인
/// 공급자 교환 결과를 IdentityResolver로 정규화한 뒤 이메일 기준으로
/// 사용자를 찾거나 생성한다.
pub async fn handle_external_auth(
    State((store, _, auth)): State<AppState>,
    Json(payload): Json<serde_json::Value>,
) -> Result<impl IntoResponse> {
    info!("{:<12} --> 외부 신원 로그인 요청", "Auth");

    // 신원 해석기 생성
    let resolver = DirectIdentityResolver;
    let identity = resolver.resolve_external_identity(payload).await?;

    let user = match store.find_user_by_email(&identity.email).await? {
        Some(user) => user,
        None => {
            store
                .insert_user(NewUser {
                    username: identity.display_name,
                    email: identity.email,
                })
                .await?
        }
    };
    let token = auth.issue_session(&user).await?;

    Ok(Json(serde_json::json!({ "user": user, "token": token })))
}

/// 프로필 조회 (낙찰 이력 포함)
pub async fn handle_get_profile(
    State((store, _, auth)): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let user = current_user(&headers, &auth).await?;
    info!("{:<12} --> 프로필 조회: user={}", "Auth", user.id);

    let won_auctions = store.won_auctions(user.id).await?;
    Ok(Json(
        serde_json::json!({ "user": user, "wonAuctions": won_auctions }),
    ))
}

// endregion: --- Auth Handlers

// region:    --- Command Handlers

/// 경매 생성 요청 처리
pub async fn handle_create_auction(
    State((store, broadcaster, auth)): State<AppState>,
    headers: HeaderMap,
    Json(cmd): Json<CreateAuctionCommand>,
) -> Result<impl IntoResponse> {
    let user = current_user(&headers, &auth).await?;
    let auction = create_auction(&store, &broadcaster, cmd, user.id).await?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "auction": auction }))))
}

/// 참가 신청 요청 처리
pub async fn handle_register_for_auction(
    State((store, _, auth)): State<AppState>,
    headers: HeaderMap,
    Path(auction_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let user = current_user(&headers, &auth).await?;
    let auction = register_for_auction(&store, auction_id, user.id).await?;
    Ok(Json(serde_json::json!({ "auction": auction })))
}

/// 경매 종료 요청 처리
pub async fn handle_end_auction(
    State((store, broadcaster, auth)): State<AppState>,
    headers: HeaderMap,
    Path(auction_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let user = current_user(&headers, &auth).await?;
    let auction = end_auction(&store, &broadcaster, auction_id, user.id).await?;
    Ok(Json(serde_json::json!({ "auction": auction })))
}

/// 입찰 요청 처리
pub async fn handle_place_bid(
    State((store, broadcaster, auth)): State<AppState>,
    headers: HeaderMap,
    Path(auction_id): Path<i64>,
    Json(cmd): Json<PlaceBidCommand>,
) -> Result<impl IntoResponse> {
    let user = current_user(&headers, &auth).await?;
    let (bid, current_price) =
        place_bid(&store, &broadcaster, auction_id, user.id, cmd.amount).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "bid": bid, "currentPrice": current_price })),
    ))
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// 모든 경매 조회
pub async fn handle_list_auctions(
    State((store, _, _)): State<AppState>,
) -> Result<impl IntoResponse> {
    info!("{:<12} --> 모든 경매 조회", "HandlerQuery");
    let auctions = store.list_auctions().await?;
    Ok(Json(serde_json::json!({ "auctions": auctions })))
}

/// 경매 조회
pub async fn handle_get_auction(
    State((store, _, _)): State<AppState>,
    Path(auction_id): Path<i64>,
) -> Result<impl IntoResponse> {
    info!("{:<12} --> 경매 조회 id: {}", "HandlerQuery", auction_id);
    let auction = store
        .get_auction(auction_id)
        .await?
        .ok_or_else(|| Error::NotFound("경매를 찾을 수 없습니다.".to_string()))?;
    Ok(Json(serde_json::json!({ "auction": auction })))
}

/// 입찰 이력 조회
pub async fn handle_get_auction_bids(
    State((store, _, _)): State<AppState>,
    Path(auction_id): Path<i64>,
) -> Result<impl IntoResponse> {
    info!("{:<12} --> 입찰 이력 조회 id: {}", "HandlerQuery", auction_id);
    if store.get_auction(auction_id).await?.is_none() {
        return Err(Error::NotFound("경매를 찾을 수 없습니다.".to_string()));
    }
    let bids = store.bids_for_auction(auction_id).await?;
    Ok(Json(serde_json::json!({ "bids": bids })))
}

// endregion: --- Query Handlers
