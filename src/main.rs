// region:    --- Imports
use auctionverse::auth::{Authenticator, SessionManager};
use auctionverse::broadcast::Broadcaster;
use auctionverse::database::DatabaseManager;
use auctionverse::handlers;
use auctionverse::scheduler::AuctionScheduler;
use auctionverse::store::{MemoryStore, PostgresStore, Store};
use axum::extract::DefaultBodyLimit;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // 저장소 선택: DATABASE_URL이 있으면 Postgres, 없으면 인메모리
    let store: Arc<dyn Store> = match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            let db_manager = Arc::new(DatabaseManager::new(&database_url).await?);
            if let Err(e) = db_manager.initialize_database().await {
                error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
                return Err(e.into());
            }
            info!("{:<12} --> 데이터베이스 초기화 성공", "Main");
            Arc::new(PostgresStore::new(db_manager))
        }
        Err(_) => {
            warn!(
                "{:<12} --> DATABASE_URL 미설정: 인메모리 저장소 사용",
                "Main"
            );
            Arc::new(MemoryStore::new())
        }
    };

    // 브로드캐스트 채널 생성 (전역 싱글턴 대신 명시적으로 주입)
    let broadcaster = Arc::new(Broadcaster::new());

    // 세션 관리자 생성
    let auth: Arc<dyn Authenticator> =
        Arc::new(SessionManager::new(Arc::clone(&store)));

    // 경매 수명주기 엔진 시작
    AuctionScheduler::new(Arc::clone(&store), Arc::clone(&broadcaster)).start();

    // 테스트 페이지를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 라우터 설정
    let routes_all = handlers::routes((store, broadcaster, auth))
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024 * 20));

    // 리스너 생성
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
