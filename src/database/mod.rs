/// 데이터베이스 연결 관리
/// 커넥션 풀 생성, 트랜잭션 실행, 스키마 부트스트랩을 담당한다.
// region:    --- Imports
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::future::Future;
use std::pin::Pin;
use tracing::info;

// endregion: --- Imports

// region:    --- Database Manager
pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    /// 커넥션 풀 생성
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 트랜잭션 실행: 클로저가 실패하면 롤백한다
    pub async fn transaction<F, R, E>(&self, f: F) -> Result<R, E>
    where
        F: for<'c> FnOnce(
            &'c mut sqlx::Transaction<'_, sqlx::Postgres>,
        ) -> Pin<Box<dyn Future<Output = Result<R, E>> + Send + 'c>>,
        E: From<sqlx::Error>,
    {
        let mut tx = self.pool.begin().await?;
        match f(&mut tx).await {
            Ok(r) => {
                tx.commit().await?;
                Ok(r)
            }
            Err(e) => {
                tx.rollback().await?;
                Err(e)
            }
        }
    }

    /// 스키마 부트스트랩 (멱등: CREATE TABLE IF NOT EXISTS)
    pub async fn initialize_database(&self) -> Result<(), sqlx::Error> {
        let schema_sql = include_str!("../sql/01-create-schema.sql");
        for statement in schema_sql.split(';') {
            let statement = statement.trim();
            if !statement.is_empty() {
                sqlx::query(statement).execute(&self.pool).await?;
            }
        }
        info!("{:<12} --> 스키마 부트스트랩 완료", "Database");
        Ok(())
    }
}
// endregion: --- Database Manager
