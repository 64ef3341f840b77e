/// 인증 인터페이스
/// 세션 발급과 토큰 검증 두 연산만 노출한다. 외부 신원 공급자와의
/// 교환은 IdentityResolver 구현체 하나로 분리되어 있어 특정 공급자에
/// 묶이지 않는다.
// region:    --- Imports
use crate::auth::model::User;
use crate::error::{Error, Result};
use crate::store::Store;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

pub mod model;

// endregion: --- Imports

// region:    --- Authenticator
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// 세션 발급: 불투명 토큰 반환
    async fn issue_session(&self, user: &User) -> Result<String>;

    /// 토큰 검증: 유효하면 사용자 반환
    async fn verify_token(&self, token: &str) -> Result<User>;
}

/// 인메모리 세션 관리자
/// 토큰은 무작위 uuid이며 프로세스 수명 동안만 유효하다.
pub struct SessionManager {
    store: Arc<dyn Store>,
    sessions: RwLock<HashMap<String, i64>>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl Authenticator for SessionManager {
    async fn issue_session(&self, user: &User) -> Result<String> {
        let token = Uuid::new_v4().to_string();
        self.sessions.write().await.insert(token.clone(), user.id);
        info!("{:<12} --> 세션 발급: user={}", "Auth", user.id);
        Ok(token)
    }

    async fn verify_token(&self, token: &str) -> Result<User> {
        let user_id = {
            let sessions = self.sessions.read().await;
            sessions.get(token).copied()
        };
        let user_id = user_id
            .ok_or_else(|| Error::Forbidden("유효하지 않은 세션입니다.".to_string()))?;
        self.store
            .get_user(user_id)
            .await?
            .ok_or_else(|| Error::Forbidden("유효하지 않은 세션입니다.".to_string()))
    }
}
// endregion: --- Authenticator

// region:    --- Identity Resolver
/// 외부 신원 공급자가 전달한 프로필
#[derive(Debug, Clone)]
pub struct ExternalIdentity {
    pub external_id: String,
    pub email: String,
    pub display_name: String,
}

/// 공급자별 교환 로직의 공통 인터페이스
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve_external_identity(
        &self,
        payload: serde_json::Value,
    ) -> Result<ExternalIdentity>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DirectIdentityPayload {
    external_id: String,
    email: String,
    display_name: String,
}

/// 공급자 페이로드를 그대로 신뢰하는 구현체
/// 게이트웨이 등 상위 계층에서 이미 검증된 프로필을 받는 배치용이다.
pub struct DirectIdentityResolver;

#[async_trait]
impl IdentityResolver for DirectIdentityResolver {
    async fn resolve_external_identity(
        &self,
        payload: serde_json::Value,
    ) -> Result<ExternalIdentity> {
        let payload: DirectIdentityPayload = serde_json::from_value(payload)
            .map_err(|e| Error::Validation(format!("잘못된 신원 페이로드: {}", e)))?;
        if payload.email.trim().is_empty() {
            return Err(Error::Validation("이메일은 비어 있을 수 없습니다.".to_string()));
        }
        Ok(ExternalIdentity {
            external_id: payload.external_id,
            email: payload.email,
            display_name: payload.display_name,
        })
    }
}
// endregion: --- Identity Resolver
