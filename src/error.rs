/// 서비스 전역 에러 타입
/// 모든 선행 조건 위반은 동기적으로 호출자에게 반환된다.
// region:    --- Imports
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

// endregion: --- Imports

// region:    --- Error
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// 참조된 경매/사용자가 존재하지 않음
    #[error("{0}")]
    NotFound(String),

    /// 권한 없음 (소유자가 아닌 사용자의 종료 요청 등)
    #[error("{0}")]
    Forbidden(String),

    /// 상태 불변식 위반 (비활성 경매, 낮은 입찰가, 이미 종료된 경매 등)
    #[error("{message}")]
    Conflict {
        code: &'static str,
        message: String,
    },

    /// 잘못된 입력
    #[error("{0}")]
    Validation(String),

    /// 저장소 오류
    #[error("저장소 오류: {0}")]
    Store(#[from] sqlx::Error),
}

impl Error {
    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            message: message.into(),
        }
    }

    /// 클라이언트 응답용 에러 코드
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "NOT_FOUND",
            Error::Forbidden(_) => "FORBIDDEN",
            Error::Conflict { code, .. } => code,
            Error::Validation(_) => "VALIDATION",
            Error::Store(_) => "STORE_ERROR",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::Conflict { .. } => StatusCode::BAD_REQUEST,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(serde_json::json!({
                "error": self.to_string(),
                "code": self.code(),
            })),
        )
            .into_response()
    }
}
// endregion: --- Error
