//! ecoprompt 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 이 타입을 그대로 반환하거나 `#[from] CoreError`로 래핑한다.

use thiserror::Error;

/// 코어 레이어 에러.
/// 직렬화, 설정, 셀렉터, 전송 등 도메인 공통 에러를 정의한다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패 — {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 리소스를 찾을 수 없음
    #[error("{resource_type} 미발견: {id}")]
    NotFound {
        /// 리소스 종류 (예: "Element", "Metrics")
        resource_type: String,
        /// 리소스 식별자
        id: String,
    },

    /// 셀렉터 파싱/평가 실패 (셀렉터 단위로 격리된다)
    #[error("셀렉터 에러 `{selector}`: {message}")]
    Selector {
        /// 원본 셀렉터 문자열
        selector: String,
        /// 실패 사유
        message: String,
    },

    /// 메트릭 전송 실패 (싱크 닫힘, 저장 실패 등)
    #[error("전송 에러: {0}")]
    Transport(String),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// 셀렉터 에러 생성 헬퍼
    pub fn selector(selector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.into(),
        }
    }
}
