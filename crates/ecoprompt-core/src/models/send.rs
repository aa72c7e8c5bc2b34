//! 사용자 전송 모델.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::dom::ElementId;

/// 감지된 사용자 전송 기록
///
/// 세션에는 항상 가장 최근 기록 하나만 존재한다. 다음 전송이 감지되면 병합 없이 교체된다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRecord {
    /// 전송된 텍스트 (trim 완료)
    pub text: String,
    /// 전송 시각
    pub sent_at: DateTime<Utc>,
}

/// 전송 의도 — 지연 읽기 전 단계
///
/// 감지기는 이벤트 시점에 의도만 판단하고, 실제 텍스트 읽기는 짧은 지연 후 수행된다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendIntent {
    /// 텍스트를 다시 읽을 입력 요소
    pub source: ElementId,
    /// 이벤트 시점의 텍스트 (지연 읽기 결과가 비어 있을 때 사용)
    pub text_at_trigger: String,
}
