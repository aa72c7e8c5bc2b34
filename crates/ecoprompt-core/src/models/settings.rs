//! 런타임 설정 변경 및 진단 모델.

use serde::{Deserialize, Serialize};

use super::send::SendRecord;

/// 설정 채널로 들어오는 부분 업데이트
///
/// 지정된 필드만 반영된다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    /// 문자/토큰 비율
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_ratio: Option<f64>,
    /// 디버그 진단 로그 활성화
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_enabled: Option<bool>,
}

impl SettingsUpdate {
    pub fn token_ratio(ratio: f64) -> Self {
        Self {
            token_ratio: Some(ratio),
            ..Self::default()
        }
    }

    pub fn debug(enabled: bool) -> Self {
        Self {
            debug_enabled: Some(enabled),
            ..Self::default()
        }
    }
}

/// 수동 진단용 세션 스냅샷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugSnapshot {
    /// 현재 추적 중인 노드 수
    pub tracked_nodes: usize,
    /// 확정되어 다시 추적하지 않는 노드 수
    pub retired_nodes: usize,
    /// 대기 중인 타이머 수 (조용한 기간 + 지연 읽기)
    pub pending_timers: usize,
    /// 현재 전송 기록
    pub active_send: Option<SendRecord>,
}
