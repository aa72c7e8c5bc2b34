//! 응답 메트릭 모델.
//!
//! 스트림 완료 시점에 한 번 생성되어 싱크로 소유권이 넘어간다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 완료된 어시스턴트 응답 하나의 메트릭
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    /// 레코드 고유 ID
    pub record_id: Uuid,
    /// 제공자 식별자 (예: "openai", "anthropic", 또는 호스트명)
    pub provider: String,
    /// 전송 텍스트 앞부분 (전송 기록이 없으면 None)
    pub send_snippet: Option<String>,
    /// 출력 텍스트 앞부분
    pub output_snippet: String,
    /// 추정 토큰 수 (문자 수 / 토큰 비율)
    pub estimated_token_count: u64,
    /// 첫 토큰까지의 지연 (ms), 전송 기록이 없으면 None
    pub latency_ms: Option<u64>,
    /// 첫 관찰부터 완료까지 (ms)
    pub duration_ms: u64,
    /// 초당 토큰 수, duration이 0이면 None
    pub tokens_per_second: Option<f64>,
    /// 확정 시각
    pub timestamp: DateTime<Utc>,
}

impl MetricsRecord {
    /// 한 줄 상태 요약 (`tokens: N | latency: Xms | t/s: Y`)
    pub fn status_line(&self) -> String {
        let tps = match self.tokens_per_second {
            Some(tps) if tps > 0.0 => format!("{tps:.1}"),
            _ => "n/a".to_string(),
        };
        format!(
            "tokens: {} | latency: {}ms | t/s: {}",
            self.estimated_token_count,
            self.latency_ms.unwrap_or(0),
            tps
        )
    }
}

impl fmt::Display for MetricsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.provider, self.status_line())
    }
}
