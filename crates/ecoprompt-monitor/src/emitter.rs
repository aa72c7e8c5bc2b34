//! 메트릭 산출.
//!
//! 확정된 노드에서 지속 시간, 추정 토큰 수, 초당 토큰 수를 계산해 `MetricsRecord`를 만든다.

use chrono::{DateTime, Utc};
use ecoprompt_core::config::{sanitize_token_ratio, MonitorConfig};
use ecoprompt_core::models::metrics::MetricsRecord;
use ecoprompt_core::models::send::SendRecord;
use uuid::Uuid;

use crate::tracker::TrackedNode;

/// 길이 기반 토큰 추정. 비어 있지 않으면 최소 1
pub fn estimate_tokens(text: &str, token_ratio: f64) -> u64 {
    let chars = text.chars().count();
    if chars == 0 {
        return 0;
    }
    let ratio = sanitize_token_ratio(token_ratio);
    ((chars as f64 / ratio).round() as u64).max(1)
}

/// 초당 토큰 수. duration이 0이면 None
pub fn tokens_per_second(tokens: u64, duration_ms: u64) -> Option<f64> {
    if duration_ms == 0 {
        return None;
    }
    Some(tokens as f64 / (duration_ms as f64 / 1000.0))
}

/// 앞에서부터 최대 `max_chars` 문자
pub fn snippet(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// 제공자 단위 메트릭 생성기
#[derive(Debug, Clone)]
pub struct MetricsEmitter {
    provider: String,
}

impl MetricsEmitter {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// 확정 시각 `now` 기준 메트릭 생성. 토큰 비율은 호출 시점의 설정값을 사용한다
    pub fn emit(
        &self,
        node: &TrackedNode,
        active_send: Option<&SendRecord>,
        config: &MonitorConfig,
        now: DateTime<Utc>,
    ) -> MetricsRecord {
        let duration_ms = (now - node.first_observed_at).num_milliseconds().max(0) as u64;
        let tokens = estimate_tokens(&node.last_text, config.token_ratio);

        MetricsRecord {
            record_id: Uuid::new_v4(),
            provider: self.provider.clone(),
            send_snippet: active_send.map(|send| snippet(&send.text, config.snippet_chars)),
            output_snippet: snippet(&node.last_text, config.snippet_chars),
            estimated_token_count: tokens,
            latency_ms: node.latency_ms,
            duration_ms,
            tokens_per_second: tokens_per_second(tokens, duration_ms),
            timestamp: now,
        }
    }
}
