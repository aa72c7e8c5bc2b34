//! 메트릭 싱크 포트.
//!
//! 구현: `ecoprompt-app::sink` (저장소 채널, 콘솔).
//! 모니터는 전달 결과를 기다리거나 성공을 가정하지 않는다 (fire-and-forget).

use crate::error::CoreError;
use crate::models::metrics::MetricsRecord;

/// 확정된 메트릭 전달
pub trait MetricsSink: Send + Sync {
    /// 블로킹 없이 전달을 시도한다. 실패 시 호출자가 로컬 출력으로 폴백한다.
    fn deliver(&self, record: &MetricsRecord) -> Result<(), CoreError>;
}
