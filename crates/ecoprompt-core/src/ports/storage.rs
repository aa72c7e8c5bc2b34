//! 메트릭 이력 저장소 포트.
//!
//! 구현: `ecoprompt-storage` crate (rusqlite)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::metrics::MetricsRecord;

/// 메트릭 이력 저장소 (최신 N개 유지)
#[async_trait]
pub trait MetricsHistory: Send + Sync {
    /// 메트릭 저장
    async fn save_metrics(&self, record: &MetricsRecord) -> Result<(), CoreError>;

    /// 최신순 조회
    async fn recent_metrics(&self, limit: usize) -> Result<Vec<MetricsRecord>, CoreError>;

    /// 마지막 메트릭 조회
    async fn last_metrics(&self) -> Result<Option<MetricsRecord>, CoreError>;

    /// 이력 상한 적용 (초과분 삭제), 삭제된 수 반환
    async fn enforce_history_limit(&self) -> Result<usize, CoreError>;
}
