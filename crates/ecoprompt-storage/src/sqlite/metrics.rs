//! 메트릭 이력 스토리지 (MetricsHistory 포트 구현).
//!
//! 저장 순서(최신 우선)로 조회하며, 저장할 때마다 최신 `history_limit`개만 남긴다.

use async_trait::async_trait;
use ecoprompt_core::error::CoreError;
use ecoprompt_core::models::metrics::MetricsRecord;
use ecoprompt_core::ports::storage::MetricsHistory;
use tracing::{debug, warn};

use super::SqliteStorage;

impl SqliteStorage {
    /// 제공자별 최신순 조회
    pub fn metrics_by_provider(
        &self,
        provider: &str,
        limit: usize,
    ) -> Result<Vec<MetricsRecord>, CoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| CoreError::Internal(format!("잠금 획득 실패: {e}")))?;

        let mut stmt = conn
            .prepare(
                "SELECT data FROM metrics_history WHERE provider = ?1 ORDER BY id DESC LIMIT ?2",
            )
            .map_err(|e| CoreError::Internal(format!("쿼리 준비 실패: {e}")))?;

        let records = stmt
            .query_map(rusqlite::params![provider, limit as i64], |row| {
                row.get::<_, String>(0)
            })
            .map_err(|e| CoreError::Internal(format!("쿼리 실행 실패: {e}")))?
            .filter_map(|r| r.ok())
            .filter_map(|data| decode(&data))
            .collect();

        Ok(records)
    }

    /// 저장된 레코드 수
    pub fn count_metrics(&self) -> Result<usize, CoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| CoreError::Internal(format!("잠금 획득 실패: {e}")))?;

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM metrics_history", [], |row| row.get(0))
            .map_err(|e| CoreError::Internal(format!("메트릭 수 조회 실패: {e}")))?;
        Ok(count as usize)
    }
}

fn decode(data: &str) -> Option<MetricsRecord> {
    match serde_json::from_str::<MetricsRecord>(data) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!("손상된 메트릭 레코드 건너뜀: {e}");
            None
        }
    }
}

#[async_trait]
impl MetricsHistory for SqliteStorage {
    async fn save_metrics(&self, record: &MetricsRecord) -> Result<(), CoreError> {
        let data = serde_json::to_string(record)?;
        {
            let conn = self
                .conn
                .lock()
                .map_err(|e| CoreError::Internal(format!("잠금 획득 실패: {e}")))?;

            conn.execute(
                "INSERT OR IGNORE INTO metrics_history
                 (record_id, provider, timestamp, estimated_tokens, latency_ms, duration_ms, tokens_per_second, data)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    record.record_id.to_string(),
                    record.provider,
                    record.timestamp.to_rfc3339(),
                    record.estimated_token_count as i64,
                    record.latency_ms.map(|v| v as i64),
                    record.duration_ms as i64,
                    record.tokens_per_second,
                    data,
                ],
            )
            .map_err(|e| CoreError::Internal(format!("메트릭 저장 실패: {e}")))?;
        }

        debug!("메트릭 저장: {} ({})", record.record_id, record.provider);
        self.enforce_history_limit().await?;
        Ok(())
    }

    async fn recent_metrics(&self, limit: usize) -> Result<Vec<MetricsRecord>, CoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| CoreError::Internal(format!("잠금 획득 실패: {e}")))?;

        let mut stmt = conn
            .prepare("SELECT data FROM metrics_history ORDER BY id DESC LIMIT ?1")
            .map_err(|e| CoreError::Internal(format!("쿼리 준비 실패: {e}")))?;

        let records = stmt
            .query_map(rusqlite::params![limit as i64], |row| row.get::<_, String>(0))
            .map_err(|e| CoreError::Internal(format!("쿼리 실행 실패: {e}")))?
            .filter_map(|r| r.ok())
            .filter_map(|data| decode(&data))
            .collect();

        Ok(records)
    }

    async fn last_metrics(&self) -> Result<Option<MetricsRecord>, CoreError> {
        Ok(self.recent_metrics(1).await?.into_iter().next())
    }

    async fn enforce_history_limit(&self) -> Result<usize, CoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| CoreError::Internal(format!("잠금 획득 실패: {e}")))?;

        let deleted = conn
            .execute(
                "DELETE FROM metrics_history WHERE id NOT IN (
                    SELECT id FROM metrics_history ORDER BY id DESC LIMIT ?1
                )",
                rusqlite::params![self.history_limit as i64],
            )
            .map_err(|e| CoreError::Internal(format!("이력 정리 실패: {e}")))?;

        if deleted > 0 {
            debug!("메트릭 이력 정리: {deleted}개 삭제 (상한 {})", self.history_limit);
        }
        Ok(deleted)
    }
}
