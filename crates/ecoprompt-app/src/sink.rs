//! 메트릭 싱크 어댑터.
//!
//! 모니터 태스크는 `ChannelSink`로 레코드를 넘기고, 별도 태스크가 이력 저장소에 기록한다.
//! 채널이 가득 차거나 닫히면 `Transport` 에러를 돌려주고, 모니터가 로컬 출력으로 대체한다.

use ecoprompt_core::error::CoreError;
use ecoprompt_core::models::metrics::MetricsRecord;
use ecoprompt_core::ports::sink::MetricsSink;
use ecoprompt_core::ports::storage::MetricsHistory;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// 싱크 → 저장 태스크 채널 용량
pub const SINK_CHANNEL_CAPACITY: usize = 64;

/// mpsc 채널 기반 싱크 (블로킹 없음)
pub struct ChannelSink {
    tx: mpsc::Sender<MetricsRecord>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<MetricsRecord>) -> Self {
        Self { tx }
    }
}

impl MetricsSink for ChannelSink {
    fn deliver(&self, record: &MetricsRecord) -> Result<(), CoreError> {
        self.tx.try_send(record.clone()).map_err(|e| match e {
            TrySendError::Full(_) => CoreError::Transport("메트릭 채널 포화".to_string()),
            TrySendError::Closed(_) => CoreError::Transport("메트릭 채널 닫힘".to_string()),
        })
    }
}

/// 이력 저장 태스크 시작
///
/// 모든 송신자가 닫히면 종료하며, 수신한 레코드를 순서대로 돌려준다.
/// 저장 실패는 경고만 남기고 계속한다.
pub fn spawn_history_writer(
    history: Arc<dyn MetricsHistory>,
    mut rx: mpsc::Receiver<MetricsRecord>,
) -> JoinHandle<Vec<MetricsRecord>> {
    tokio::spawn(async move {
        let mut received = Vec::new();
        while let Some(record) = rx.recv().await {
            match history.save_metrics(&record).await {
                Ok(()) => debug!("메트릭 이력 저장: {}", record.record_id),
                Err(e) => warn!("메트릭 이력 저장 실패 ({}): {}", e, record),
            }
            received.push(record);
        }
        received
    })
}
