//! 스트림 모니터 구동 태스크.
//!
//! 변경 알림, 명령(입력 이벤트, 설정, 진단), 다음 타이머 마감, 종료 신호를
//! 하나의 `tokio::select!` 루프에서 처리한다. 세션은 이 태스크만 소유하므로 잠금이 없다.

use ecoprompt_core::error::CoreError;
use ecoprompt_core::models::dom::{InputEvent, MutationBatch};
use ecoprompt_core::models::metrics::MetricsRecord;
use ecoprompt_core::models::settings::{DebugSnapshot, SettingsUpdate};
use ecoprompt_core::ports::clock::Clock;
use ecoprompt_core::ports::document::{ChangeFeed, DocumentView};
use ecoprompt_core::ports::sink::MetricsSink;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::clock::TokioClock;
use crate::session::{MonitorSession, SelectorProbe};

/// 명령 채널 용량
const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// 대기할 타이머가 없을 때의 sleep 자리표시 (분기 비활성화 상태에서만 쓰임)
const IDLE_WAKE: Duration = Duration::from_secs(3_600);

/// 모니터 태스크로 보내는 명령
#[derive(Debug)]
pub enum MonitorCommand {
    Input(InputEvent),
    UpdateSettings(SettingsUpdate),
    Snapshot(oneshot::Sender<DebugSnapshot>),
    Probe(oneshot::Sender<Vec<SelectorProbe>>),
}

/// 외부 협력자용 핸들 (설정 변경, 진단 조회, 입력 이벤트 전달)
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    tx: mpsc::Sender<MonitorCommand>,
}

impl MonitorHandle {
    /// 입력 이벤트 전달
    pub async fn send_input(&self, event: InputEvent) -> Result<(), CoreError> {
        self.send(MonitorCommand::Input(event)).await
    }

    /// 설정 업데이트 전달
    pub async fn update_settings(&self, update: SettingsUpdate) -> Result<(), CoreError> {
        self.send(MonitorCommand::UpdateSettings(update)).await
    }

    /// 추적 노드 수, 현재 전송 기록 등 진단 정보 조회
    pub async fn debug_snapshot(&self) -> Result<DebugSnapshot, CoreError> {
        let (tx, rx) = oneshot::channel();
        self.send(MonitorCommand::Snapshot(tx)).await?;
        rx.await.map_err(|_| monitor_stopped())
    }

    /// 셀렉터별 일치 요소 진단
    pub async fn probe_selectors(&self) -> Result<Vec<SelectorProbe>, CoreError> {
        let (tx, rx) = oneshot::channel();
        self.send(MonitorCommand::Probe(tx)).await?;
        rx.await.map_err(|_| monitor_stopped())
    }

    async fn send(&self, command: MonitorCommand) -> Result<(), CoreError> {
        self.tx.send(command).await.map_err(|_| monitor_stopped())
    }
}

fn monitor_stopped() -> CoreError {
    CoreError::Internal("스트림 모니터가 종료되었습니다".to_string())
}

/// 세션 구동 태스크
pub struct StreamMonitor {
    session: MonitorSession,
    document: Arc<dyn DocumentView>,
    changes: broadcast::Receiver<MutationBatch>,
    commands: mpsc::Receiver<MonitorCommand>,
    sink: Arc<dyn MetricsSink>,
    clock: TokioClock,
}

impl StreamMonitor {
    /// 변경 알림을 구독하고 명령 핸들과 함께 반환
    pub fn new(
        session: MonitorSession,
        document: Arc<dyn DocumentView>,
        feed: &dyn ChangeFeed,
        sink: Arc<dyn MetricsSink>,
    ) -> Result<(Self, MonitorHandle), CoreError> {
        Self::with_clock(session, document, feed, sink, TokioClock::new())
    }

    pub fn with_clock(
        session: MonitorSession,
        document: Arc<dyn DocumentView>,
        feed: &dyn ChangeFeed,
        sink: Arc<dyn MetricsSink>,
        clock: TokioClock,
    ) -> Result<(Self, MonitorHandle), CoreError> {
        let changes = feed.subscribe()?;
        let (tx, commands) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let monitor = Self {
            session,
            document,
            changes,
            commands,
            sink,
            clock,
        };
        Ok((monitor, MonitorHandle { tx }))
    }

    /// 종료 신호 또는 변경 알림 채널이 닫힐 때까지 실행, 세션을 돌려준다
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> MonitorSession {
        info!("스트림 모니터 시작: provider={}", self.session.provider());
        let mut commands_open = true;

        loop {
            let deadline = self.session.next_deadline();
            let wake_at = match deadline {
                Some(at) => self.clock.instant_for(at),
                None => tokio::time::Instant::now() + IDLE_WAKE,
            };

            tokio::select! {
                _ = shutdown.changed() => {
                    info!("스트림 모니터 종료");
                    break;
                }
                result = self.changes.recv() => match result {
                    Ok(batch) => {
                        debug!("변경 배치 수신: {}건", batch.len());
                        self.session.on_mutations(self.document.as_ref(), self.clock.now());
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("변경 알림 {}건 유실, 후보 요소 재조회", skipped);
                        self.session.on_mutations(self.document.as_ref(), self.clock.now());
                    }
                    Err(RecvError::Closed) => {
                        info!("변경 알림 채널 닫힘 — 스트림 모니터 종료");
                        break;
                    }
                },
                command = self.commands.recv(), if commands_open => match command {
                    Some(command) => self.handle_command(command),
                    None => {
                        debug!("모든 모니터 핸들이 닫힘");
                        commands_open = false;
                    }
                },
                _ = tokio::time::sleep_until(wake_at), if deadline.is_some() => {
                    let records = self.session.fire_due(self.document.as_ref(), self.clock.now());
                    for record in records {
                        self.deliver(&record);
                    }
                }
            }
        }

        self.session
    }

    fn handle_command(&mut self, command: MonitorCommand) {
        match command {
            MonitorCommand::Input(event) => {
                self.session
                    .on_input_event(self.document.as_ref(), &event, self.clock.now());
            }
            MonitorCommand::UpdateSettings(update) => self.session.apply_settings(&update),
            MonitorCommand::Snapshot(reply) => {
                let _ = reply.send(self.session.debug_snapshot());
            }
            MonitorCommand::Probe(reply) => {
                let _ = reply.send(self.session.probe_selectors(self.document.as_ref()));
            }
        }
    }

    /// 싱크 전달 실패 시 로컬 출력으로 대체 (재시도 없음)
    fn deliver(&self, record: &MetricsRecord) {
        if let Err(e) = self.sink.deliver(record) {
            let json = serde_json::to_string(record).unwrap_or_else(|_| record.to_string());
            warn!("메트릭 전달 실패 ({}), 로컬 출력: {}", e, json);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::virtual_dom::VirtualDocument;
    use ecoprompt_core::config::{MonitorConfig, ProviderConfig};
    use ecoprompt_core::models::dom::KeyEvent;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct CollectingSink {
        records: Mutex<Vec<MetricsRecord>>,
    }

    impl MetricsSink for CollectingSink {
        fn deliver(&self, record: &MetricsRecord) -> Result<(), CoreError> {
            self.records.lock().push(record.clone());
            Ok(())
        }
    }

    struct ClosedSink;

    impl MetricsSink for ClosedSink {
        fn deliver(&self, _record: &MetricsRecord) -> Result<(), CoreError> {
            Err(CoreError::Transport("싱크 닫힘".to_string()))
        }
    }

    fn spawn_monitor(
        doc: &Arc<VirtualDocument>,
        sink: Arc<dyn MetricsSink>,
    ) -> (
        MonitorHandle,
        watch::Sender<bool>,
        tokio::task::JoinHandle<MonitorSession>,
    ) {
        let session =
            MonitorSession::new(MonitorConfig::default(), &ProviderConfig::default(), "openai");
        let document: Arc<dyn DocumentView> = doc.clone();
        let (monitor, handle) =
            StreamMonitor::new(session, document, doc.as_ref(), sink).unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(monitor.run(shutdown_rx));
        (handle, shutdown_tx, task)
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn streams_and_finalizes_after_quiet_period() {
        let doc = Arc::new(VirtualDocument::new());
        let sink = Arc::new(CollectingSink::default());
        let (handle, shutdown, task) = spawn_monitor(&doc, sink.clone());
        settle().await;

        let input = doc.create_element(doc.root(), "textarea", &[]).unwrap();
        doc.set_value(input, "hello").unwrap();
        handle
            .send_input(InputEvent::Key(KeyEvent {
                key: "Enter".to_string(),
                shift: false,
                target: Some(input),
            }))
            .await
            .unwrap();
        settle().await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        let node = doc
            .create_element(doc.root(), "div", &[("data-testid", "message")])
            .unwrap();
        for _ in 0..4 {
            doc.append_text(node, "0123456789").unwrap();
            settle().await;
            tokio::time::sleep(Duration::from_millis(200)).await;
        }

        let snapshot = handle.debug_snapshot().await.unwrap();
        assert_eq!(snapshot.tracked_nodes, 1);
        assert_eq!(snapshot.active_send.map(|s| s.text), Some("hello".to_string()));
        assert!(sink.records.lock().is_empty());

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        settle().await;

        let records = sink.records.lock().clone();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].estimated_token_count, 10);
        // tokio 타이머는 ms 단위로 올림되므로 1ms 오차 허용
        let latency = records[0].latency_ms.unwrap();
        assert!((49..=51).contains(&latency), "latency={latency}");
        assert!((1_599..=1_601).contains(&records[0].duration_ms));

        shutdown.send(true).unwrap();
        let session = task.await.unwrap();
        assert_eq!(session.debug_snapshot().retired_nodes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn settings_update_reaches_session() {
        let doc = Arc::new(VirtualDocument::new());
        let (handle, shutdown, task) = spawn_monitor(&doc, Arc::new(CollectingSink::default()));

        handle
            .update_settings(SettingsUpdate::token_ratio(2.5))
            .await
            .unwrap();
        handle.update_settings(SettingsUpdate::debug(true)).await.unwrap();
        let probes = handle.probe_selectors().await.unwrap();
        assert_eq!(probes.len(), 3);

        shutdown.send(true).unwrap();
        let session = task.await.unwrap();
        assert_eq!(session.config().token_ratio, 2.5);
        assert!(session.config().debug_enabled);
        assert!(handle.debug_snapshot().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn sink_failure_does_not_stop_monitor() {
        let doc = Arc::new(VirtualDocument::new());
        let (handle, shutdown, task) = spawn_monitor(&doc, Arc::new(ClosedSink));
        settle().await;

        let first = doc
            .create_element(doc.root(), "div", &[("data-testid", "message")])
            .unwrap();
        doc.set_text(first, "first reply").unwrap();
        settle().await;
        tokio::time::sleep(Duration::from_millis(1_100)).await;
        settle().await;

        let second = doc
            .create_element(doc.root(), "div", &[("data-testid", "message")])
            .unwrap();
        doc.set_text(second, "second reply").unwrap();
        settle().await;

        let snapshot = handle.debug_snapshot().await.unwrap();
        assert_eq!(snapshot.retired_nodes, 1);
        assert_eq!(snapshot.tracked_nodes, 1);

        shutdown.send(true).unwrap();
        task.await.unwrap();
    }
}
