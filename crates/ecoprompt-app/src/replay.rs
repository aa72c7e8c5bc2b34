//! 기록 재생.
//!
//! - 가상 시간: `MonitorSession::advance_to`로 이벤트 사이의 타이머를 정확한 마감 시각에 실행한다.
//!   결과는 실행 환경의 속도와 무관하게 결정적이다.
//! - 실시간: `StreamMonitor` 태스크를 띄우고 기록 오프셋에 맞춰 문서를 변경한다.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use ecoprompt_core::config::millis;
use ecoprompt_core::error::CoreError;
use ecoprompt_core::models::metrics::MetricsRecord;
use ecoprompt_core::ports::document::{ChangeFeed, DocumentView};
use ecoprompt_core::ports::sink::MetricsSink;
use ecoprompt_monitor::clock::TokioClock;
use ecoprompt_monitor::{MonitorSession, StreamMonitor, VirtualDocument};
use std::sync::Arc;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::trace::{trace_end_ms, TraceApplier, TraceEvent};

/// 실시간 재생에서 마지막 이벤트 이후 남은 타이머를 기다리는 여유 (ms)
const REALTIME_TAIL_MARGIN_MS: u64 = 100;

fn offset(origin: DateTime<Utc>, at_ms: u64) -> Result<DateTime<Utc>, CoreError> {
    i64::try_from(at_ms)
        .ok()
        .and_then(ChronoDuration::try_milliseconds)
        .and_then(|delta| origin.checked_add_signed(delta))
        .ok_or_else(|| out_of_range(at_ms))
}

fn instant_at(start: Instant, at_ms: u64) -> Result<Instant, CoreError> {
    start
        .checked_add(millis(at_ms))
        .ok_or_else(|| out_of_range(at_ms))
}

fn out_of_range(at_ms: u64) -> CoreError {
    CoreError::Validation {
        field: "at_ms".to_string(),
        message: format!("재생 시각 {}ms가 표현 범위를 벗어났습니다", at_ms),
    }
}

/// 가상 시간 재생. 기록이 끝나면 남은 타이머를 모두 실행해 확정된 메트릭을 돌려준다
pub fn replay_virtual(
    session: &mut MonitorSession,
    events: &[TraceEvent],
    origin: DateTime<Utc>,
) -> Result<Vec<MetricsRecord>, CoreError> {
    let document = VirtualDocument::with_capacity(session.config().change_feed_capacity);
    let mut changes = document.subscribe()?;
    let mut applier = TraceApplier::new(&document);
    let mut records = Vec::new();

    for event in events {
        let now = offset(origin, event.at_ms)?;
        records.extend(session.advance_to(&document, now));

        if let Some(input) = applier.apply(&document, &event.op)? {
            session.on_input_event(&document, &input, now);
        }

        loop {
            match changes.try_recv() {
                Ok(_) => session.on_mutations(&document, now),
                Err(TryRecvError::Lagged(skipped)) => {
                    debug!("변경 알림 {}건 유실, 후보 요소 재조회", skipped);
                    session.on_mutations(&document, now);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }

    while let Some(deadline) = session.next_deadline() {
        records.extend(session.advance_to(&document, deadline));
    }

    info!("가상 시간 재생 완료: 이벤트 {}개, 메트릭 {}개", events.len(), records.len());
    Ok(records)
}

/// Ctrl+C 또는 SIGTERM을 받으면 `true`가 되는 재생 중단 신호
///
/// 핸들러 등록에 실패하면 신호는 켜지지 않고, 수신기가 모두 사라질 때까지 송신기를 유지한다.
pub fn interrupt_on_signal() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        let received = tokio::select! {
            received = next_signal() => received,
            _ = tx.closed() => return,
        };
        match received {
            Some(name) => {
                info!("{} 수신, 재생을 중단합니다", name);
                let _ = tx.send(true);
            }
            None => tx.closed().await,
        }
    });
    rx
}

#[cfg(unix)]
async fn next_signal() -> Option<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            warn!("SIGTERM 핸들러 등록 실패: {}", e);
            return None;
        }
    };
    tokio::select! {
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => Some("SIGINT"),
            Err(e) => {
                warn!("SIGINT 핸들러 등록 실패: {}", e);
                None
            }
        },
        _ = sigterm.recv() => Some("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn next_signal() -> Option<&'static str> {
    match tokio::signal::ctrl_c().await {
        Ok(()) => Some("Ctrl+C"),
        Err(e) => {
            warn!("Ctrl+C 핸들러 등록 실패: {}", e);
            None
        }
    }
}

/// 실시간 재생. 메트릭은 `sink`로 전달되고, 재생이 끝나면 세션을 돌려준다
///
/// `shutdown`이 먼저 켜지면 남은 이벤트를 버리고 중단한다.
pub async fn replay_realtime(
    session: MonitorSession,
    events: &[TraceEvent],
    sink: Arc<dyn MetricsSink>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<MonitorSession, CoreError> {
    let tail_ms = session
        .config()
        .quiet_period_ms
        .saturating_add(session.config().send_read_delay_ms)
        .saturating_add(REALTIME_TAIL_MARGIN_MS);

    let document = Arc::new(VirtualDocument::with_capacity(
        session.config().change_feed_capacity,
    ));
    let view: Arc<dyn DocumentView> = document.clone();
    let clock = TokioClock::new();
    let (monitor, handle) =
        StreamMonitor::with_clock(session, view, &*document, sink, clock)?;

    let (stop_tx, stop_rx) = watch::channel(false);
    let task = tokio::spawn(monitor.run(stop_rx));

    let start = Instant::now();
    let mut applier = TraceApplier::new(&document);
    let mut interrupted = false;

    for event in events {
        let due = instant_at(start, event.at_ms)?;
        tokio::select! {
            _ = tokio::time::sleep_until(due) => {}
            _ = shutdown.changed() => {
                interrupted = true;
                break;
            }
        }
        if let Some(input) = applier.apply(&document, &event.op)? {
            handle.send_input(input).await?;
        }
    }

    if !interrupted {
        let drain_until = instant_at(start, trace_end_ms(events).saturating_add(tail_ms))?;
        tokio::select! {
            _ = tokio::time::sleep_until(drain_until) => {}
            _ = shutdown.changed() => interrupted = true,
        }
    }
    if interrupted {
        info!("재생 중단 — 남은 이벤트를 버립니다");
    }

    let _ = stop_tx.send(true);
    let session = task
        .await
        .map_err(|e| CoreError::Internal(format!("모니터 태스크 실패: {e}")))?;
    Ok(session)
}
