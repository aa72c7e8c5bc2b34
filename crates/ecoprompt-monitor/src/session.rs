//! 모니터 세션.
//!
//! 현재 전송 기록, 노드 추적 맵, 타이머 큐, 설정을 하나의 소유 객체로 묶는다.
//! 모든 상태 전이는 `&mut self`에서 일어나므로 성장 처리와 타이머 만료가 겹치지 않는다.
//!
//! 시각은 호출자가 넘긴다. 실시간 구동은 `StreamMonitor`, 재생은 `advance_to`로 가상 시간을 진행한다.

use chrono::{DateTime, Utc};
use ecoprompt_core::config::{MonitorConfig, ProviderConfig};
use ecoprompt_core::models::dom::{ElementId, InputEvent};
use ecoprompt_core::models::metrics::MetricsRecord;
use ecoprompt_core::models::send::{SendIntent, SendRecord};
use ecoprompt_core::models::settings::{DebugSnapshot, SettingsUpdate};
use ecoprompt_core::ports::document::DocumentView;
use ecoprompt_core::ports::send_detector::SendDetector;
use ecoprompt_core::selector::Selector;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, trace, warn};

use crate::emitter::{snippet, MetricsEmitter};
use crate::send_detector::HeuristicSendDetector;
use crate::timers::{TimerQueue, TimerTask};
use crate::tracker::{NodeTracker, Observation, SkipReason, TrackedNode};

/// 셀렉터 진단 미리보기 길이 (문자)
const PROBE_PREVIEW_CHARS: usize = 80;

/// 디버그 설정이 켜져 있으면 info, 아니면 debug 레벨
macro_rules! diag {
    ($session:expr, $($arg:tt)+) => {
        if $session.config.debug_enabled {
            tracing::info!($($arg)+)
        } else {
            tracing::debug!($($arg)+)
        }
    };
}

/// `now + delay`, 표현 범위를 넘으면 최대 시각
fn deadline_after(now: DateTime<Utc>, delay: chrono::Duration) -> DateTime<Utc> {
    now.checked_add_signed(delay).unwrap_or_else(|| {
        warn!("마감 시각 오버플로: {} + {}, 최대 시각으로 고정", now, delay);
        DateTime::<Utc>::MAX_UTC
    })
}

/// 셀렉터 하나의 진단 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectorProbe {
    pub selector: String,
    pub match_count: usize,
    pub previews: Vec<NodePreview>,
    /// 파싱/평가 실패 사유
    pub error: Option<String>,
}

/// 일치 요소 미리보기
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodePreview {
    pub element: ElementId,
    pub text_length: usize,
    pub preview: String,
}

/// 스트림 완료 감지 세션
pub struct MonitorSession {
    config: MonitorConfig,
    selectors: Vec<Selector>,
    /// 파싱에 실패한 셀렉터 (원본, 사유)
    rejected_selectors: Vec<(String, String)>,
    detector: Box<dyn SendDetector>,
    emitter: MetricsEmitter,
    tracker: NodeTracker,
    timers: TimerQueue,
    current_send: Option<SendRecord>,
}

impl MonitorSession {
    /// 제공자 셀렉터를 컴파일하고 기본 전송 감지기로 세션 생성
    ///
    /// 파싱에 실패한 셀렉터는 경고 후 건너뛰며, 나머지 셀렉터로 관찰을 계속한다.
    pub fn new(config: MonitorConfig, providers: &ProviderConfig, provider: &str) -> Self {
        let mut selectors = Vec::new();
        let mut rejected_selectors = Vec::new();
        for source in providers.selectors_for(provider) {
            match Selector::parse(source) {
                Ok(selector) => selectors.push(selector),
                Err(e) => {
                    warn!("셀렉터 무시: {}", e);
                    rejected_selectors.push((source.clone(), e.to_string()));
                }
            }
        }

        info!(
            "모니터 세션 시작: provider={}, 셀렉터 {}개 (거부 {}개)",
            provider,
            selectors.len(),
            rejected_selectors.len()
        );

        Self {
            tracker: NodeTracker::new(config.min_text_len),
            config,
            selectors,
            rejected_selectors,
            detector: Box::new(HeuristicSendDetector::new()),
            emitter: MetricsEmitter::new(provider),
            timers: TimerQueue::new(),
            current_send: None,
        }
    }

    /// 전송 감지 전략 교체
    pub fn with_detector(mut self, detector: Box<dyn SendDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn provider(&self) -> &str {
        self.emitter.provider()
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn current_send(&self) -> Option<&SendRecord> {
        self.current_send.as_ref()
    }

    pub fn tracked(&self, element: ElementId) -> Option<&TrackedNode> {
        self.tracker.get(element)
    }

    /// 노드의 조용한 기간 만료 예정 시각
    pub fn quiet_deadline(&self, element: ElementId) -> Option<DateTime<Utc>> {
        self.timers.quiet_deadline(element)
    }

    /// 입력 이벤트 처리. 전송으로 판단되면 지연 읽기를 예약하고 true 반환
    pub fn on_input_event(
        &mut self,
        doc: &dyn DocumentView,
        event: &InputEvent,
        now: DateTime<Utc>,
    ) -> bool {
        let intent = match event {
            InputEvent::Key(key) => self.detector.on_key_event(doc, key),
            InputEvent::Click(click) => self.detector.on_click_event(doc, click),
        };
        let Some(intent) = intent else {
            return false;
        };

        diag!(self, "전송 감지: {} (지연 읽기 예약)", intent.source);
        let deadline = deadline_after(now, self.config.send_read_delay());
        self.timers.schedule_send_read(intent, deadline);
        true
    }

    /// 전송 기록 교체 (이전 기록은 버려진다)
    pub fn record_send(&mut self, text: impl Into<String>, sent_at: DateTime<Utc>) {
        let text = text.into();
        diag!(self, "사용자 전송 기록: {}", snippet(&text, 50));
        self.current_send = Some(SendRecord { text, sent_at });
    }

    /// 변경 배치 하나 처리 — 후보 요소를 다시 조회해 추적기에 반영
    pub fn on_mutations(&mut self, doc: &dyn DocumentView, now: DateTime<Utc>) {
        for element in self.collect_candidates(doc) {
            let text = doc.text_content(element).unwrap_or_default();
            let observation = self
                .tracker
                .observe(element, &text, self.current_send.as_ref(), now);

            match observation {
                Observation::Created { length } => {
                    let latency = self.tracker.get(element).and_then(|n| n.latency_ms);
                    diag!(
                        self,
                        "새 응답 노드 관찰: {}, latency={:?}ms, 길이={}",
                        element,
                        latency,
                        length
                    );
                }
                Observation::Grew { from, to } => {
                    diag!(self, "응답 텍스트 증가: {} {} → {}", element, from, to);
                }
                Observation::Skipped(SkipReason::Echo) => {
                    diag!(self, "사용자 입력 에코 노드 건너뜀: {}", element);
                }
                Observation::Skipped(_) | Observation::Unchanged => {}
            }

            if observation.arms_timer() {
                let deadline = deadline_after(now, self.config.quiet_period());
                self.timers.arm_quiet(element, deadline);
            }
        }

        if self.tracker.retired_len() > 0 {
            let alive: HashSet<ElementId> = doc.elements().into_iter().collect();
            let pruned = self.tracker.prune_retired(&alive);
            if pruned > 0 {
                trace!("문서에서 사라진 확정 노드 {}개 정리", pruned);
            }
        }
    }

    /// `now`까지 마감된 예약 작업 실행, 확정된 메트릭 반환
    pub fn fire_due(&mut self, doc: &dyn DocumentView, now: DateTime<Utc>) -> Vec<MetricsRecord> {
        let mut records = Vec::new();
        while let Some((deadline, task)) = self.timers.pop_due(now) {
            trace!("타이머 만료: {:?} (마감 {})", task, deadline);
            match task {
                TimerTask::Quiet(element) => {
                    if let Some(record) = self.finalize(element, now) {
                        records.push(record);
                    }
                }
                TimerTask::SendRead(intent) => self.complete_send(doc, intent, now),
            }
        }
        records
    }

    /// 가상 시간 진행 — 마감 시각마다 정확히 그 시각으로 작업을 실행한다
    pub fn advance_to(&mut self, doc: &dyn DocumentView, now: DateTime<Utc>) -> Vec<MetricsRecord> {
        let mut records = Vec::new();
        while let Some(deadline) = self.timers.next_deadline() {
            if deadline > now {
                break;
            }
            records.extend(self.fire_due(doc, deadline));
        }
        records
    }

    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.timers.next_deadline()
    }

    /// 노드 확정 및 메트릭 생성 (노드당 최대 한 번)
    pub fn finalize(&mut self, element: ElementId, now: DateTime<Utc>) -> Option<MetricsRecord> {
        let node = self.tracker.finalize(element)?;
        self.timers.cancel_quiet(element);

        let record = self
            .emitter
            .emit(&node, self.current_send.as_ref(), &self.config, now);
        info!("메트릭 확정: {}", record);
        Some(record)
    }

    /// 설정 채널 업데이트. 토큰 비율은 이후 확정되는 모든 노드에 적용된다
    pub fn apply_settings(&mut self, update: &SettingsUpdate) {
        self.config.apply(update);
        info!(
            "모니터 설정 변경: token_ratio={}, debug={}",
            self.config.token_ratio, self.config.debug_enabled
        );
    }

    /// 수동 진단용 상태 요약
    pub fn debug_snapshot(&self) -> DebugSnapshot {
        DebugSnapshot {
            tracked_nodes: self.tracker.len(),
            retired_nodes: self.tracker.retired_len(),
            pending_timers: self.timers.len(),
            active_send: self.current_send.clone(),
        }
    }

    /// 셀렉터별 일치 요소 수와 텍스트 미리보기
    pub fn probe_selectors(&self, doc: &dyn DocumentView) -> Vec<SelectorProbe> {
        let mut probes: Vec<SelectorProbe> = self
            .selectors
            .iter()
            .map(|selector| match doc.query_all(selector) {
                Ok(found) => SelectorProbe {
                    selector: selector.source().to_string(),
                    match_count: found.len(),
                    previews: found
                        .into_iter()
                        .map(|element| {
                            let text = doc.text_content(element).unwrap_or_default();
                            let trimmed = text.trim();
                            NodePreview {
                                element,
                                text_length: trimmed.chars().count(),
                                preview: snippet(trimmed, PROBE_PREVIEW_CHARS),
                            }
                        })
                        .collect(),
                    error: None,
                },
                Err(e) => SelectorProbe {
                    selector: selector.source().to_string(),
                    match_count: 0,
                    previews: Vec::new(),
                    error: Some(e.to_string()),
                },
            })
            .collect();

        probes.extend(
            self.rejected_selectors
                .iter()
                .map(|(source, reason)| SelectorProbe {
                    selector: source.clone(),
                    match_count: 0,
                    previews: Vec::new(),
                    error: Some(reason.clone()),
                }),
        );
        probes
    }

    fn complete_send(&mut self, doc: &dyn DocumentView, intent: SendIntent, now: DateTime<Utc>) {
        let text = self
            .detector
            .extract_text(doc, intent.source)
            .unwrap_or(intent.text_at_trigger);
        self.record_send(text, now);
    }

    /// 모든 셀렉터의 일치 요소를 요소 단위로 중복 제거해 문서 순서로 수집
    ///
    /// 셀렉터 평가 실패는 해당 셀렉터에만 국한된다.
    fn collect_candidates(&self, doc: &dyn DocumentView) -> Vec<ElementId> {
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        for selector in &self.selectors {
            match doc.query_all(selector) {
                Ok(found) => {
                    for element in found {
                        if seen.insert(element) {
                            candidates.push(element);
                        }
                    }
                }
                Err(e) => warn!("셀렉터 평가 실패, 다음 셀렉터로 계속: {}", e),
            }
        }
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::virtual_dom::VirtualDocument;
    use chrono::TimeZone;
    use ecoprompt_core::error::CoreError;
    use ecoprompt_core::models::dom::{ClickEvent, KeyEvent};
    use ecoprompt_core::ports::document::ElementTree;
    use std::collections::BTreeMap;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000 + ms).unwrap()
    }

    fn session(provider: &str) -> MonitorSession {
        MonitorSession::new(MonitorConfig::default(), &ProviderConfig::default(), provider)
    }

    fn message(doc: &VirtualDocument) -> ElementId {
        doc.create_element(doc.root(), "div", &[("data-testid", "message")])
            .unwrap()
    }

    #[test]
    fn end_to_end_latency_duration_rate() {
        let doc = VirtualDocument::new();
        let mut session = session("openai");
        session.record_send("hello", at(0));

        let node = message(&doc);
        doc.set_text(node, "0123456789").unwrap();
        session.on_mutations(&doc, at(120));
        assert_eq!(session.tracked(node).unwrap().latency_ms, Some(120));
        assert_eq!(session.quiet_deadline(node), Some(at(1_120)));

        doc.append_text(node, &"x".repeat(30)).unwrap();
        session.on_mutations(&doc, at(300));
        assert_eq!(session.quiet_deadline(node), Some(at(1_300)));

        assert!(session.advance_to(&doc, at(1_299)).is_empty());
        let records = session.advance_to(&doc, at(5_000));
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.latency_ms, Some(120));
        assert_eq!(record.duration_ms, 1_180);
        assert_eq!(record.estimated_token_count, 10);
        let tps = record.tokens_per_second.unwrap();
        assert!((tps - 8.47).abs() < 0.01);
        assert_eq!(record.timestamp, at(1_300));
        assert_eq!(record.send_snippet.as_deref(), Some("hello"));
        assert!(session.tracked(node).is_none());
    }

    #[test]
    fn deadline_near_end_of_time_is_clamped() {
        let doc = VirtualDocument::new();
        let mut session = session("openai");
        let late = DateTime::<Utc>::MAX_UTC - chrono::Duration::milliseconds(10);

        let node = message(&doc);
        doc.set_text(node, "reply at the edge").unwrap();
        session.on_mutations(&doc, late);
        assert_eq!(session.quiet_deadline(node), Some(DateTime::<Utc>::MAX_UTC));

        let records = session.advance_to(&doc, DateTime::<Utc>::MAX_UTC);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].duration_ms, 10);
    }

    #[test]
    fn removed_retired_nodes_are_forgotten() {
        let doc = VirtualDocument::new();
        let mut session = session("openai");

        let kept = message(&doc);
        doc.set_text(kept, "first answer").unwrap();
        let removed = message(&doc);
        doc.set_text(removed, "second answer").unwrap();
        session.on_mutations(&doc, at(0));
        assert_eq!(session.advance_to(&doc, at(1_000)).len(), 2);
        assert_eq!(session.tracker.retired_len(), 2);

        doc.remove(removed).unwrap();
        session.on_mutations(&doc, at(1_100));
        assert_eq!(session.tracker.retired_len(), 1);
        assert!(session.tracker.is_retired(kept));
        assert!(!session.tracker.is_retired(removed));
    }

    #[test]
    fn static_node_finalizes_after_quiet_period() {
        let doc = VirtualDocument::new();
        let mut session = session("openai");

        let node = message(&doc);
        doc.set_text(node, "one-shot reply").unwrap();
        session.on_mutations(&doc, at(0));

        let records = session.advance_to(&doc, at(1_000));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].output_snippet, "one-shot reply");
        assert_eq!(records[0].duration_ms, 1_000);
        assert_eq!(records[0].latency_ms, None);
        assert_eq!(records[0].send_snippet, None);
    }

    #[test]
    fn finalization_happens_once() {
        let doc = VirtualDocument::new();
        let mut session = session("openai");
        let node = message(&doc);
        doc.set_text(node, "first answer").unwrap();
        session.on_mutations(&doc, at(0));

        assert_eq!(session.advance_to(&doc, at(1_000)).len(), 1);
        assert!(session.finalize(node, at(1_001)).is_none());

        // 확정 후 늦게 도착한 성장은 새 타이머를 만들지 않는다
        doc.append_text(node, " and more").unwrap();
        session.on_mutations(&doc, at(1_100));
        assert!(session.next_deadline().is_none());
        assert!(session.advance_to(&doc, at(10_000)).is_empty());

        let snapshot = session.debug_snapshot();
        assert_eq!(snapshot.tracked_nodes, 0);
        assert_eq!(snapshot.retired_nodes, 1);
    }

    #[test]
    fn shrink_or_equal_length_never_rearms() {
        let doc = VirtualDocument::new();
        let mut session = session("openai");
        let node = message(&doc);
        doc.set_text(node, "0123456789").unwrap();
        session.on_mutations(&doc, at(0));

        doc.set_text(node, "01234").unwrap();
        session.on_mutations(&doc, at(400));
        doc.set_text(node, "abcdefghij").unwrap();
        session.on_mutations(&doc, at(800));
        assert_eq!(session.quiet_deadline(node), Some(at(1_000)));

        let records = session.advance_to(&doc, at(1_000));
        assert_eq!(records[0].output_snippet, "0123456789");
    }

    #[test]
    fn echo_of_user_send_is_not_tracked() {
        let doc = VirtualDocument::new();
        let mut session = session("openai");
        session.record_send("what is rust?", at(0));

        let echo = message(&doc);
        doc.set_text(echo, "  what is rust?  ").unwrap();
        session.on_mutations(&doc, at(10));

        assert!(session.tracked(echo).is_none());
        assert!(session.next_deadline().is_none());
    }

    #[test]
    fn short_text_waits_until_threshold() {
        let doc = VirtualDocument::new();
        let mut session = session("openai");
        let node = message(&doc);
        doc.set_text(node, "Hi").unwrap();
        session.on_mutations(&doc, at(0));
        assert!(session.tracked(node).is_none());

        doc.append_text(node, "!").unwrap();
        session.on_mutations(&doc, at(50));
        assert_eq!(session.tracked(node).unwrap().first_observed_at, at(50));
    }

    #[test]
    fn element_matching_several_selectors_is_tracked_once() {
        let doc = VirtualDocument::new();
        let mut session = session("anthropic");
        let node = doc
            .create_element(
                doc.root(),
                "div",
                &[
                    ("data-testid", "message-container"),
                    ("class", "message-content response"),
                    ("role", "article"),
                ],
            )
            .unwrap();
        doc.set_text(node, "streaming answer").unwrap();
        session.on_mutations(&doc, at(0));

        let snapshot = session.debug_snapshot();
        assert_eq!(snapshot.tracked_nodes, 1);
        assert_eq!(snapshot.pending_timers, 1);
        assert_eq!(session.advance_to(&doc, at(2_000)).len(), 1);
    }

    #[test]
    fn no_growth_no_metrics() {
        let doc = VirtualDocument::new();
        let mut session = session("openai");
        session.record_send("hello", at(0));
        doc.create_element(doc.root(), "p", &[]).unwrap();
        session.on_mutations(&doc, at(10));

        assert!(session.advance_to(&doc, at(60_000)).is_empty());
    }

    #[test]
    fn enter_schedules_deferred_read() {
        let doc = VirtualDocument::new();
        let mut session = session("openai");
        let input = doc.create_element(doc.root(), "textarea", &[]).unwrap();
        doc.set_value(input, "hello").unwrap();

        let event = InputEvent::Key(KeyEvent {
            key: "Enter".to_string(),
            shift: false,
            target: Some(input),
        });
        assert!(session.on_input_event(&doc, &event, at(0)));
        assert!(session.current_send().is_none());
        assert_eq!(session.next_deadline(), Some(at(50)));

        session.advance_to(&doc, at(50));
        let send = session.current_send().unwrap();
        assert_eq!(send.text, "hello");
        assert_eq!(send.sent_at, at(50));
    }

    #[test]
    fn deferred_read_falls_back_to_trigger_text() {
        let doc = VirtualDocument::new();
        let mut session = session("openai");
        let input = doc.create_element(doc.root(), "textarea", &[]).unwrap();
        doc.set_value(input, "hello").unwrap();
        let button = doc
            .create_element(doc.root(), "button", &[("aria-label", "Submit")])
            .unwrap();

        assert!(session.on_input_event(
            &doc,
            &InputEvent::Click(ClickEvent { target: button }),
            at(0)
        ));
        // 페이지가 전송 처리 중 입력창을 비운다
        doc.set_value(input, "").unwrap();

        session.advance_to(&doc, at(100));
        assert_eq!(session.current_send().unwrap().text, "hello");
    }

    #[test]
    fn newer_send_replaces_previous() {
        let doc = VirtualDocument::new();
        let mut session = session("openai");
        session.record_send("first", at(0));
        session.record_send("second", at(500));

        let node = message(&doc);
        doc.set_text(node, "reply text").unwrap();
        session.on_mutations(&doc, at(700));
        assert_eq!(session.tracked(node).unwrap().latency_ms, Some(200));
    }

    #[test]
    fn token_ratio_is_read_at_finalization() {
        let doc = VirtualDocument::new();
        let mut session = session("openai");
        let node = message(&doc);
        doc.set_text(node, &"y".repeat(40)).unwrap();
        session.on_mutations(&doc, at(0));

        session.apply_settings(&SettingsUpdate::token_ratio(2.0));
        session.apply_settings(&SettingsUpdate::debug(true));
        let records = session.advance_to(&doc, at(1_000));
        assert_eq!(records[0].estimated_token_count, 20);
        assert!(session.config().debug_enabled);
    }

    /// 특정 셀렉터 평가만 실패하는 문서
    struct FailingDocument {
        inner: VirtualDocument,
        failing: String,
    }

    impl ElementTree for FailingDocument {
        fn tag_name(&self, id: ElementId) -> Option<String> {
            self.inner.tag_name(id)
        }

        fn attributes(&self, id: ElementId) -> Vec<(String, String)> {
            self.inner.attributes(id)
        }

        fn parent(&self, id: ElementId) -> Option<ElementId> {
            self.inner.parent(id)
        }
    }

    impl DocumentView for FailingDocument {
        fn elements(&self) -> Vec<ElementId> {
            self.inner.elements()
        }

        fn text_content(&self, id: ElementId) -> Option<String> {
            self.inner.text_content(id)
        }

        fn form_value(&self, id: ElementId) -> Option<String> {
            self.inner.form_value(id)
        }

        fn query_all(&self, selector: &Selector) -> Result<Vec<ElementId>, CoreError> {
            if selector.source() == self.failing {
                return Err(CoreError::selector(selector.source(), "평가 실패"));
            }
            self.inner.query_all(selector)
        }
    }

    #[test]
    fn selector_evaluation_failure_is_isolated() {
        let doc = FailingDocument {
            inner: VirtualDocument::new(),
            failing: r#"div[data-testid="message"]"#.to_string(),
        };
        let mut session = session("openai");
        let node = doc
            .inner
            .create_element(doc.inner.root(), "div", &[("role", "listitem")])
            .unwrap();
        doc.inner.set_text(node, "still observed").unwrap();

        session.on_mutations(&doc, at(0));
        assert!(session.tracked(node).is_some());

        let probes = session.probe_selectors(&doc);
        assert!(probes[0].error.is_some());
        assert_eq!(probes[2].match_count, 1);
    }

    #[test]
    fn malformed_selector_is_skipped() {
        let mut selectors = BTreeMap::new();
        selectors.insert(
            "custom".to_string(),
            vec!["div[role".to_string(), "article".to_string()],
        );
        let providers = ProviderConfig {
            selectors,
            default_provider: "custom".to_string(),
            provider_models: BTreeMap::new(),
        };
        let mut session =
            MonitorSession::new(MonitorConfig::default(), &providers, "chat.example.com");
        assert_eq!(session.provider(), "chat.example.com");

        let doc = VirtualDocument::new();
        let node = doc.create_element(doc.root(), "article", &[]).unwrap();
        doc.set_text(node, "article reply").unwrap();
        session.on_mutations(&doc, at(0));
        assert!(session.tracked(node).is_some());

        let probes = session.probe_selectors(&doc);
        assert_eq!(probes.len(), 2);
        assert_eq!(probes[0].selector, "article");
        assert_eq!(probes[0].previews[0].preview, "article reply");
        assert_eq!(probes[1].selector, "div[role");
        assert!(probes[1].error.is_some());
    }

    #[test]
    fn snapshot_reports_active_send() {
        let mut session = session("openai");
        assert_eq!(session.debug_snapshot().active_send, None);
        session.record_send("hello", at(0));
        assert_eq!(
            session.debug_snapshot().active_send.map(|s| s.text),
            Some("hello".to_string())
        );
    }
}
