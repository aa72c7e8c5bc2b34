//! 노드 추적기.
//!
//! 후보 요소별 관찰 상태를 요소 식별자로 관리한다.
//! 확정된 노드는 맵에서 제거되고 retired 집합에 남아 다시 추적되지 않는다.
//! 문서에서 사라진 요소의 retired 항목은 `prune_retired`로 정리한다.

use chrono::{DateTime, Utc};
use ecoprompt_core::models::dom::ElementId;
use ecoprompt_core::models::send::SendRecord;
use std::collections::{HashMap, HashSet};

/// 관찰 중인 후보 응답 요소
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedNode {
    pub element: ElementId,
    /// 의미 있는 텍스트가 처음 관찰된 시각
    pub first_observed_at: DateTime<Utc>,
    /// 전송 후 첫 관찰까지 (ms), 전송 기록이 없었으면 None
    pub latency_ms: Option<u64>,
    /// 마지막으로 관찰된 trim 텍스트
    pub last_text: String,
    /// `last_text`의 문자 수
    pub last_length: usize,
    pub finalized: bool,
}

/// 추적하지 않은 이유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// 최소 길이 미만
    TooShort,
    /// 사용자 전송 텍스트와 동일 (입력 에코)
    Echo,
    /// 이미 확정된 요소
    Retired,
}

/// `observe` 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// 새 노드 추적 시작
    Created { length: usize },
    /// 텍스트 증가 (타이머 재설정 대상)
    Grew { from: usize, to: usize },
    /// 길이 동일 또는 감소 — 아무 작업도 하지 않음
    Unchanged,
    Skipped(SkipReason),
}

impl Observation {
    /// 조용한 기간 타이머를 (재)설정해야 하는지
    pub fn arms_timer(&self) -> bool {
        matches!(self, Self::Created { .. } | Self::Grew { .. })
    }
}

/// 요소 식별자 → 추적 상태
#[derive(Debug)]
pub struct NodeTracker {
    nodes: HashMap<ElementId, TrackedNode>,
    retired: HashSet<ElementId>,
    min_text_len: usize,
}

impl NodeTracker {
    pub fn new(min_text_len: usize) -> Self {
        Self {
            nodes: HashMap::new(),
            retired: HashSet::new(),
            min_text_len,
        }
    }

    /// 후보 요소 하나의 현재 텍스트 관찰
    ///
    /// `text`는 요소의 전체 텍스트이며 내부에서 trim한다.
    pub fn observe(
        &mut self,
        element: ElementId,
        text: &str,
        active_send: Option<&SendRecord>,
        now: DateTime<Utc>,
    ) -> Observation {
        let trimmed = text.trim();
        let length = trimmed.chars().count();

        if let Some(node) = self.nodes.get_mut(&element) {
            if node.finalized || length <= node.last_length {
                return Observation::Unchanged;
            }
            let from = node.last_length;
            node.last_text = trimmed.to_string();
            node.last_length = length;
            return Observation::Grew { from, to: length };
        }

        if self.retired.contains(&element) {
            return Observation::Skipped(SkipReason::Retired);
        }
        if length < self.min_text_len {
            return Observation::Skipped(SkipReason::TooShort);
        }
        if active_send.is_some_and(|send| send.text == trimmed) {
            return Observation::Skipped(SkipReason::Echo);
        }

        let latency_ms = active_send.map(|send| {
            (now - send.sent_at).num_milliseconds().max(0) as u64
        });
        self.nodes.insert(
            element,
            TrackedNode {
                element,
                first_observed_at: now,
                latency_ms,
                last_text: trimmed.to_string(),
                last_length: length,
                finalized: false,
            },
        );
        Observation::Created { length }
    }

    /// 노드 확정 — 맵에서 제거하고 retired로 옮긴다
    ///
    /// 이미 확정되었거나 추적하지 않는 요소면 None (멱등).
    pub fn finalize(&mut self, element: ElementId) -> Option<TrackedNode> {
        let mut node = self.nodes.remove(&element)?;
        if node.finalized {
            return None;
        }
        node.finalized = true;
        self.retired.insert(element);
        Some(node)
    }

    pub fn get(&self, element: ElementId) -> Option<&TrackedNode> {
        self.nodes.get(&element)
    }

    pub fn is_tracked(&self, element: ElementId) -> bool {
        self.nodes.contains_key(&element)
    }

    pub fn is_retired(&self, element: ElementId) -> bool {
        self.retired.contains(&element)
    }

    /// 추적 중인 노드 수
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn retired_len(&self) -> usize {
        self.retired.len()
    }

    /// 문서에 더 이상 없는 요소를 retired 집합에서 제거, 제거한 수 반환
    pub fn prune_retired(&mut self, alive: &HashSet<ElementId>) -> usize {
        let before = self.retired.len();
        self.retired.retain(|element| alive.contains(element));
        before - self.retired.len()
    }

    pub fn set_min_text_len(&mut self, min_text_len: usize) {
        self.min_text_len = min_text_len;
    }
}
