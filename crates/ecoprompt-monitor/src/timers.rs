//! 취소 가능한 예약 작업 큐.
//!
//! 노드별 조용한 기간 타이머와 전송 텍스트 지연 읽기를 하나의 마감 순서 큐로 관리한다.
//! 노드당 살아 있는 조용한 기간 타이머는 최대 하나다 (재설정 시 기존 항목을 먼저 취소).

use chrono::{DateTime, Utc};
use ecoprompt_core::models::dom::ElementId;
use ecoprompt_core::models::send::SendIntent;
use std::collections::{BTreeMap, HashMap};

type TimerKey = (DateTime<Utc>, u64);

/// 예약 작업 종류
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerTask {
    /// 노드의 조용한 기간 만료 → 확정
    Quiet(ElementId),
    /// 전송 텍스트 지연 읽기
    SendRead(SendIntent),
}

/// 마감 순서 타이머 큐
#[derive(Debug, Default)]
pub struct TimerQueue {
    /// (마감, 순번) → 작업. 같은 마감은 등록 순서대로 실행된다.
    entries: BTreeMap<TimerKey, TimerTask>,
    /// 노드 → 현재 조용한 기간 타이머 키
    quiet_index: HashMap<ElementId, TimerKey>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 노드의 조용한 기간 타이머 설정. 기존 타이머가 있었으면 취소하고 true 반환
    pub fn arm_quiet(&mut self, element: ElementId, deadline: DateTime<Utc>) -> bool {
        let replaced = self.cancel_quiet(element);
        let key = self.next_key(deadline);
        self.entries.insert(key, TimerTask::Quiet(element));
        self.quiet_index.insert(element, key);
        replaced
    }

    /// 노드의 조용한 기간 타이머 취소
    pub fn cancel_quiet(&mut self, element: ElementId) -> bool {
        match self.quiet_index.remove(&element) {
            Some(key) => self.entries.remove(&key).is_some(),
            None => false,
        }
    }

    /// 전송 텍스트 지연 읽기 예약 (취소 없음)
    pub fn schedule_send_read(&mut self, intent: SendIntent, deadline: DateTime<Utc>) {
        let key = self.next_key(deadline);
        self.entries.insert(key, TimerTask::SendRead(intent));
    }

    /// 가장 이른 마감 시각
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.entries.keys().next().map(|(deadline, _)| *deadline)
    }

    /// `now` 이전에 마감된 가장 이른 작업을 꺼낸다
    ///
    /// 꺼낸 작업은 큐와 인덱스에서 모두 제거된 상태로 반환된다.
    pub fn pop_due(&mut self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, TimerTask)> {
        let key = *self.entries.keys().next()?;
        if key.0 > now {
            return None;
        }
        let task = self.entries.remove(&key)?;
        if let TimerTask::Quiet(element) = &task {
            if self.quiet_index.get(element) == Some(&key) {
                self.quiet_index.remove(element);
            }
        }
        Some((key.0, task))
    }

    /// 노드에 살아 있는 조용한 기간 타이머가 있는지
    pub fn has_quiet(&self, element: ElementId) -> bool {
        self.quiet_index.contains_key(&element)
    }

    /// 조용한 기간 타이머의 마감 시각
    pub fn quiet_deadline(&self, element: ElementId) -> Option<DateTime<Utc>> {
        self.quiet_index.get(&element).map(|(deadline, _)| *deadline)
    }

    /// 대기 중인 전체 작업 수
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn next_key(&mut self, deadline: DateTime<Utc>) -> TimerKey {
        let seq = self.next_seq;
        self.next_seq += 1;
        (deadline, seq)
    }
}
