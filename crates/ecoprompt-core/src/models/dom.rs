//! 문서(DOM) 관찰 모델.
//!
//! 요소 식별자, 변경 알림 배치, 입력 이벤트를 호스트 환경과 무관하게 표현한다.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 문서 요소 식별자
///
/// 요소 하나에 정확히 하나의 값이 대응하며, 추적 맵의 키로 사용된다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "el#{}", self.0)
    }
}

/// 변경 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    /// 자식 노드 추가/제거
    ChildList,
    /// 텍스트 내용 변경
    CharacterData,
    /// 속성 변경
    Attributes,
}

/// 단일 변경 기록
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationRecord {
    /// 변경이 발생한 요소
    pub target: ElementId,
    /// 변경 종류
    pub kind: MutationKind,
}

/// 변경 알림 배치
///
/// 배치 내용은 진단용이다. 모니터는 배치를 받을 때마다 후보 요소를 다시 조회한다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationBatch {
    pub records: Vec<MutationRecord>,
}

impl MutationBatch {
    /// 단일 기록 배치 생성
    pub fn single(target: ElementId, kind: MutationKind) -> Self {
        Self {
            records: vec![MutationRecord { target, kind }],
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// 키 입력 이벤트
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// 키 이름 (예: "Enter", "a")
    pub key: String,
    /// Shift 동시 입력 여부 (Shift+Enter는 줄바꿈)
    pub shift: bool,
    /// 포커스된 요소
    pub target: Option<ElementId>,
}

/// 포인터 클릭 이벤트
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    /// 클릭된 요소 (버튼 내부의 아이콘일 수도 있음)
    pub target: ElementId,
}

/// 저수준 입력 이벤트
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyEvent),
    Click(ClickEvent),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_id_display() {
        assert_eq!(ElementId(42).to_string(), "el#42");
    }

    #[test]
    fn mutation_kind_serde() {
        let json = serde_json::to_string(&MutationKind::CharacterData).unwrap();
        assert_eq!(json, "\"character_data\"");
    }

    #[test]
    fn single_batch() {
        let batch = MutationBatch::single(ElementId(1), MutationKind::ChildList);
        assert_eq!(batch.len(), 1);
        assert!(!batch.is_empty());
        assert!(MutationBatch::default().is_empty());
    }
}
