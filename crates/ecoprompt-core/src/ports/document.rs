//! 문서 관찰 포트.
//!
//! 구현: `ecoprompt-monitor::virtual_dom::VirtualDocument` (인메모리 요소 트리).
//! 브라우저 어댑터도 같은 trait을 구현하면 모니터 코드를 그대로 쓸 수 있다.

use tokio::sync::broadcast;

use crate::error::CoreError;
use crate::models::dom::{ElementId, MutationBatch};
use crate::selector::{DocumentSnapshot, Selector};

/// 셀렉터 매칭에 필요한 최소 요소 트리 접근
pub trait ElementTree {
    /// 태그 이름 (소문자)
    fn tag_name(&self, id: ElementId) -> Option<String>;

    /// 전체 속성 (이름, 값)
    fn attributes(&self, id: ElementId) -> Vec<(String, String)>;

    /// 속성 값
    fn attribute(&self, id: ElementId, name: &str) -> Option<String> {
        self.attributes(id)
            .into_iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    /// 부모 요소
    fn parent(&self, id: ElementId) -> Option<ElementId>;
}

/// 후보 요소 조회 및 텍스트 재읽기
pub trait DocumentView: ElementTree + Send + Sync {
    /// 문서 순서의 전체 요소 목록
    fn elements(&self) -> Vec<ElementId>;

    /// 요소의 전체 텍스트 내용 (자손 포함)
    fn text_content(&self, id: ElementId) -> Option<String>;

    /// 폼 입력 값 (`textarea`, `input`)
    fn form_value(&self, id: ElementId) -> Option<String>;

    /// 셀렉터와 일치하는 요소를 문서 순서로 조회
    fn query_all(&self, selector: &Selector) -> Result<Vec<ElementId>, CoreError> {
        Ok(DocumentSnapshot::capture(self).select(selector))
    }

    /// 셀렉터와 일치하는 첫 요소
    fn query_first(&self, selector: &Selector) -> Result<Option<ElementId>, CoreError> {
        Ok(self.query_all(selector)?.into_iter().next())
    }

    /// 자기 자신부터 조상 방향으로 셀렉터와 일치하는 첫 요소
    fn closest(&self, id: ElementId, selector: &Selector) -> Option<ElementId> {
        DocumentSnapshot::capture(self).closest(id, selector)
    }
}

/// 하위 트리 변경 알림
pub trait ChangeFeed: Send + Sync {
    /// 변경 배치 스트림 구독
    fn subscribe(&self) -> Result<broadcast::Receiver<MutationBatch>, CoreError>;
}
