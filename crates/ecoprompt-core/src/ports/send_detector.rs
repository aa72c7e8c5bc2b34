//! 전송 감지 포트.
//!
//! 구현: `ecoprompt-monitor::send_detector::HeuristicSendDetector`.
//! 다른 감지 전략으로 교체해도 트래커/이미터는 영향받지 않는다.

use crate::models::dom::{ClickEvent, ElementId, KeyEvent};
use crate::models::send::SendIntent;
use crate::ports::document::DocumentView;

/// 입력 이벤트 → 전송 의도 판단
pub trait SendDetector: Send + Sync {
    /// 키 입력이 전송인지 판단
    fn on_key_event(&self, doc: &dyn DocumentView, event: &KeyEvent) -> Option<SendIntent>;

    /// 클릭이 전송인지 판단
    fn on_click_event(&self, doc: &dyn DocumentView, event: &ClickEvent) -> Option<SendIntent>;

    /// 지연 읽기 시점에 입력 요소의 텍스트를 다시 읽음
    fn extract_text(&self, doc: &dyn DocumentView, element: ElementId) -> Option<String>;
}
