//! 휴리스틱 전송 감지기.
//!
//! Shift 없는 Enter, 또는 레이블이 send/submit/enter인 버튼 클릭을 전송으로 본다.
//! 텍스트는 이벤트 시점에 한 번 읽고, 세션이 짧은 지연 후 다시 읽는다.

use ecoprompt_core::models::dom::{ClickEvent, ElementId, KeyEvent};
use ecoprompt_core::models::send::SendIntent;
use ecoprompt_core::ports::document::DocumentView;
use ecoprompt_core::ports::send_detector::SendDetector;
use ecoprompt_core::selector::Selector;

/// 전송 의도로 보는 버튼 레이블 어휘
const SEND_LABEL_WORDS: &[&str] = &["send", "submit", "enter"];

/// 버튼 클릭 시 전송 텍스트를 읽을 입력 요소
const TEXT_INPUT_SELECTOR: &str = r#"textarea, [contenteditable="true"], input[type="text"]"#;

/// 기본 전송 감지 전략
#[derive(Debug, Clone, Default)]
pub struct HeuristicSendDetector;

impl HeuristicSendDetector {
    pub fn new() -> Self {
        Self
    }

    /// 요소 자신부터 조상 방향으로 첫 `button`
    fn closest_button(doc: &dyn DocumentView, element: ElementId) -> Option<ElementId> {
        let button = Selector::parse("button").ok()?;
        doc.closest(element, &button)
    }

    /// 보이는 텍스트, 비어 있으면 aria-label
    fn button_label(doc: &dyn DocumentView, button: ElementId) -> String {
        let text = doc.text_content(button).unwrap_or_default();
        let label = if text.trim().is_empty() {
            doc.attribute(button, "aria-label").unwrap_or_default()
        } else {
            text
        };
        label.to_lowercase()
    }

    /// 문서 순서로 첫 텍스트 입력 요소
    fn first_text_input(doc: &dyn DocumentView) -> Option<ElementId> {
        let selector = Selector::parse(TEXT_INPUT_SELECTOR).ok()?;
        doc.query_first(&selector).ok().flatten()
    }
}

impl SendDetector for HeuristicSendDetector {
    fn on_key_event(&self, doc: &dyn DocumentView, event: &KeyEvent) -> Option<SendIntent> {
        if event.key != "Enter" || event.shift {
            return None;
        }
        let source = event.target?;
        let text = self.extract_text(doc, source)?;
        Some(SendIntent {
            source,
            text_at_trigger: text,
        })
    }

    fn on_click_event(&self, doc: &dyn DocumentView, event: &ClickEvent) -> Option<SendIntent> {
        let button = Self::closest_button(doc, event.target)?;
        let label = Self::button_label(doc, button);
        if !SEND_LABEL_WORDS.iter().any(|word| label.contains(word)) {
            return None;
        }
        let source = Self::first_text_input(doc)?;
        let text = self.extract_text(doc, source)?;
        Some(SendIntent {
            source,
            text_at_trigger: text,
        })
    }

    fn extract_text(&self, doc: &dyn DocumentView, element: ElementId) -> Option<String> {
        let raw = match doc.tag_name(element).as_deref() {
            Some("textarea") | Some("input") => doc.form_value(element).unwrap_or_default(),
            _ => doc.text_content(element).unwrap_or_default(),
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}
