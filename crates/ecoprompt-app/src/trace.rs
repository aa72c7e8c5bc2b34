//! 재생용 세션 기록 (JSON Lines).
//!
//! 한 줄에 이벤트 하나. `at_ms`는 기록 시작 기준 오프셋이며 감소하면 안 된다.
//! 요소는 기록 안에서 붙인 문자열 이름(`ref`)으로 가리키고, `"root"`는 문서 루트다.
//!
//! ```text
//! {"at_ms":0,"op":"create","ref":"input","tag":"textarea"}
//! {"at_ms":0,"op":"set_value","ref":"input","value":"hello"}
//! {"at_ms":0,"op":"key","key":"Enter","target":"input"}
//! {"at_ms":120,"op":"create","ref":"reply","tag":"div","attrs":{"data-testid":"message"},"text":"The answer"}
//! {"at_ms":300,"op":"append_text","ref":"reply","text":" is forty-two, of course."}
//! ```

use ecoprompt_core::error::CoreError;
use ecoprompt_core::models::dom::{ClickEvent, ElementId, InputEvent, KeyEvent};
use ecoprompt_monitor::VirtualDocument;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::io::BufRead;
use tracing::debug;

/// 문서 루트 참조 이름
pub const ROOT_REF: &str = "root";

/// 기록 오프셋 상한: 7일
pub const MAX_TRACE_OFFSET_MS: u64 = 7 * 24 * 3_600_000;

/// 기록된 이벤트 하나
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TraceEvent {
    /// 기록 시작 기준 오프셋 (ms)
    pub at_ms: u64,
    #[serde(flatten)]
    pub op: TraceOp,
}

/// 문서 변경 또는 입력 이벤트
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TraceOp {
    Create {
        #[serde(rename = "ref")]
        name: String,
        #[serde(default)]
        parent: Option<String>,
        tag: String,
        #[serde(default)]
        attrs: BTreeMap<String, String>,
        #[serde(default)]
        text: Option<String>,
    },
    AppendText {
        #[serde(rename = "ref")]
        name: String,
        text: String,
    },
    SetText {
        #[serde(rename = "ref")]
        name: String,
        text: String,
    },
    SetAttribute {
        #[serde(rename = "ref")]
        name: String,
        attr: String,
        value: String,
    },
    SetValue {
        #[serde(rename = "ref")]
        name: String,
        value: String,
    },
    Remove {
        #[serde(rename = "ref")]
        name: String,
    },
    Key {
        key: String,
        #[serde(default)]
        shift: bool,
        #[serde(default)]
        target: Option<String>,
    },
    Click {
        target: String,
    },
}

/// 기록 파싱. 빈 줄과 `#` 주석 줄은 건너뛴다
pub fn parse_trace<R: BufRead>(reader: R) -> Result<Vec<TraceEvent>, CoreError> {
    let mut events: Vec<TraceEvent> = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let event: TraceEvent = serde_json::from_str(trimmed).map_err(|e| CoreError::Validation {
            field: format!("trace:{}", index + 1),
            message: e.to_string(),
        })?;

        if event.at_ms > MAX_TRACE_OFFSET_MS {
            return Err(CoreError::Validation {
                field: format!("trace:{}", index + 1),
                message: format!(
                    "at_ms {}가 상한 {}를 넘습니다",
                    event.at_ms, MAX_TRACE_OFFSET_MS
                ),
            });
        }
        if let Some(previous) = events.last() {
            if event.at_ms < previous.at_ms {
                return Err(CoreError::Validation {
                    field: format!("trace:{}", index + 1),
                    message: format!(
                        "at_ms가 감소했습니다 ({} < {})",
                        event.at_ms, previous.at_ms
                    ),
                });
            }
        }
        events.push(event);
    }

    debug!("재생 기록 {}개 이벤트 로드", events.len());
    Ok(events)
}

/// 기록 마지막 이벤트의 오프셋
pub fn trace_end_ms(events: &[TraceEvent]) -> u64 {
    events.last().map(|e| e.at_ms).unwrap_or(0)
}

/// 기록 이벤트를 `VirtualDocument`에 적용
///
/// 문서 변경은 즉시 반영하고, 입력 이벤트는 모니터로 넘길 수 있도록 돌려준다.
pub struct TraceApplier {
    refs: HashMap<String, ElementId>,
}

impl TraceApplier {
    pub fn new(document: &VirtualDocument) -> Self {
        let mut refs = HashMap::new();
        refs.insert(ROOT_REF.to_string(), document.root());
        Self { refs }
    }

    fn resolve(&self, name: &str) -> Result<ElementId, CoreError> {
        self.element(name).ok_or_else(|| CoreError::NotFound {
            resource_type: "TraceRef".to_string(),
            id: name.to_string(),
        })
    }

    /// 참조 이름에 대응하는 요소
    pub fn element(&self, name: &str) -> Option<ElementId> {
        self.refs.get(name).copied()
    }

    pub fn apply(
        &mut self,
        document: &VirtualDocument,
        op: &TraceOp,
    ) -> Result<Option<InputEvent>, CoreError> {
        match op {
            TraceOp::Create {
                name,
                parent,
                tag,
                attrs,
                text,
            } => {
                let parent = self.resolve(parent.as_deref().unwrap_or(ROOT_REF))?;
                let attributes: Vec<(&str, &str)> = attrs
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect();
                let id = document.create_element(parent, tag, &attributes)?;
                if let Some(text) = text {
                    document.set_text(id, text)?;
                }
                self.refs.insert(name.clone(), id);
                Ok(None)
            }
            TraceOp::AppendText { name, text } => {
                document.append_text(self.resolve(name)?, text)?;
                Ok(None)
            }
            TraceOp::SetText { name, text } => {
                document.set_text(self.resolve(name)?, text)?;
                Ok(None)
            }
            TraceOp::SetAttribute { name, attr, value } => {
                document.set_attribute(self.resolve(name)?, attr, value)?;
                Ok(None)
            }
            TraceOp::SetValue { name, value } => {
                document.set_value(self.resolve(name)?, value)?;
                Ok(None)
            }
            TraceOp::Remove { name } => {
                document.remove(self.resolve(name)?)?;
                self.refs.remove(name);
                Ok(None)
            }
            TraceOp::Key { key, shift, target } => {
                let target = match target {
                    Some(name) => Some(self.resolve(name)?),
                    None => None,
                };
                Ok(Some(InputEvent::Key(KeyEvent {
                    key: key.clone(),
                    shift: *shift,
                    target,
                })))
            }
            TraceOp::Click { target } => Ok(Some(InputEvent::Click(ClickEvent {
                target: self.resolve(target)?,
            }))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use ecoprompt_core::ports::document::DocumentView;

    const SAMPLE: &str = r#"
# 전송 후 응답 하나
{"at_ms":0,"op":"create","ref":"input","tag":"textarea"}
{"at_ms":0,"op":"set_value","ref":"input","value":"hello"}
{"at_ms":0,"op":"key","key":"Enter","target":"input"}

{"at_ms":120,"op":"create","ref":"reply","tag":"div","attrs":{"data-testid":"message"},"text":"The answer"}
{"at_ms":300,"op":"append_text","ref":"reply","text":" is forty-two, of course."}
"#;

    #[test]
    fn parses_sample() {
        let events = parse_trace(SAMPLE.as_bytes()).unwrap();
        assert_eq!(events.len(), 5);
        assert_eq!(trace_end_ms(&events), 300);
        assert_matches!(&events[2].op, TraceOp::Key { key, shift: false, .. } if key == "Enter");
        assert_matches!(&events[3].op, TraceOp::Create { attrs, .. } if attrs["data-testid"] == "message");
    }

    #[test]
    fn rejects_decreasing_offsets() {
        let trace = "{\"at_ms\":10,\"op\":\"click\",\"target\":\"a\"}\n{\"at_ms\":5,\"op\":\"click\",\"target\":\"a\"}\n";
        let err = parse_trace(trace.as_bytes()).unwrap_err();
        assert_matches!(err, CoreError::Validation { field, .. } if field == "trace:2");
    }

    #[test]
    fn rejects_offset_past_limit() {
        let trace = format!(
            "{{\"at_ms\":0,\"op\":\"click\",\"target\":\"a\"}}\n{{\"at_ms\":{},\"op\":\"click\",\"target\":\"a\"}}\n",
            MAX_TRACE_OFFSET_MS + 1
        );
        let err = parse_trace(trace.as_bytes()).unwrap_err();
        assert_matches!(err, CoreError::Validation { field, .. } if field == "trace:2");

        let at_limit = format!(
            "{{\"at_ms\":{},\"op\":\"click\",\"target\":\"a\"}}",
            MAX_TRACE_OFFSET_MS
        );
        assert_eq!(parse_trace(at_limit.as_bytes()).unwrap().len(), 1);
    }

    #[test]
    fn rejects_unknown_op() {
        let err = parse_trace("{\"at_ms\":0,\"op\":\"scroll\"}".as_bytes()).unwrap_err();
        assert_matches!(err, CoreError::Validation { field, .. } if field == "trace:1");
    }

    #[test]
    fn applies_ops_to_document() {
        let document = VirtualDocument::new();
        let mut applier = TraceApplier::new(&document);
        let events = parse_trace(SAMPLE.as_bytes()).unwrap();

        let mut inputs = Vec::new();
        for event in &events {
            if let Some(input) = applier.apply(&document, &event.op).unwrap() {
                inputs.push(input);
            }
        }

        let input = applier.element("input").unwrap();
        let reply = applier.element("reply").unwrap();
        assert_eq!(document.form_value(input).as_deref(), Some("hello"));
        assert_eq!(
            document.text_content(reply).as_deref(),
            Some("The answer is forty-two, of course.")
        );
        assert_matches!(&inputs[..], [InputEvent::Key(KeyEvent { target: Some(t), .. })] if *t == input);
    }

    #[test]
    fn unknown_ref_is_not_found() {
        let document = VirtualDocument::new();
        let mut applier = TraceApplier::new(&document);
        let err = applier
            .apply(
                &document,
                &TraceOp::AppendText {
                    name: "missing".to_string(),
                    text: "x".to_string(),
                },
            )
            .unwrap_err();
        assert_matches!(err, CoreError::NotFound { .. });
    }

    #[test]
    fn removed_ref_is_forgotten() {
        let document = VirtualDocument::new();
        let mut applier = TraceApplier::new(&document);
        applier
            .apply(
                &document,
                &TraceOp::Create {
                    name: "a".to_string(),
                    parent: None,
                    tag: "div".to_string(),
                    attrs: BTreeMap::new(),
                    text: None,
                },
            )
            .unwrap();
        applier
            .apply(&document, &TraceOp::Remove { name: "a".to_string() })
            .unwrap();
        assert!(applier.element("a").is_none());
        assert_eq!(document.len(), 1);
    }
}
