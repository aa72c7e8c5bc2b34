//! 인메모리 문서.
//!
//! 안정적인 요소 ID, 속성, 텍스트, 폼 값을 가진 요소 트리.
//! 변경 연산마다 `MutationBatch`를 broadcast 채널로 발행하며,
//! 재생(replay)과 테스트에서 호스트 페이지 어댑터로 쓰인다.
//!
//! 요소의 텍스트는 "자체 텍스트 + 자식 텍스트(문서 순서)"로 구성된다.

use ecoprompt_core::error::CoreError;
use ecoprompt_core::models::dom::{ElementId, MutationBatch, MutationKind};
use ecoprompt_core::ports::document::{ChangeFeed, DocumentView, ElementTree};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::broadcast;
use tracing::trace;

/// 기본 변경 알림 채널 용량
const DEFAULT_FEED_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
struct VirtualElement {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: String,
    value: Option<String>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

impl VirtualElement {
    fn new(tag: &str, parent: Option<ElementId>) -> Self {
        Self {
            tag: tag.to_lowercase(),
            attributes: BTreeMap::new(),
            text: String::new(),
            value: None,
            parent,
            children: Vec::new(),
        }
    }
}

#[derive(Debug)]
struct Tree {
    elements: HashMap<ElementId, VirtualElement>,
    root: ElementId,
    next_id: u64,
}

impl Tree {
    fn get(&self, id: ElementId) -> Result<&VirtualElement, CoreError> {
        self.elements.get(&id).ok_or_else(|| not_found(id))
    }

    fn get_mut(&mut self, id: ElementId) -> Result<&mut VirtualElement, CoreError> {
        self.elements.get_mut(&id).ok_or_else(|| not_found(id))
    }

    fn collect_text(&self, id: ElementId, out: &mut String) {
        if let Some(element) = self.elements.get(&id) {
            out.push_str(&element.text);
            for child in &element.children {
                self.collect_text(*child, out);
            }
        }
    }

    fn collect_ids(&self, id: ElementId, out: &mut Vec<ElementId>) {
        if let Some(element) = self.elements.get(&id) {
            out.push(id);
            for child in &element.children {
                self.collect_ids(*child, out);
            }
        }
    }
}

fn not_found(id: ElementId) -> CoreError {
    CoreError::NotFound {
        resource_type: "Element".to_string(),
        id: id.to_string(),
    }
}

/// 인메모리 문서 + 변경 알림
pub struct VirtualDocument {
    tree: RwLock<Tree>,
    changes: broadcast::Sender<MutationBatch>,
}

impl VirtualDocument {
    /// `body` 루트만 있는 빈 문서
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_FEED_CAPACITY)
    }

    /// 변경 알림 채널 용량 지정
    pub fn with_capacity(capacity: usize) -> Self {
        let root = ElementId(0);
        let mut elements = HashMap::new();
        elements.insert(root, VirtualElement::new("body", None));
        let (changes, _) = broadcast::channel(capacity.max(1));
        Self {
            tree: RwLock::new(Tree {
                elements,
                root,
                next_id: 1,
            }),
            changes,
        }
    }

    pub fn root(&self) -> ElementId {
        self.tree.read().root
    }

    /// 자식 요소 추가
    pub fn create_element(
        &self,
        parent: ElementId,
        tag: &str,
        attributes: &[(&str, &str)],
    ) -> Result<ElementId, CoreError> {
        let id = {
            let mut tree = self.tree.write();
            tree.get(parent)?;
            let id = ElementId(tree.next_id);
            tree.next_id += 1;

            let mut element = VirtualElement::new(tag, Some(parent));
            for (name, value) in attributes {
                element
                    .attributes
                    .insert(name.to_lowercase(), value.to_string());
            }
            tree.elements.insert(id, element);
            tree.get_mut(parent)?.children.push(id);
            id
        };
        self.publish(parent, MutationKind::ChildList);
        Ok(id)
    }

    /// 자체 텍스트 뒤에 이어 붙이기 (스트리밍 토큰)
    pub fn append_text(&self, id: ElementId, chunk: &str) -> Result<(), CoreError> {
        self.tree.write().get_mut(id)?.text.push_str(chunk);
        self.publish(id, MutationKind::CharacterData);
        Ok(())
    }

    /// 자체 텍스트 교체
    pub fn set_text(&self, id: ElementId, text: &str) -> Result<(), CoreError> {
        self.tree.write().get_mut(id)?.text = text.to_string();
        self.publish(id, MutationKind::CharacterData);
        Ok(())
    }

    pub fn set_attribute(&self, id: ElementId, name: &str, value: &str) -> Result<(), CoreError> {
        self.tree
            .write()
            .get_mut(id)?
            .attributes
            .insert(name.to_lowercase(), value.to_string());
        self.publish(id, MutationKind::Attributes);
        Ok(())
    }

    /// 폼 값 설정. 폼 값 변경은 DOM 변경 알림을 만들지 않는다
    pub fn set_value(&self, id: ElementId, value: &str) -> Result<(), CoreError> {
        self.tree.write().get_mut(id)?.value = Some(value.to_string());
        Ok(())
    }

    /// 하위 트리 제거 (루트는 제거 불가)
    pub fn remove(&self, id: ElementId) -> Result<(), CoreError> {
        let parent = {
            let mut tree = self.tree.write();
            if id == tree.root {
                return Err(CoreError::Validation {
                    field: "element".to_string(),
                    message: "루트 요소는 제거할 수 없습니다".to_string(),
                });
            }
            let mut removed = Vec::new();
            tree.collect_ids(id, &mut removed);
            let parent = tree.get(id)?.parent;
            for element in removed {
                tree.elements.remove(&element);
            }
            if let Some(parent) = parent {
                if let Some(element) = tree.elements.get_mut(&parent) {
                    element.children.retain(|child| *child != id);
                }
            }
            parent
        };
        if let Some(parent) = parent {
            self.publish(parent, MutationKind::ChildList);
        }
        Ok(())
    }

    /// 요소 수 (루트 포함)
    pub fn len(&self) -> usize {
        self.tree.read().elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn publish(&self, target: ElementId, kind: MutationKind) {
        trace!("문서 변경: {} {:?}", target, kind);
        // 구독자가 없으면 알림은 버려진다
        let _ = self.changes.send(MutationBatch::single(target, kind));
    }
}

impl Default for VirtualDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementTree for VirtualDocument {
    fn tag_name(&self, id: ElementId) -> Option<String> {
        self.tree.read().elements.get(&id).map(|e| e.tag.clone())
    }

    fn attributes(&self, id: ElementId) -> Vec<(String, String)> {
        self.tree
            .read()
            .elements
            .get(&id)
            .map(|e| {
                e.attributes
                    .iter()
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn attribute(&self, id: ElementId, name: &str) -> Option<String> {
        self.tree
            .read()
            .elements
            .get(&id)
            .and_then(|e| e.attributes.get(&name.to_lowercase()).cloned())
    }

    fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.tree.read().elements.get(&id).and_then(|e| e.parent)
    }
}

impl DocumentView for VirtualDocument {
    fn elements(&self) -> Vec<ElementId> {
        let tree = self.tree.read();
        let mut ids = Vec::with_capacity(tree.elements.len());
        tree.collect_ids(tree.root, &mut ids);
        ids
    }

    fn text_content(&self, id: ElementId) -> Option<String> {
        let tree = self.tree.read();
        tree.elements.get(&id)?;
        let mut text = String::new();
        tree.collect_text(id, &mut text);
        Some(text)
    }

    fn form_value(&self, id: ElementId) -> Option<String> {
        self.tree.read().elements.get(&id).and_then(|e| e.value.clone())
    }
}

impl ChangeFeed for VirtualDocument {
    fn subscribe(&self) -> Result<broadcast::Receiver<MutationBatch>, CoreError> {
        Ok(self.changes.subscribe())
    }
}
