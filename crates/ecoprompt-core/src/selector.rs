//! CSS 셀렉터.
//!
//! 파싱과 매칭은 `scraper`(servo `selectors` 엔진)가 담당한다.
//! 호스트 문서는 [`DocumentView`]로만 노출되므로, 평가할 때마다
//! 요소 트리를 `scraper::Html` 스냅샷으로 옮긴 뒤 질의하고
//! 결과 노드를 다시 [`ElementId`]로 되돌린다.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use ego_tree::{NodeId, NodeRef};
use html5ever::tendril::StrTendril;
use html5ever::{Attribute, LocalName, Namespace, QualName};
use scraper::node::Element;
use scraper::{ElementRef, Html, Node};

use crate::error::CoreError;
use crate::models::dom::ElementId;
use crate::ports::document::DocumentView;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// 파싱된 셀렉터 (쉼표 목록 포함)
#[derive(Debug, Clone)]
pub struct Selector {
    source: String,
    compiled: scraper::Selector,
}

impl Selector {
    /// 셀렉터 문자열 파싱
    pub fn parse(source: &str) -> Result<Self, CoreError> {
        let compiled = scraper::Selector::parse(source)
            .map_err(|e| CoreError::selector(source, e.to_string()))?;
        Ok(Self {
            source: source.to_string(),
            compiled,
        })
    }

    /// 원본 셀렉터 문자열
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl FromStr for Selector {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// 문서 한 시점의 `scraper` 트리 사본
///
/// `Html`은 `Send`가 아니므로 질의 단위로 만들고 버린다.
pub struct DocumentSnapshot {
    html: Html,
    nodes: HashMap<ElementId, NodeId>,
    elements: HashMap<NodeId, ElementId>,
}

impl DocumentSnapshot {
    /// 문서 순서대로 요소를 옮겨 담는다. 부모를 모르는 요소는 최상위에 붙는다.
    pub fn capture<D: DocumentView + ?Sized>(doc: &D) -> Self {
        let mut html = Html::new_fragment();
        let mut nodes = HashMap::new();
        let mut elements = HashMap::new();

        for id in doc.elements() {
            let Some(tag) = doc.tag_name(id) else {
                continue;
            };
            let element = Node::Element(Element::new(
                qualified(Namespace::from(HTML_NAMESPACE), &tag),
                doc.attributes(id)
                    .into_iter()
                    .map(|(name, value)| Attribute {
                        name: qualified(Namespace::from(""), &name),
                        value: StrTendril::from_slice(&value),
                    })
                    .collect(),
            ));

            let parent = doc
                .parent(id)
                .and_then(|parent| nodes.get(&parent).copied())
                .unwrap_or_else(|| html.tree.root().id());
            let Some(mut parent) = html.tree.get_mut(parent) else {
                continue;
            };
            let node = parent.append(element).id();
            nodes.insert(id, node);
            elements.insert(node, id);
        }

        Self {
            html,
            nodes,
            elements,
        }
    }

    /// 셀렉터와 일치하는 요소 (문서 순서)
    pub fn select(&self, selector: &Selector) -> Vec<ElementId> {
        self.html
            .select(&selector.compiled)
            .filter_map(|element| self.element_id(element))
            .collect()
    }

    /// 자기 자신부터 조상 방향으로 셀렉터와 일치하는 첫 요소
    pub fn closest(&self, id: ElementId, selector: &Selector) -> Option<ElementId> {
        let start: NodeRef<'_, Node> = *self.element_ref(id)?;
        std::iter::once(start)
            .chain(start.ancestors())
            .filter_map(ElementRef::wrap)
            .find(|element| selector.compiled.matches(element))
            .and_then(|element| self.element_id(element))
    }

    fn element_id(&self, element: ElementRef<'_>) -> Option<ElementId> {
        let node: NodeRef<'_, Node> = *element;
        self.elements.get(&node.id()).copied()
    }

    fn element_ref(&self, id: ElementId) -> Option<ElementRef<'_>> {
        let node = self.nodes.get(&id)?;
        self.html.tree.get(*node).and_then(ElementRef::wrap)
    }
}

fn qualified(ns: Namespace, name: &str) -> QualName {
    QualName::new(None, ns, LocalName::from(name.to_lowercase()))
}
