//! Document arena
//!
//! A [`Document`] owns every node in a generational-index arena. Keys stay
//! valid for as long as the node lives; once a node is deleted, its key goes
//! stale and every operation taking it becomes a no-op (or returns `None`).
//! This is what lets callers hold on to element keys across re-renders
//! without any risk of touching a recycled slot.
//!
//! Three node payloads exist: elements (tag + attributes), text, and
//! fragments. A fragment is an off-document ordered buffer of nodes, used by
//! the render cycle to queue detached children before re-attaching them in
//! one move.

use log::info;

use crate::event::EventBinding;
use crate::selector::Selector;
use crate::{error, CheapString, Error};

/// Generational handle to a node in a [`Document`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeKey {
    index: u32,
    cookie: u32,
}

enum NodeData {
    Element {
        tag: CheapString,
        attributes: Vec<(CheapString, String)>,
    },
    Text(String),
    Fragment,
}

struct Node {
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
    data: NodeData,
}

struct Slot {
    cookie: u32,
    node: Option<Node>,
}

/// The node arena, plus the event-delegation records (see [`crate::event`]).
#[derive(Default)]
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<u32>,
    pub(crate) delegates: Vec<(NodeKey, EventBinding)>,
}

const NO_CHILDREN: &[NodeKey] = &[];

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, data: NodeData) -> NodeKey {
        let node = Node {
            parent: None,
            children: Vec::new(),
            data,
        };
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.node = Some(node);
                NodeKey {
                    index,
                    cookie: slot.cookie,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    cookie: 0,
                    node: Some(node),
                });
                NodeKey { index, cookie: 0 }
            }
        }
    }

    fn get(&self, key: NodeKey) -> Option<&Node> {
        let slot = self.slots.get(key.index as usize)?;
        match slot.cookie == key.cookie {
            true => slot.node.as_ref(),
            false => None,
        }
    }

    fn get_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        let slot = self.slots.get_mut(key.index as usize)?;
        match slot.cookie == key.cookie {
            true => slot.node.as_mut(),
            false => None,
        }
    }

    /// Whether `key` still refers to a live node.
    pub fn alive(&self, key: NodeKey) -> bool {
        self.get(key).is_some()
    }

    pub fn create_element<T: Into<CheapString>>(&mut self, tag: T) -> NodeKey {
        self.alloc(NodeData::Element {
            tag: tag.into(),
            attributes: Vec::new(),
        })
    }

    pub fn create_text<T: Into<String>>(&mut self, text: T) -> NodeKey {
        self.alloc(NodeData::Text(text.into()))
    }

    pub fn create_fragment(&mut self) -> NodeKey {
        self.alloc(NodeData::Fragment)
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.get(key)?.parent
    }

    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        match self.get(key) {
            Some(node) => &node.children,
            None => NO_CHILDREN,
        }
    }

    /// Tag name, for element nodes.
    pub fn tag(&self, key: NodeKey) -> Option<&str> {
        match &self.get(key)?.data {
            NodeData::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    /// Text content, for text nodes.
    pub fn text(&self, key: NodeKey) -> Option<&str> {
        match &self.get(key)?.data {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn attribute(&self, key: NodeKey, name: &str) -> Option<&str> {
        match &self.get(key)?.data {
            NodeData::Element { attributes, .. } => attributes
                .iter()
                .find(|(attr, _)| **attr == *name)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    pub fn set_attribute<N, V>(&mut self, key: NodeKey, name: N, value: V)
    where
        N: Into<CheapString>,
        V: Into<String>,
    {
        let name = name.into();
        let value = value.into();
        if let Some(node) = self.get_mut(key) {
            if let NodeData::Element { attributes, .. } = &mut node.data {
                match attributes.iter_mut().find(|(attr, _)| *attr == name) {
                    Some((_, slot)) => *slot = value,
                    None => attributes.push((name, value)),
                }
            }
        }
    }

    pub fn has_class(&self, key: NodeKey, class: &str) -> bool {
        match self.attribute(key, "class") {
            Some(value) => value.split_whitespace().any(|c| c == class),
            None => false,
        }
    }

    /// Unlinks `key` from its parent; the subtree stays alive, off-document.
    pub fn detach(&mut self, key: NodeKey) {
        let Some(parent) = self.parent(key) else {
            return;
        };
        if let Some(node) = self.get_mut(parent) {
            node.children.retain(|child| *child != key);
        }
        if let Some(node) = self.get_mut(key) {
            node.parent = None;
        }
    }

    pub fn append(&mut self, parent: NodeKey, child: NodeKey) {
        if !self.alive(parent) || !self.alive(child) || parent == child {
            return;
        }
        self.detach(child);
        self.get_mut(parent).unwrap().children.push(child);
        self.get_mut(child).unwrap().parent = Some(parent);
    }

    pub fn prepend(&mut self, parent: NodeKey, child: NodeKey) {
        if !self.alive(parent) || !self.alive(child) || parent == child {
            return;
        }
        self.detach(child);
        self.get_mut(parent).unwrap().children.insert(0, child);
        self.get_mut(child).unwrap().parent = Some(parent);
    }

    /// Puts `new` where `old` currently sits and deletes `old`'s subtree.
    pub fn replace(&mut self, old: NodeKey, new: NodeKey) {
        if old == new || !self.alive(new) {
            return;
        }
        let Some(parent) = self.parent(old) else {
            return;
        };
        self.detach(new);
        let index = self
            .children(parent)
            .iter()
            .position(|child| *child == old);
        if let Some(index) = index {
            self.get_mut(parent).unwrap().children[index] = new;
            self.get_mut(new).unwrap().parent = Some(parent);
            self.get_mut(old).unwrap().parent = None;
        }
        self.delete(old);
    }

    /// Frees `key` and its whole subtree; their keys go stale. Delegation
    /// records owned by freed nodes are dropped too.
    pub fn delete(&mut self, key: NodeKey) {
        if !self.alive(key) {
            return;
        }
        self.detach(key);
        let mut stack = vec![key];
        while let Some(key) = stack.pop() {
            let slot = &mut self.slots[key.index as usize];
            if slot.cookie != key.cookie {
                continue;
            }
            if let Some(node) = slot.node.take() {
                slot.cookie = slot.cookie.wrapping_add(1);
                self.free.push(key.index);
                stack.extend(node.children);
            }
        }
        let mut delegates = core::mem::take(&mut self.delegates);
        delegates.retain(|(owner, _)| self.alive(*owner));
        self.delegates = delegates;
    }

    /// Moves a fragment's children (in order) into `target`, consuming the
    /// fragment shell.
    pub fn append_fragment(&mut self, target: NodeKey, fragment: NodeKey) {
        if !self.alive(target) {
            return;
        }
        let children = match self.get_mut(fragment) {
            Some(node) => core::mem::take(&mut node.children),
            None => return,
        };
        for child in children {
            if self.alive(child) {
                self.get_mut(child).unwrap().parent = Some(target);
                self.get_mut(target).unwrap().children.push(child);
            }
        }
        self.delete(fragment);
    }

    /// Frees a fragment shell; its children survive, detached.
    pub fn dissolve_fragment(&mut self, fragment: NodeKey) {
        let children = match self.get_mut(fragment) {
            Some(node) => core::mem::take(&mut node.children),
            None => return,
        };
        for child in children {
            if let Some(node) = self.get_mut(child) {
                node.parent = None;
            }
        }
        self.delete(fragment);
    }

    /// Replaces the children of `root` with the parse of `markup`.
    ///
    /// The markup is wrapped in a synthetic root so that bare text and
    /// sibling sequences are legal input. Malformed markup (stray `<`,
    /// mismatched close tags, unterminated elements) is an [`Error`]; in
    /// that case `root` is left with whatever was built before the fault.
    pub fn set_inner_markup(&mut self, root: NodeKey, markup: &str) -> Result<(), Error> {
        if !self.alive(root) {
            return Err(error!("set_inner_markup on a stale node"));
        }
        for child in self.children(root).to_vec() {
            self.delete(child);
        }
        let wrapped = format!("<x>{}</x>", markup);
        let mut stack: Vec<NodeKey> = Vec::new();
        for token in xmlparser::Tokenizer::from(wrapped.as_str()) {
            use xmlparser::{ElementEnd, Token};
            let token = match token {
                Ok(token) => token,
                Err(e) => return Err(error!("invalid markup: {}", e)),
            };
            match token {
                Token::ElementStart { local, .. } => match stack.is_empty() {
                    true => stack.push(root),
                    false => {
                        let element = self.create_element(String::from(local.as_str()));
                        self.append(*stack.last().unwrap(), element);
                        stack.push(element);
                    }
                },
                Token::Attribute { local, value, .. } => {
                    let current = *stack.last().unwrap();
                    if current != root {
                        self.set_attribute(
                            current,
                            String::from(local.as_str()),
                            value.as_str(),
                        );
                    }
                }
                Token::ElementEnd { end, .. } => match end {
                    ElementEnd::Open => (),
                    ElementEnd::Empty => {
                        stack.pop();
                    }
                    ElementEnd::Close(_, name) => {
                        let Some(current) = stack.pop() else {
                            return Err(error!("stray close tag: </{}>", name.as_str()));
                        };
                        if current != root && self.tag(current) != Some(name.as_str()) {
                            return Err(error!(
                                "mismatched close tag: </{}> closes <{}>",
                                name.as_str(),
                                self.tag(current).unwrap_or("?"),
                            ));
                        }
                    }
                },
                Token::Text { text } => {
                    let node = self.create_text(text.as_str());
                    self.append(*stack.last().unwrap(), node);
                }
                // comments, PIs and declarations are dropped
                _ => (),
            }
        }
        Ok(())
    }

    fn write_node(&self, key: NodeKey, out: &mut String) {
        match self.get(key).map(|node| &node.data) {
            Some(NodeData::Element { tag, attributes }) => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(value);
                    out.push('"');
                }
                out.push('>');
                for child in self.children(key) {
                    self.write_node(*child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
            Some(NodeData::Text(text)) => out.push_str(text),
            Some(NodeData::Fragment) => {
                for child in self.children(key) {
                    self.write_node(*child, out);
                }
            }
            None => (),
        }
    }

    /// Serializes the children of `key`. Text is emitted verbatim and
    /// elements are never self-closing, so the output of an empty element is
    /// `<tag></tag>`.
    pub fn inner_html(&self, key: NodeKey) -> String {
        let mut out = String::new();
        for child in self.children(key) {
            self.write_node(*child, &mut out);
        }
        out
    }

    /// Serializes `key` itself, children included.
    pub fn outer_html(&self, key: NodeKey) -> String {
        let mut out = String::new();
        self.write_node(key, &mut out);
        out
    }

    /// First descendant of `root` (document order, `root` excluded) matching
    /// the selector. The empty selector matches nothing.
    pub fn query_first(&self, root: NodeKey, selector: &Selector) -> Option<NodeKey> {
        if selector.is_empty() {
            return None;
        }
        let mut stack: Vec<NodeKey> = self.children(root).iter().rev().copied().collect();
        while let Some(key) = stack.pop() {
            if selector.matches(self, key, root) {
                return Some(key);
            }
            stack.extend(self.children(key).iter().rev().copied());
        }
        None
    }

    /// Whether `node` sits in the subtree of `ancestor` (inclusive).
    pub fn contains(&self, ancestor: NodeKey, node: NodeKey) -> bool {
        if !self.alive(node) {
            return false;
        }
        let mut current = node;
        loop {
            if current == ancestor {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Logs the subtree under `key`; for debugging sessions.
    pub fn tree_log(&self, key: NodeKey, depth: usize) {
        let pad = "    ".repeat(depth);
        match self.get(key).map(|node| &node.data) {
            Some(NodeData::Element { tag, .. }) => info!("{}<{}> {:?}", pad, tag, key),
            Some(NodeData::Text(text)) => info!("{}{:?}", pad, text),
            Some(NodeData::Fragment) => info!("{}[fragment] {:?}", pad, key),
            None => info!("{}[stale] {:?}", pad, key),
        }
        for child in self.children(key).to_vec() {
            self.tree_log(child, depth + 1);
        }
    }
}
