//! Tiny CSS selector subset
//!
//! Supports compound simple selectors (`tag`, `.class`, `#id`, `*`) combined
//! with the descendant combinator (whitespace). Anything fancier (`>`, `+`,
//! `[attr]`, pseudo-classes) is rejected at parse time, so a bad selector
//! surfaces when a binding is registered, not in the middle of a render
//! cycle.

use crate::dom::{Document, NodeKey};
use crate::{error, CheapString, Error};

/// One whitespace-separated step of a selector, e.g. `div.nest#main`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<CheapString>,
    id: Option<CheapString>,
    classes: Vec<CheapString>,
}

/// A compiled selector; parsed once at registration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selector {
    parts: Vec<Compound>,
}

fn ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn take_ident(text: &str, at: usize) -> (usize, &str) {
    let rest = &text[at..];
    let len = rest.find(|c| !ident_char(c)).unwrap_or(rest.len());
    (at + len, &rest[..len])
}

impl Compound {
    fn parse(text: &str) -> Result<Self, Error> {
        let mut compound = Self::default();
        let mut i = 0;
        while i < text.len() {
            let c = text[i..].chars().next().unwrap();
            match c {
                '*' => i += 1,
                '.' => {
                    let (next, name) = take_ident(text, i + 1);
                    if name.is_empty() {
                        return Err(error!("empty class name in selector: {:?}", text));
                    }
                    compound.classes.push(String::from(name).into());
                    i = next;
                }
                '#' => {
                    let (next, name) = take_ident(text, i + 1);
                    if name.is_empty() {
                        return Err(error!("empty id in selector: {:?}", text));
                    }
                    if compound.id.is_some() {
                        return Err(error!("two ids in selector: {:?}", text));
                    }
                    compound.id = Some(String::from(name).into());
                    i = next;
                }
                c if ident_char(c) => {
                    if i != 0 || compound.tag.is_some() {
                        return Err(error!("misplaced tag name in selector: {:?}", text));
                    }
                    let (next, name) = take_ident(text, i);
                    compound.tag = Some(String::from(name).into());
                    i = next;
                }
                c => return Err(error!("unsupported selector syntax: {:?} in {:?}", c, text)),
            }
        }
        Ok(compound)
    }

    fn matches(&self, doc: &Document, node: NodeKey) -> bool {
        let Some(tag) = doc.tag(node) else {
            // text nodes, fragments and stale keys never match
            return false;
        };
        if let Some(expected) = &self.tag {
            if **expected != *tag {
                return false;
            }
        }
        if let Some(expected) = &self.id {
            if doc.attribute(node, "id") != Some(&**expected) {
                return false;
            }
        }
        self.classes.iter().all(|class| doc.has_class(node, class))
    }
}

impl Selector {
    /// Compiles a selector string; the empty string compiles to the empty
    /// selector ("no attachment point").
    pub fn parse(text: &str) -> Result<Self, Error> {
        let mut parts = Vec::new();
        for chunk in text.split_whitespace() {
            parts.push(Compound::parse(chunk)?);
        }
        Ok(Self { parts })
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Whether `node` matches this selector, with ancestor steps confined to
    /// the subtree of `scope` (inclusive). The empty selector matches
    /// nothing.
    pub fn matches(&self, doc: &Document, node: NodeKey, scope: NodeKey) -> bool {
        let Some(last) = self.parts.last() else {
            return false;
        };
        if !last.matches(doc, node) {
            return false;
        }
        let mut part = self.parts.len() - 1;
        let mut current = node;
        while part > 0 {
            let mut found = false;
            while current != scope {
                current = match doc.parent(current) {
                    Some(parent) => parent,
                    None => break,
                };
                if self.parts[part - 1].matches(doc, current) {
                    found = true;
                    break;
                }
            }
            if !found {
                return false;
            }
            part -= 1;
        }
        true
    }
}
