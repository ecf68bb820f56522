//! Delegated events
//!
//! Handlers are not bound on individual nodes. A view installs its
//! [`EventBinding`]s once, keyed by its root element (the "owner"), and
//! [`Document::trigger`] bubbles an event from the target up to the document
//! root, running every binding whose selector matches the node the bubble is
//! passing through. Because bindings live on the owner and not on the nodes
//! the template produced, re-rendering the markup does not lose them.

use std::{fmt, rc::Rc};

use bitflags::bitflags;
use log::warn;

use crate::dom::{Document, NodeKey};
use crate::selector::Selector;
use crate::{CheapString, Error};

bitflags! {
    /// A set of event kinds; a binding can subscribe to several at once.
    pub struct EventType: u32 {
        const CLICK        = 1 <<  0;
        const DOUBLE_CLICK = 1 <<  1;
        const POINTER_DOWN = 1 <<  2;
        const POINTER_UP   = 1 <<  3;
        const INPUT        = 1 <<  4;
        const CHANGE       = 1 <<  5;
        const SUBMIT       = 1 <<  6;
        const FOCUS        = 1 <<  7;
        const BLUR         = 1 <<  8;
        const KEY_DOWN     = 1 <<  9;
        const KEY_UP       = 1 << 10;
    }
}

/// Called with the node the event bubbled through; return `true` to stop
/// propagation.
pub type EventHandler = Rc<dyn Fn(NodeKey) -> bool>;

/// One delegated subscription; the selector is compiled at construction.
#[derive(Clone)]
pub struct EventBinding {
    pub events: EventType,
    selector: CheapString,
    compiled: Selector,
    handler: EventHandler,
}

impl EventBinding {
    /// An empty selector scopes the binding to the owner element itself.
    pub fn new<S, H>(events: EventType, selector: S, handler: H) -> Result<Self, Error>
    where
        S: Into<CheapString>,
        H: Fn(NodeKey) -> bool + 'static,
    {
        let selector = selector.into();
        let compiled = Selector::parse(&selector)?;
        Ok(Self {
            events,
            selector,
            compiled,
            handler: Rc::new(handler),
        })
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    fn applies(&self, doc: &Document, owner: NodeKey, node: NodeKey) -> bool {
        match self.compiled.is_empty() {
            true => node == owner,
            false => doc.contains(owner, node) && self.compiled.matches(doc, node, owner),
        }
    }
}

impl fmt::Debug for EventBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBinding")
            .field("events", &self.events)
            .field("selector", &self.selector)
            .finish()
    }
}

impl Document {
    /// Installs a binding, keyed by `owner`. Bindings on a stale owner are
    /// dropped with a warning.
    pub fn delegate(&mut self, owner: NodeKey, binding: EventBinding) {
        if !self.alive(owner) {
            warn!("delegate: stale owner {:?}, binding dropped", owner);
            return;
        }
        self.delegates.push((owner, binding));
    }

    /// Removes every binding keyed by `owner`.
    pub fn undelegate(&mut self, owner: NodeKey) {
        self.delegates.retain(|(key, _)| *key != owner);
    }

    /// Bubbles an event from `target` to the document root, running matching
    /// handlers in installation order at each step. Returns `true` if a
    /// handler stopped propagation.
    pub fn trigger(&self, target: NodeKey, event: EventType) -> bool {
        let mut current = target;
        loop {
            if !self.alive(current) {
                return false;
            }
            for (owner, binding) in &self.delegates {
                if !binding.events.intersects(event) {
                    continue;
                }
                if binding.applies(self, *owner, current) && (binding.handler)(current) {
                    return true;
                }
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }
}
