//! Declarative child-view nesting over a small, web-inspired node arena.
//!
//! A [`View`] owns a root element in a [`Document`] and renders a template
//! into it. Child views are registered against CSS-selector placeholders in
//! the parent's markup (see [`View::add_view`]); every call to
//! [`View::render`] detaches live child elements, re-renders the parent's
//! markup, re-renders the children and re-attaches them, preserving node
//! identity across cycles.
//!
//! Internal processes are documented per-module: the node arena in [`dom`],
//! the selector subset in [`selector`], delegated events in [`event`], and
//! the render cycle itself in [`view`] and [`nest`].

use std::hash::{Hash, Hasher};
use std::{fmt, ops::Deref, rc::Rc, str::Split};

pub mod dom;
pub mod event;
pub mod nest;
pub mod selector;
pub mod template;
pub mod view;

pub use dom::{Document, NodeKey};
pub use event::{EventBinding, EventHandler, EventType};
pub use nest::{ChildBinding, ChildSpec};
pub use selector::Selector;
pub use template::{default_template, template, Template};
pub use view::{ChildSet, View, ViewOptions};

pub use serde_json::Value as JsonValue;

/// Crate-wide error type; tells you where it was created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Error {
    pub line: u32,
    pub file: &'static str,
    pub msg: Option<String>,
}

impl Error {
    pub fn new(line: u32, file: &'static str, msg: Option<String>) -> Self {
        Self { line, file, msg }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.msg {
            Some(msg) => write!(f, "{}, line {}: {}", self.file, self.line, msg),
            None => write!(f, "{}, line {}: unknown error", self.file, self.line),
        }
    }
}

impl std::error::Error for Error {}

/// Creates an [`Error`] automatically with an optional formatted string
///
/// # Examples
///
/// ```ignore
/// Err(error!())?;
/// Err(error!("invalid binding: {}", selector))?;
/// ```
#[macro_export]
macro_rules! error {
    () => { $crate::Error::new(::core::line!(), ::core::file!(), None) };
    ($($arg:tt)*) => { $crate::Error::new(::core::line!(), ::core::file!(), Some(::std::format!($($arg)*))) };
}

/// Clone-friendly string: either reference-counted or borrowed from the binary.
#[derive(Clone, Debug)]
pub enum CheapString {
    String(Rc<String>),
    Static(&'static str),
}

impl Hash for CheapString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.deref().hash(state);
    }
}

impl PartialEq for CheapString {
    fn eq(&self, other: &Self) -> bool {
        self.deref() == other.deref()
    }
}

impl Eq for CheapString {}

impl Deref for CheapString {
    type Target = str;

    fn deref(&self) -> &str {
        match self {
            Self::String(s) => &***s,
            Self::Static(s) => s,
        }
    }
}

impl CheapString {
    pub fn is_empty(&self) -> bool {
        self.deref().is_empty()
    }

    pub fn split_space(&self) -> Split<char> {
        self.deref().split(' ')
    }
}

impl From<Rc<String>> for CheapString {
    fn from(string: Rc<String>) -> Self {
        CheapString::String(string)
    }
}

impl From<String> for CheapString {
    fn from(string: String) -> Self {
        CheapString::String(Rc::new(string))
    }
}

impl From<&'static str> for CheapString {
    fn from(string: &'static str) -> Self {
        CheapString::Static(string)
    }
}

pub const fn cheap_string(t: &'static str) -> CheapString {
    CheapString::Static(t)
}

impl fmt::Display for CheapString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.deref())
    }
}
