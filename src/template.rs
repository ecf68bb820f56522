//! Template functions
//!
//! A template is a pure function from render data to markup. Views clone the
//! handle freely, so templates are shared behind an `Rc`.

use std::rc::Rc;

use serde_json::Value;

pub type Template = Rc<dyn Fn(&Value) -> String>;

/// Wraps a closure as a shareable [`Template`].
pub fn template<F>(f: F) -> Template
where
    F: Fn(&Value) -> String + 'static,
{
    Rc::new(f)
}

/// The fallback template: a placeholder string carrying the render data as
/// compact JSON.
pub fn default_template() -> Template {
    template(|data| format!("[View:{{data:{}}}]", data))
}
