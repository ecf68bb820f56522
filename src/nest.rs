//! Child registry
//!
//! A parent [`View`] keeps an ordered list of [`ChildBinding`]s: a child
//! view plus the selector naming its placeholder in the parent's markup and
//! three per-child toggles. The registry order is the attachment order when
//! several children share one placeholder.
//!
//! The three child-facing phases of the render cycle live here too. The
//! detach phase walks the registry in reverse and prepends non-replace
//! children into one off-document fragment per selector, so that consuming a
//! fragment in the attach phase lands the children in forward registration
//! order with a single move.

use hashbrown::HashMap;
use log::debug;

use crate::dom::{Document, NodeKey};
use crate::selector::Selector;
use crate::view::View;
use crate::{CheapString, Error};

/// Registration options for one child view; see [`View::add_view_spec`].
pub struct ChildSpec {
    pub selector: CheapString,
    pub view: View,
    /// Replace the placeholder instead of appending into it.
    pub replace: bool,
    /// Re-render the child on every parent render.
    pub render_enabled: bool,
    /// Re-attach the child on every parent render.
    pub attach_enabled: bool,
}

impl ChildSpec {
    pub fn new<S: Into<CheapString>>(selector: S, view: View) -> Self {
        Self {
            selector: selector.into(),
            view,
            replace: false,
            render_enabled: true,
            attach_enabled: true,
        }
    }

    pub fn replace(mut self, replace: bool) -> Self {
        self.replace = replace;
        self
    }

    pub fn render_enabled(mut self, enabled: bool) -> Self {
        self.render_enabled = enabled;
        self
    }

    pub fn attach_enabled(mut self, enabled: bool) -> Self {
        self.attach_enabled = enabled;
        self
    }
}

/// A registered child. The toggles are plain fields and can be flipped
/// between render cycles; the selector is compiled once and only recompiled
/// through [`ChildBinding::set_selector`].
pub struct ChildBinding {
    selector: CheapString,
    compiled: Selector,
    pub(crate) view: View,
    pub replace: bool,
    pub render_enabled: bool,
    pub attach_enabled: bool,
}

impl ChildBinding {
    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn set_selector<S: Into<CheapString>>(&mut self, selector: S) -> Result<(), Error> {
        let selector = selector.into();
        self.compiled = Selector::parse(&selector)?;
        self.selector = selector;
        Ok(())
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut View {
        &mut self.view
    }
}

impl View {
    /// Registers a child view against a placeholder selector. The child
    /// takes effect on the next [`View::render`]. Fails if the selector does
    /// not compile.
    pub fn add_view<S>(
        &mut self,
        selector: S,
        view: View,
        replace: bool,
    ) -> Result<&mut ChildBinding, Error>
    where
        S: Into<CheapString>,
    {
        self.add_view_spec(ChildSpec::new(selector, view).replace(replace))
    }

    /// Options form of [`View::add_view`].
    pub fn add_view_spec(&mut self, spec: ChildSpec) -> Result<&mut ChildBinding, Error> {
        let compiled = Selector::parse(&spec.selector)?;
        self.children.push(ChildBinding {
            selector: spec.selector,
            compiled,
            view: spec.view,
            replace: spec.replace,
            render_enabled: spec.render_enabled,
            attach_enabled: spec.attach_enabled,
        });
        Ok(self.children.last_mut().unwrap())
    }

    /// Detach phase. Pulls every child element out of the parent's markup
    /// before the markup is regenerated; non-replace children that will
    /// re-attach are queued into one fragment per selector. On a first
    /// render nothing is attached yet, so this only fills the fragments.
    pub(crate) fn detach_views(&self, doc: &mut Document) -> HashMap<CheapString, NodeKey> {
        let mut fragments: HashMap<CheapString, NodeKey> = HashMap::new();
        for binding in self.children.iter().rev() {
            let el = binding.view.el();
            if binding.replace || !binding.attach_enabled {
                doc.detach(el);
                continue;
            }
            let fragment = *fragments
                .entry(binding.selector.clone())
                .or_insert_with(|| doc.create_fragment());
            doc.prepend(fragment, el);
        }
        fragments
    }

    /// Render phase for children: forward registry order, recursive. A child
    /// with `render_enabled == false` keeps its current markup.
    pub(crate) fn render_views(&mut self, doc: &mut Document) -> Result<(), Error> {
        for binding in self.children.iter_mut() {
            if binding.render_enabled {
                binding.view.render(doc, None)?;
            }
        }
        Ok(())
    }

    /// Attach phase: forward registry order. A replace-mode child swaps in
    /// for its placeholder (which is freed); a replace-mode child with an
    /// empty selector never attaches. Non-replace children arrive as one
    /// fragment move per selector; an empty selector targets the parent's
    /// root element. A selector with no match in the fresh markup leaves its
    /// children detached but alive, ready for a later cycle.
    pub(crate) fn attach_views(
        &self,
        doc: &mut Document,
        fragments: &mut HashMap<CheapString, NodeKey>,
    ) {
        for binding in &self.children {
            if !binding.attach_enabled {
                continue;
            }
            if binding.replace {
                if binding.compiled.is_empty() {
                    continue;
                }
                match doc.query_first(self.el(), &binding.compiled) {
                    Some(placeholder) => {
                        // a sibling sharing this selector may already have been
                        // appended inside the placeholder; pull registered child
                        // elements out before the subtree is freed
                        for other in &self.children {
                            let el = other.view.el();
                            if el != binding.view.el() && doc.contains(placeholder, el) {
                                doc.detach(el);
                            }
                        }
                        doc.replace(placeholder, binding.view.el());
                    }
                    None => debug!("no placeholder matches {:?}", binding.selector()),
                }
                continue;
            }
            let Some(fragment) = fragments.remove(&binding.selector) else {
                // a sibling binding already consumed this selector's fragment
                continue;
            };
            let target = match binding.compiled.is_empty() {
                true => Some(self.el()),
                false => doc.query_first(self.el(), &binding.compiled),
            };
            match target {
                Some(target) => doc.append_fragment(target, fragment),
                None => {
                    debug!("no placeholder matches {:?}", binding.selector());
                    doc.dissolve_fragment(fragment);
                }
            }
        }
        for (_, fragment) in fragments.drain() {
            doc.dissolve_fragment(fragment);
        }
    }
}
