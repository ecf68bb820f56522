//! Base view and the render cycle
//!
//! A [`View`] owns one root element for its whole life. Rendering never
//! recreates that element, it only regenerates the markup inside it; child
//! elements are pulled out beforehand and put back afterwards, so their node
//! keys survive any number of parent renders.
//!
//! The cycle is fixed: undelegate events, detach children (reverse order),
//! render the template into the root, render children (forward order),
//! attach children (forward order), re-delegate events. The child-facing
//! phases live in [`crate::nest`].

use std::rc::Rc;

use serde_json::{Map, Value};

use crate::dom::{Document, NodeKey};
use crate::event::EventBinding;
use crate::nest::{ChildBinding, ChildSpec};
use crate::template::{default_template, Template};
use crate::{cheap_string, CheapString, Error};

/// Initial children: a literal list, or a factory run once at construction.
/// The factory sees the rest of the construction options (its own `children`
/// slot reads as an empty list) and the document the children must be
/// created in.
pub enum ChildSet {
    List(Vec<ChildSpec>),
    Build(fn(&mut Document, &ViewOptions) -> Result<Vec<ChildSpec>, Error>),
}

impl Default for ChildSet {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

/// Construction options for [`View::new`]; start from `Default::default()`.
pub struct ViewOptions {
    pub tag: CheapString,
    pub class_name: Option<CheapString>,
    pub id: Option<CheapString>,
    pub attributes: Vec<(CheapString, String)>,
    pub template: Template,
    /// Fallback render data, used when `render` gets no explicit data.
    pub model: Option<Value>,
    pub events: Vec<EventBinding>,
    pub children: ChildSet,
    /// Runs once, after this view's subtree is deleted by [`View::remove`].
    pub on_remove: Option<Rc<dyn Fn()>>,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            tag: cheap_string("div"),
            class_name: None,
            id: None,
            attributes: Vec::new(),
            template: default_template(),
            model: None,
            events: Vec::new(),
            children: ChildSet::default(),
            on_remove: None,
        }
    }
}

pub struct View {
    el: NodeKey,
    template: Template,
    pub model: Option<Value>,
    events: Vec<EventBinding>,
    pub(crate) children: Vec<ChildBinding>,
    on_remove: Option<Rc<dyn Fn()>>,
}

impl View {
    /// Creates the root element and registers the initial children. The
    /// element stays detached until a parent attaches it or application code
    /// appends it somewhere.
    pub fn new(doc: &mut Document, mut options: ViewOptions) -> Result<Self, Error> {
        let specs = match core::mem::take(&mut options.children) {
            ChildSet::List(specs) => specs,
            ChildSet::Build(build) => build(doc, &options)?,
        };
        let ViewOptions {
            tag,
            class_name,
            id,
            attributes,
            template,
            model,
            events,
            children: _,
            on_remove,
        } = options;
        let el = doc.create_element(tag);
        if let Some(class) = class_name {
            doc.set_attribute(el, "class", class.to_string());
        }
        if let Some(id) = id {
            doc.set_attribute(el, "id", id.to_string());
        }
        for (name, value) in attributes {
            doc.set_attribute(el, name, value);
        }
        let mut view = Self {
            el,
            template,
            model,
            events,
            children: Vec::new(),
            on_remove,
        };
        for spec in specs {
            view.add_view_spec(spec)?;
        }
        Ok(view)
    }

    /// The root element; one key for the view's whole life.
    pub fn el(&self) -> NodeKey {
        self.el
    }

    pub fn bindings(&self) -> &[ChildBinding] {
        &self.children
    }

    pub fn binding_mut(&mut self, index: usize) -> Option<&mut ChildBinding> {
        self.children.get_mut(index)
    }

    pub fn set_template(&mut self, template: Template) {
        self.template = template;
    }

    /// Runs one render cycle. Data resolution: the explicit argument, else
    /// this view's `model`, else `{}`. On an error (bad markup from the
    /// template, or a failing child render) the remaining phases are
    /// skipped; detached children stay alive and the next successful render
    /// re-attaches them.
    pub fn render(&mut self, doc: &mut Document, data: Option<&Value>) -> Result<&mut Self, Error> {
        doc.undelegate(self.el);
        let mut fragments = self.detach_views(doc);
        let data = match data {
            Some(data) => data.clone(),
            None => match &self.model {
                Some(model) => model.clone(),
                None => Value::Object(Map::new()),
            },
        };
        let markup = (self.template)(&data);
        let mut result = doc.set_inner_markup(self.el, &markup);
        if result.is_ok() {
            result = self.render_views(doc);
        }
        if let Err(error) = result {
            for (_, fragment) in fragments.drain() {
                doc.dissolve_fragment(fragment);
            }
            return Err(error);
        }
        self.attach_views(doc, &mut fragments);
        for binding in &self.events {
            doc.delegate(self.el, binding.clone());
        }
        Ok(self)
    }

    /// Removes this view and every registered descendant view: children
    /// first (forward order, recursive), then this view's events and
    /// subtree. The removal hooks fire once each, even if `remove` is called
    /// again.
    pub fn remove(&mut self, doc: &mut Document) {
        for binding in self.children.iter_mut() {
            binding.view.remove(doc);
        }
        self.children.clear();
        doc.undelegate(self.el);
        doc.delete(self.el);
        if let Some(on_remove) = self.on_remove.take() {
            on_remove();
        }
    }
}
