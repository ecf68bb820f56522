//! Full render-cycle scenarios: nesting, toggles, ordering, removal.

use std::cell::Cell;
use std::rc::Rc;

use serde_json::json;

use nestable::{
    template, ChildSet, ChildSpec, Document, Error, EventBinding, EventType, Selector, Template,
    View, ViewOptions,
};

fn counting(markup: &'static str, count: &Rc<Cell<u32>>) -> Template {
    let count = count.clone();
    template(move |_| {
        count.set(count.get() + 1);
        markup.into()
    })
}

fn classed(doc: &mut Document, class: &'static str, tpl: Template) -> View {
    View::new(
        doc,
        ViewOptions {
            class_name: Some(class.into()),
            template: tpl,
            ..Default::default()
        },
    )
    .unwrap()
}

fn removal_hook(count: &Rc<Cell<u32>>) -> Option<Rc<dyn Fn()>> {
    let count = count.clone();
    Some(Rc::new(move || count.set(count.get() + 1)))
}

#[test]
fn renders_the_default_template() {
    let mut doc = Document::new();
    let mut view = View::new(&mut doc, ViewOptions::default()).unwrap();
    view.render(&mut doc, None).unwrap();
    assert_eq!(doc.outer_html(view.el()), "<div>[View:{data:{}}]</div>");

    // explicit data and a bound model serialize the same way
    view.render(&mut doc, Some(&json!({"abc": "xyz"}))).unwrap();
    assert_eq!(doc.inner_html(view.el()), r#"[View:{data:{"abc":"xyz"}}]"#);
    view.model = Some(json!({"abc": "xyz"}));
    view.render(&mut doc, None).unwrap();
    assert_eq!(doc.inner_html(view.el()), r#"[View:{data:{"abc":"xyz"}}]"#);
}

#[test]
fn data_resolution_prefers_the_argument_over_the_model() {
    let mut doc = Document::new();
    let mut view = View::new(
        &mut doc,
        ViewOptions {
            template: template(|data| format!("n={}", data["n"])),
            model: Some(json!({"n": 1})),
            ..Default::default()
        },
    )
    .unwrap();
    view.render(&mut doc, None).unwrap();
    assert_eq!(doc.inner_html(view.el()), "n=1");
    view.render(&mut doc, Some(&json!({"n": 2}))).unwrap();
    assert_eq!(doc.inner_html(view.el()), "n=2");
    // the explicit data is not sticky
    view.render(&mut doc, None).unwrap();
    assert_eq!(doc.inner_html(view.el()), "n=1");
}

#[test]
fn a_child_attaches_into_its_placeholder() {
    let mut doc = Document::new();
    let inner = classed(&mut doc, "inner", template(|_| "inner content".into()));
    let mut outer = classed(
        &mut doc,
        "outer",
        template(|_| r#"<div class="nest"></div>"#.into()),
    );
    outer.add_view(".nest", inner, false).unwrap();
    outer.render(&mut doc, None).unwrap();
    assert_eq!(
        doc.outer_html(outer.el()),
        r#"<div class="outer"><div class="nest"><div class="inner">inner content</div></div></div>"#,
    );
}

#[test]
fn replace_mode_swaps_the_placeholder_out() {
    let mut doc = Document::new();
    let inner = classed(&mut doc, "inner", template(|_| "inner content".into()));
    let mut outer = classed(
        &mut doc,
        "outer",
        template(|_| r#"<div class="nest"></div>"#.into()),
    );
    outer.add_view(".nest", inner, true).unwrap();
    for _ in 0..2 {
        outer.render(&mut doc, None).unwrap();
        assert_eq!(
            doc.outer_html(outer.el()),
            r#"<div class="outer"><div class="inner">inner content</div></div>"#,
        );
    }
    let nest = Selector::parse(".nest").unwrap();
    assert!(doc.query_first(outer.el(), &nest).is_none());
}

#[test]
fn child_elements_keep_their_identity_across_re_renders() {
    let mut doc = Document::new();
    let inner = classed(&mut doc, "inner", template(|_| "inner content".into()));
    let mut outer = classed(
        &mut doc,
        "outer",
        template(|_| r#"<div class="nest"></div>"#.into()),
    );
    outer.add_view(".nest", inner, false).unwrap();
    outer.render(&mut doc, None).unwrap();
    let el = outer.bindings()[0].view().el();
    for _ in 0..3 {
        outer.render(&mut doc, None).unwrap();
    }
    assert!(doc.alive(el));
    assert_eq!(outer.bindings()[0].view().el(), el);
    // attached under the freshly rendered placeholder
    assert_eq!(doc.parent(el).and_then(|nest| doc.parent(nest)), Some(outer.el()));
}

#[test]
fn children_sharing_a_selector_attach_in_registration_order() {
    let mut doc = Document::new();
    let first = classed(&mut doc, "first", template(|_| "1".into()));
    let second = classed(&mut doc, "second", template(|_| "2".into()));
    let mut outer = classed(
        &mut doc,
        "outer",
        template(|_| r#"<div class="nest"></div>"#.into()),
    );
    outer.add_view(".nest", first, false).unwrap();
    outer.add_view(".nest", second, false).unwrap();
    for _ in 0..2 {
        outer.render(&mut doc, None).unwrap();
        assert_eq!(
            doc.inner_html(outer.el()),
            r#"<div class="nest"><div class="first">1</div><div class="second">2</div></div>"#,
        );
    }
}

#[test]
fn a_replace_binding_spares_siblings_sharing_its_selector() {
    let mut doc = Document::new();
    let appended = classed(&mut doc, "appended", template(|_| "a".into()));
    let swapped = classed(&mut doc, "swapped", template(|_| "s".into()));
    let mut outer = classed(
        &mut doc,
        "outer",
        template(|_| r#"<div class="x"></div>"#.into()),
    );
    outer.add_view(".x", appended, false).unwrap();
    outer.add_view(".x", swapped, true).unwrap();
    outer.render(&mut doc, None).unwrap();

    // the appended sibling landed inside the placeholder the swap then freed;
    // it must come out alive, detached, its key intact
    let appended_el = outer.bindings()[0].view().el();
    assert!(doc.alive(appended_el));
    assert_eq!(doc.parent(appended_el), None);
    assert_eq!(doc.inner_html(outer.el()), r#"<div class="swapped">s</div>"#);

    // and later cycles keep working
    outer.render(&mut doc, None).unwrap();
    assert!(doc.alive(appended_el));
    assert_eq!(outer.bindings()[0].view().el(), appended_el);
    assert_eq!(doc.inner_html(outer.el()), r#"<div class="swapped">s</div>"#);
}

#[test]
fn nesting_recurses_through_grandchildren() {
    let mut doc = Document::new();
    let leaf = classed(&mut doc, "leaf", template(|_| "leaf".into()));
    let mut mid = classed(
        &mut doc,
        "mid",
        template(|_| r#"<div class="deep"></div>"#.into()),
    );
    mid.add_view(".deep", leaf, false).unwrap();
    let mut outer = classed(
        &mut doc,
        "outer",
        template(|_| r#"<div class="nest"></div>"#.into()),
    );
    outer.add_view(".nest", mid, false).unwrap();
    outer.render(&mut doc, None).unwrap();
    assert_eq!(
        doc.outer_html(outer.el()),
        "<div class=\"outer\"><div class=\"nest\"><div class=\"mid\">\
         <div class=\"deep\"><div class=\"leaf\">leaf</div></div>\
         </div></div></div>",
    );
}

#[test]
fn remove_propagates_through_the_whole_tree() {
    let count = Rc::new(Cell::new(0));
    let mut doc = Document::new();
    let leaf = View::new(
        &mut doc,
        ViewOptions {
            on_remove: removal_hook(&count),
            ..Default::default()
        },
    )
    .unwrap();
    let mut mid = View::new(
        &mut doc,
        ViewOptions {
            template: template(|_| r#"<div class="deep"></div>"#.into()),
            on_remove: removal_hook(&count),
            ..Default::default()
        },
    )
    .unwrap();
    mid.add_view(".deep", leaf, false).unwrap();
    let mut outer = View::new(
        &mut doc,
        ViewOptions {
            template: template(|_| r#"<div class="nest"></div>"#.into()),
            on_remove: removal_hook(&count),
            ..Default::default()
        },
    )
    .unwrap();
    outer.add_view(".nest", mid, false).unwrap();
    outer.render(&mut doc, None).unwrap();

    let outer_el = outer.el();
    let mid_el = outer.bindings()[0].view().el();
    let leaf_el = outer.bindings()[0].view().bindings()[0].view().el();
    outer.remove(&mut doc);
    assert_eq!(count.get(), 3);
    assert!(!doc.alive(outer_el));
    assert!(!doc.alive(mid_el));
    assert!(!doc.alive(leaf_el));

    // a second remove is a no-op, the hooks do not re-fire
    outer.remove(&mut doc);
    assert_eq!(count.get(), 3);
}

#[test]
fn render_enabled_false_keeps_the_childs_markup() {
    let count = Rc::new(Cell::new(0));
    let mut doc = Document::new();
    let child = classed(&mut doc, "inner", counting("fresh", &count));
    let mut outer = classed(
        &mut doc,
        "outer",
        template(|_| r#"<div class="nest"></div>"#.into()),
    );
    outer.add_view(".nest", child, false).unwrap();
    outer.binding_mut(0).unwrap().render_enabled = false;
    outer.render(&mut doc, None).unwrap();
    // attached, but never rendered: the element is still empty
    assert_eq!(
        doc.inner_html(outer.el()),
        r#"<div class="nest"><div class="inner"></div></div>"#,
    );
    assert_eq!(count.get(), 0);

    outer.binding_mut(0).unwrap().render_enabled = true;
    outer.render(&mut doc, None).unwrap();
    assert_eq!(
        doc.inner_html(outer.el()),
        r#"<div class="nest"><div class="inner">fresh</div></div>"#,
    );
    assert_eq!(count.get(), 1);
}

#[test]
fn attach_enabled_false_leaves_the_placeholder_but_still_renders() {
    let count = Rc::new(Cell::new(0));
    let mut doc = Document::new();
    let child = classed(&mut doc, "inner", counting("fresh", &count));
    let mut outer = classed(
        &mut doc,
        "outer",
        template(|_| r#"<div class="nest"></div>"#.into()),
    );
    let binding = outer.add_view(".nest", child, true).unwrap();
    binding.attach_enabled = false;
    outer.render(&mut doc, None).unwrap();
    assert_eq!(doc.inner_html(outer.el()), r#"<div class="nest"></div>"#);
    assert_eq!(count.get(), 1);
    let child_el = outer.bindings()[0].view().el();
    assert!(doc.alive(child_el));
    assert_eq!(doc.parent(child_el), None);
}

#[test]
fn attach_enabled_false_detaches_a_previously_attached_child() {
    let removed = Rc::new(Cell::new(0));
    let mut doc = Document::new();
    let child = View::new(
        &mut doc,
        ViewOptions {
            class_name: Some("inner".into()),
            template: template(|_| "inner content".into()),
            on_remove: removal_hook(&removed),
            ..Default::default()
        },
    )
    .unwrap();
    let mut outer = classed(
        &mut doc,
        "outer",
        template(|_| r#"<div class="nest"></div>"#.into()),
    );
    outer.add_view(".nest", child, false).unwrap();
    outer.render(&mut doc, None).unwrap();
    let child_el = outer.bindings()[0].view().el();
    assert_eq!(doc.parent(child_el).and_then(|nest| doc.parent(nest)), Some(outer.el()));

    outer.binding_mut(0).unwrap().attach_enabled = false;
    outer.render(&mut doc, None).unwrap();
    assert_eq!(doc.inner_html(outer.el()), r#"<div class="nest"></div>"#);
    assert!(doc.alive(child_el));
    assert_eq!(doc.parent(child_el), None);
    assert_eq!(removed.get(), 0);
}

#[test]
fn a_detached_child_re_attaches_once_enabled_again() {
    let mut doc = Document::new();
    let child = classed(&mut doc, "inner", template(|_| "inner content".into()));
    let mut outer = classed(
        &mut doc,
        "outer",
        template(|_| r#"<div class="nest"></div>"#.into()),
    );
    outer.add_view(".nest", child, false).unwrap();
    outer.binding_mut(0).unwrap().attach_enabled = false;
    outer.render(&mut doc, None).unwrap();
    assert_eq!(doc.inner_html(outer.el()), r#"<div class="nest"></div>"#);

    outer.binding_mut(0).unwrap().attach_enabled = true;
    outer.render(&mut doc, None).unwrap();
    assert_eq!(
        doc.inner_html(outer.el()),
        r#"<div class="nest"><div class="inner">inner content</div></div>"#,
    );
}

#[test]
fn an_unmatched_selector_skips_attachment() {
    let mut doc = Document::new();
    let child = classed(&mut doc, "inner", template(|_| "inner content".into()));
    let mut outer = classed(
        &mut doc,
        "outer",
        template(|_| r#"<div class="nest"></div>"#.into()),
    );
    outer.add_view(".missing", child, false).unwrap();
    outer.render(&mut doc, None).unwrap();
    assert_eq!(doc.inner_html(outer.el()), r#"<div class="nest"></div>"#);
    let child_el = outer.bindings()[0].view().el();
    assert!(doc.alive(child_el));
    assert_eq!(doc.parent(child_el), None);
}

#[test]
fn an_empty_selector_targets_the_root_element() {
    let mut doc = Document::new();
    let child = classed(&mut doc, "inner", template(|_| "inner content".into()));
    let mut outer = classed(&mut doc, "outer", template(|_| "text".into()));
    outer.add_view("", child, false).unwrap();
    outer.render(&mut doc, None).unwrap();
    assert_eq!(
        doc.inner_html(outer.el()),
        r#"text<div class="inner">inner content</div>"#,
    );
}

#[test]
fn replace_with_an_empty_selector_never_attaches() {
    let count = Rc::new(Cell::new(0));
    let mut doc = Document::new();
    let child = classed(&mut doc, "inner", counting("fresh", &count));
    let mut outer = classed(&mut doc, "outer", template(|_| "text".into()));
    outer.add_view("", child, true).unwrap();
    outer.render(&mut doc, None).unwrap();
    assert_eq!(doc.outer_html(outer.el()), r#"<div class="outer">text</div>"#);
    assert_eq!(count.get(), 1);
    assert_eq!(doc.parent(outer.bindings()[0].view().el()), None);
}

#[test]
fn delegated_events_survive_re_renders() {
    let count = Rc::new(Cell::new(0));
    let handler = {
        let count = count.clone();
        move |_| {
            count.set(count.get() + 1);
            false
        }
    };
    let mut doc = Document::new();
    let mut view = View::new(
        &mut doc,
        ViewOptions {
            template: template(|_| r#"<button class="go"></button>"#.into()),
            events: vec![EventBinding::new(EventType::CLICK, ".go", handler).unwrap()],
            ..Default::default()
        },
    )
    .unwrap();
    view.render(&mut doc, None).unwrap();
    let go = Selector::parse(".go").unwrap();
    let button = doc.query_first(view.el(), &go).unwrap();
    doc.trigger(button, EventType::CLICK);

    view.render(&mut doc, None).unwrap();
    let button = doc.query_first(view.el(), &go).unwrap();
    doc.trigger(button, EventType::CLICK);
    assert_eq!(count.get(), 2);
}

#[test]
fn bad_markup_from_a_template_aborts_the_cycle() {
    let mut doc = Document::new();
    let child = classed(&mut doc, "inner", template(|_| "inner content".into()));
    let mut outer = classed(&mut doc, "outer", template(|_| "<p>".into()));
    outer.add_view(".nest", child, false).unwrap();
    assert!(outer.render(&mut doc, None).is_err());
    // the child survives the failed cycle
    assert!(doc.alive(outer.bindings()[0].view().el()));
}

#[test]
fn a_child_set_factory_runs_at_construction() {
    fn build(doc: &mut Document, options: &ViewOptions) -> Result<Vec<ChildSpec>, Error> {
        let label = options
            .model
            .as_ref()
            .and_then(|model| model["label"].as_str())
            .unwrap_or("?")
            .to_string();
        let inner = View::new(
            doc,
            ViewOptions {
                class_name: Some("inner".into()),
                template: template(move |_| label.clone()),
                ..Default::default()
            },
        )?;
        Ok(vec![ChildSpec::new(".nest", inner)])
    }

    let mut doc = Document::new();
    let mut outer = View::new(
        &mut doc,
        ViewOptions {
            template: template(|_| r#"<div class="nest"></div>"#.into()),
            model: Some(json!({"label": "built"})),
            children: ChildSet::Build(build),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(outer.bindings().len(), 1);
    outer.render(&mut doc, None).unwrap();
    assert_eq!(
        doc.inner_html(outer.el()),
        r#"<div class="nest"><div class="inner">built</div></div>"#,
    );
}

#[test]
fn registering_with_a_bad_selector_fails() {
    let mut doc = Document::new();
    let child = View::new(&mut doc, ViewOptions::default()).unwrap();
    let mut outer = View::new(&mut doc, ViewOptions::default()).unwrap();
    assert!(outer.add_view("div > p", child, false).is_err());
    assert_eq!(outer.bindings().len(), 0);
}

#[test]
fn set_selector_retargets_on_the_next_cycle() {
    let mut doc = Document::new();
    let child = classed(&mut doc, "inner", template(|_| "inner content".into()));
    let mut outer = classed(
        &mut doc,
        "outer",
        template(|_| r#"<div class="a"></div><div class="b"></div>"#.into()),
    );
    outer.add_view(".a", child, false).unwrap();
    outer.render(&mut doc, None).unwrap();
    assert_eq!(
        doc.inner_html(outer.el()),
        r#"<div class="a"><div class="inner">inner content</div></div><div class="b"></div>"#,
    );

    outer.binding_mut(0).unwrap().set_selector(".b").unwrap();
    outer.render(&mut doc, None).unwrap();
    assert_eq!(
        doc.inner_html(outer.el()),
        r#"<div class="a"></div><div class="b"><div class="inner">inner content</div></div>"#,
    );
}
