mod common;

use change::{ChangeError, Page, RenderOptions};
use common::{Fixture, run};
use core_types::{LayerId, LayerMode};
use layer::{LayerError, LayerOptions, LayerRef};
use serde_json::{Value, json};
use std::cell::RefCell;
use std::rc::Rc;

fn open_with(page: &Page, options: RenderOptions) -> LayerId {
    let result = page.render(options).unwrap();
    run(result.finished).unwrap();
    result.layer
}

#[test]
fn overlay_markup_depends_on_the_mode() {
    let page = Page::parse("<main>root</main>");
    let modal = open_with(&page, RenderOptions::overlay(LayerMode::Modal, "<div class=m>m</div>"));
    let popup = open_with(&page, RenderOptions::overlay(LayerMode::Popup, "<div class=p>p</div>"));

    let doc = page.document();
    let stack = page.stack();
    let modal_element = stack.layer(modal).unwrap().element;
    let popup_element = stack.layer(popup).unwrap().element;
    assert_eq!(doc.tag_name(modal_element), Some("sp-modal"));
    assert_eq!(doc.attr(modal_element, "sp-mode"), Some("modal"));
    assert_eq!(doc.attr(popup_element, "sp-position"), Some("bottom"));
    assert_eq!(
        doc.inner_html(stack.layer(modal).unwrap().content),
        r#"<div class="m">m</div>"#
    );
    let has_dismiss = |element| {
        doc.descendants(element)
            .any(|n| doc.has_attr(n, "sp-dismiss"))
    };
    assert!(has_dismiss(modal_element));
    assert!(!has_dismiss(popup_element), "popups are not dismissable by button");
    assert!(doc.contains(doc.body().unwrap(), popup_element));
}

#[test]
fn open_emits_and_focuses_in_order() {
    let fixture = Fixture::new("<main>root</main>");
    let result = fixture
        .page
        .render(RenderOptions::overlay(
            LayerMode::Drawer,
            "<form><input name=q autofocus></form>",
        ))
        .unwrap();
    assert_eq!(
        fixture.drain(),
        vec!["layer:open", "fragment:inserted", "layer:opened"]
    );
    let input = fixture.find("sp-drawer input");
    assert_eq!(fixture.page.document().active_element(), Some(input));
    assert_eq!(fixture.page.stack().front().id(), result.layer);
}

#[test]
fn overlay_without_autofocus_focuses_its_box() {
    let page = Page::parse("<main>root</main>");
    open_with(&page, RenderOptions::overlay(LayerMode::Modal, "<p>hello</p>"));
    let frame = page.first("sp-modal-box").unwrap();
    assert_eq!(page.document().active_element(), Some(frame));
}

#[test]
fn swapping_the_body_closes_the_overlays_inside_it() {
    let page = Page::parse("<main>root</main>");
    let layer = open_with(&page, RenderOptions::overlay(LayerMode::Modal, "<p>x</p>"));
    let overlay = page.stack().layer(layer).unwrap().element;

    let result = page
        .render(RenderOptions {
            layer: LayerRef::Root,
            ..RenderOptions::new("body", "<body><main>fresh</main></body>")
        })
        .unwrap();
    run(result.finished).unwrap();

    let stack = page.stack();
    assert_eq!(stack.count(), 1);
    assert!(!stack.is_open(layer));
    stack.check_invariants().unwrap();
    assert!(!page.document().is_connected(overlay));
    assert_eq!(common::body_html(&page), "<main>fresh</main>");
}

#[test]
fn vetoed_open_and_close_change_nothing() {
    let fixture = Fixture::new("<main>root</main>");
    let layer = open_with(&fixture.page, RenderOptions::overlay(LayerMode::Modal, "<p>x</p>"));

    fixture.veto("layer:dismiss");
    let err = fixture
        .page
        .dismiss(layer, Value::Null)
        .err()
        .expect("a vetoed dismiss is refused");
    assert!(matches!(err, ChangeError::Vetoed { notification: "layer:dismiss" }));
    assert!(fixture.page.stack().is_open(layer));

    fixture.veto("layer:open");
    let err = fixture
        .page
        .render(RenderOptions::overlay(LayerMode::Modal, "<p>y</p>"))
        .unwrap_err();
    assert!(matches!(err, ChangeError::Vetoed { .. }));
    assert_eq!(fixture.page.stack().count(), 2);
}

#[test]
fn root_cannot_close_and_closed_layers_stay_closed() {
    let page = Page::parse("<main>root</main>");
    assert!(matches!(
        page.accept(LayerId::ROOT, Value::Null),
        Err(ChangeError::Layer(LayerError::RootNotClosable))
    ));
    let layer = open_with(&page, RenderOptions::overlay(LayerMode::Modal, "<p>x</p>"));
    run(page.dismiss(layer, Value::Null).unwrap()).unwrap();
    assert!(matches!(
        page.dismiss(layer, Value::Null),
        Err(ChangeError::LayerNotOpen(id)) if id == layer
    ));
}

#[test]
fn reaching_the_accept_location_closes_the_overlay() {
    let page = Page::parse("<main>root</main>");
    let accepted = Rc::new(RefCell::new(None));
    let seen = Rc::clone(&accepted);
    let layer = open_with(
        &page,
        RenderOptions {
            layer_options: LayerOptions {
                accept_location: Some("/items/:id".into()),
                ..LayerOptions::default()
            },
            on_accepted: Some(Rc::new(move |value: &Value| {
                *seen.borrow_mut() = Some(value.clone());
            })),
            ..RenderOptions::overlay(LayerMode::Modal, "<div class=form>new item</div>")
        },
    );

    let result = page
        .render(RenderOptions {
            layer: LayerRef::Id(layer),
            location: Some("/items/7".into()),
            ..RenderOptions::new(".form", "<div class=form>saved</div>")
        })
        .unwrap();
    assert_eq!(page.stack().count(), 1);
    assert_eq!(*accepted.borrow(), Some(json!({"id": "7"})));
    assert!(matches!(run(result.finished), Err(ChangeError::Aborted { .. })));
}

#[test]
fn closing_restores_the_parent_location() {
    let page = Page::builder("<main>root</main>").location("/home").build();
    let layer = open_with(
        &page,
        RenderOptions {
            location: Some("/dialog".into()),
            ..RenderOptions::overlay(LayerMode::Modal, "<p>dialog</p>")
        },
    );
    assert_eq!(page.history().location(), Some("/dialog"));
    run(page.dismiss(layer, Value::Null).unwrap()).unwrap();
    assert_eq!(page.history().location(), Some("/home"));
}

#[test]
fn popups_leave_history_alone() {
    let page = Page::builder("<main>root</main>").location("/home").build();
    open_with(
        &page,
        RenderOptions {
            location: Some("/menu".into()),
            ..RenderOptions::overlay(LayerMode::Popup, "<p>menu</p>")
        },
    );
    assert_eq!(page.history().location(), Some("/home"));
}

#[test]
fn focus_returns_to_the_origin() {
    let page = Page::parse("<main><button id=open>open</button></main>");
    let button = page.first("#open").unwrap();
    page.document_mut().focus(button);
    let layer = open_with(
        &page,
        RenderOptions {
            origin: Some(button),
            ..RenderOptions::overlay(LayerMode::Modal, "<p>x</p>")
        },
    );
    assert_ne!(page.document().active_element(), Some(button));
    run(page.dismiss(layer, Value::Null).unwrap()).unwrap();
    assert_eq!(page.document().active_element(), Some(button));
}

#[test]
fn opening_over_a_base_layer_peels_its_children() {
    let page = Page::parse("<main>root</main>");
    let first = open_with(&page, RenderOptions::overlay(LayerMode::Modal, "<p>1</p>"));
    let second = open_with(
        &page,
        RenderOptions {
            base_layer: Some(LayerId::ROOT),
            ..RenderOptions::overlay(LayerMode::Drawer, "<p>2</p>")
        },
    );
    let stack = page.stack();
    assert!(!stack.is_open(first));
    assert_eq!(stack.count(), 2);
    assert_eq!(stack.parent_of(second), Some(LayerId::ROOT));
}

#[test]
fn targets_resolve_in_the_requested_layer() {
    let page = Page::parse("<main>root</main>");
    let layer = open_with(&page, RenderOptions::overlay(LayerMode::Modal, "<main>overlay</main>"));

    let front = page
        .render(RenderOptions::new("main", "<main>overlay 2</main>"))
        .unwrap();
    assert_eq!(front.layer, layer);

    let root = page
        .render(RenderOptions {
            layer: LayerRef::Root,
            ..RenderOptions::new("main", "<main>root 2</main>")
        })
        .unwrap();
    assert_eq!(root.layer, LayerId::ROOT);

    let doc = page.document();
    let contents: Vec<String> = doc
        .descendants(doc.root())
        .filter(|&n| doc.tag_name(n) == Some("main"))
        .map(|n| doc.text_content(n))
        .collect();
    assert_eq!(contents, vec!["root 2", "overlay 2"]);
}

#[test]
fn layer_listeners_are_dropped_on_close() {
    let fixture = Fixture::new("<main>root</main>");
    let layer = open_with(&fixture.page, RenderOptions::overlay(LayerMode::Modal, "<p>x</p>"));
    fixture
        .bus
        .on_layer(layer, |_| bus::Outcome::Continue);
    assert_eq!(fixture.bus.listener_count(), 1);
    run(fixture.page.accept(layer, Value::Null).unwrap()).unwrap();
    assert_eq!(fixture.bus.listener_count(), 0);
}
