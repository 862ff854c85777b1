mod common;

use change::{Behaviors, ChangeError, Effect, Page, RenderOptions, Step, resolve_nesting, set_scroll_and_focus_options};
use common::{Fixture, run, text};
use core_types::{LayerId, LayerMode, Placement};
use dom::{Document, NodeId, ScrollOffset};
use focus::{FocusOption, ScrollOption};
use layer::LayerRef;
use serde_json::json;
use std::cell::Cell;
use std::rc::Rc;

fn step_for(doc: &Document, selector: &str) -> Step {
    let list = css::SelectorList::parse(selector).unwrap();
    let old = css::query_first(doc, doc.root(), &list).unwrap();
    Step {
        selector: selector.to_string(),
        placement: Placement::Replace,
        old,
        new: None,
        maybe: false,
        layer: LayerId::ROOT,
        origin: None,
        transition: Effect::none(),
        scroll: ScrollOption::Target,
        focus: FocusOption::Target,
        keep: true,
        hungry: false,
    }
}

fn open(page: &Page, html: &str) -> LayerId {
    let result = page
        .render(RenderOptions::overlay(LayerMode::Modal, html))
        .unwrap();
    result.layer
}

#[test]
fn nesting_keeps_the_outer_step_in_any_order() {
    let doc = Document::parse("<div class=outer><div class=inner></div></div>");
    for order in [[".outer", ".inner"], [".inner", ".outer"]] {
        let steps = order.iter().map(|s| step_for(&doc, s)).collect();
        let resolved = resolve_nesting(&doc, steps);
        assert_eq!(resolved.len(), 1, "order {order:?}");
        assert_eq!(resolved[0].selector, ".outer");
    }
}

#[test]
fn stack_stays_ordered_across_opens_and_closes() {
    let fixture = Fixture::new("<main>root</main>");
    let page = &fixture.page;
    let check = |expected: usize| {
        let stack = page.stack();
        assert_eq!(stack.count(), expected);
        stack.check_invariants().unwrap();
        let ids: Vec<LayerId> = stack.iter().map(|l| l.id()).collect();
        for (i, pair) in ids.windows(2).enumerate() {
            assert_eq!(stack.parent_of(pair[1]), Some(pair[0]), "parent of index {}", i + 1);
        }
        assert_eq!(stack.iter().filter(|l| stack.parent_of(l.id()).is_none()).count(), 1);
    };

    let a = open(page, "<div class=a>a</div>");
    check(2);
    let b = open(page, "<div class=b>b</div>");
    check(3);
    run(page.accept(b, json!(null)).unwrap()).unwrap();
    check(2);
    let c = open(page, "<div class=c>c</div>");
    check(3);
    assert!(c > b, "ids are never reused");
    run(page.dismiss(a, json!(null)).unwrap()).unwrap();
    check(1);
    assert!(!page.stack().is_open(c));
}

#[test]
fn keep_preserves_node_identity_and_scroll() {
    let fixture = Fixture::new("<main><div id=player sp-keep>playing</div><p>old</p></main>");
    let player = fixture.find("#player");
    fixture
        .page
        .document_mut()
        .set_scroll(player, ScrollOffset { top: 40.0, left: 0.0 });

    let result = fixture
        .page
        .render(RenderOptions::new(
            "main",
            "<main><div id=player sp-keep>fresh</div><p>new</p></main>",
        ))
        .unwrap();

    assert_eq!(fixture.find("#player"), player);
    assert_eq!(result.kept, vec![player]);
    assert_eq!(text(&fixture.page, player), "playing");
    assert_eq!(fixture.page.document().scroll(player).top, 40.0);
    assert_eq!(
        fixture.body_html(),
        r#"<main><div id="player" sp-keep>playing</div><p>new</p></main>"#
    );
    run(result.finished).unwrap();
}

#[test]
fn only_the_first_step_moves_focus() {
    let doc = Document::parse("<p class=a></p><p class=b></p><p class=c></p>");
    let mut steps: Vec<Step> = [".a", ".b", ".c"].iter().map(|s| step_for(&doc, s)).collect();
    set_scroll_and_focus_options(&mut steps);
    assert_eq!(steps[0].focus, FocusOption::Target);
    assert_eq!(steps[0].scroll, ScrollOption::Target);
    assert!(steps[1..].iter().all(|s| s.focus.is_false() && s.scroll.is_false()));

    let page = Page::parse("<p class=a>1</p><p class=b>2</p>");
    let result = page
        .render(RenderOptions {
            focus: FocusOption::Target,
            ..RenderOptions::new(".a, .b", "<p class=a>3</p><p class=b>4</p>")
        })
        .unwrap();
    assert_eq!(result.fragments.len(), 2);
    assert_eq!(page.document().active_element(), Some(result.fragments[0]));
}

#[test]
fn closing_a_layer_aborts_its_pending_update() {
    let (fixture, motion) = Fixture::animated("<main>root</main>");
    let page = &fixture.page;
    let opened = page
        .render(RenderOptions::overlay(LayerMode::Modal, "<div class=dialog>one</div>"))
        .unwrap();
    let layer = opened.layer;

    let update = page
        .render(RenderOptions {
            layer: LayerRef::Id(layer),
            transition: Effect::new("cross-fade", 100),
            ..RenderOptions::new(".dialog", "<div class=dialog>two</div>")
        })
        .unwrap();
    let closing = page.dismiss(layer, json!("gone")).unwrap();
    assert_eq!(page.stack().count(), 1);

    motion.finish_all();
    assert!(matches!(run(update.finished), Err(ChangeError::Aborted { .. })));
    run(closing).unwrap();
    assert!(matches!(run(opened.finished), Err(ChangeError::Aborted { .. })));
    assert_eq!(page.first("sp-modal"), None);
}

#[test]
fn peel_leaves_the_layer_in_front() {
    let fixture = Fixture::new("<main>root</main>");
    let page = &fixture.page;
    let a = open(page, "<div>a</div>");
    let b = open(page, "<div>b</div>");
    let c = open(page, "<div>c</div>");
    fixture.drain();

    run(page.peel(a).unwrap()).unwrap();

    let stack = page.stack();
    assert!(stack.descendants_of(a).is_empty());
    assert_eq!(stack.front().id(), a);
    let dismissed: Vec<LayerId> = fixture
        .drain_all()
        .into_iter()
        .filter_map(|n| match n {
            bus::Notification::LayerDismissed {
                layer,
                target: bus::Target::Document,
                ..
            } => Some(layer),
            _ => None,
        })
        .collect();
    assert_eq!(dismissed, vec![c, b]);
}

#[test]
fn contained_target_resolves_to_the_container() {
    let page = Page::parse("<div class=a><div class=b>old b</div></div>");
    let result = page
        .render(RenderOptions::new(
            ".a, .b",
            "<div class=a><div class=b>new b</div></div>",
        ))
        .unwrap();
    assert_eq!(result.fragments.len(), 1);
    assert_eq!(page.document().attr(result.fragments[0], "class"), Some("a"));
    assert_eq!(
        common::body_html(&page),
        r#"<div class="a"><div class="b">new b</div></div>"#
    );
}

#[test]
fn accepting_a_modal_shrinks_the_stack_before_the_animation() {
    let (fixture, motion) = Fixture::animated("<main>root</main>");
    let page = &fixture.page;
    let accepted = Rc::new(Cell::new(None));
    let seen = Rc::clone(&accepted);
    let opened = page
        .render(RenderOptions {
            on_accepted: Some(Rc::new(move |value: &serde_json::Value| {
                seen.set(value.as_i64());
            })),
            ..RenderOptions::overlay(LayerMode::Modal, "<div class=dialog>hi</div>")
        })
        .unwrap();
    let overlay: NodeId = fixture.find("sp-modal");
    motion.finish_all();
    run(opened.finished).unwrap();

    let closing = page.accept(opened.layer, json!(42)).unwrap();
    assert_eq!(page.stack().count(), 1);
    assert_eq!(accepted.get(), Some(42));
    assert!(page.document().is_connected(overlay), "detached only after the animation");
    assert_eq!(motion.pending(), 1);

    motion.finish_all();
    run(closing).unwrap();
    assert!(!page.document().is_connected(overlay));
}

#[test]
fn self_kept_element_is_not_torn_down() {
    let behaviors = Rc::new(Behaviors::new());
    let destroyed = Rc::new(Cell::new(0));
    let counter = Rc::clone(&destroyed);
    behaviors.compiler("#clock".parse().unwrap(), move |_, _, _| {
        let counter = Rc::clone(&counter);
        Some(Box::new(move || {
            counter.set(counter.get() + 1);
            Ok(())
        }))
    });
    let page = Page::builder(r#"<div id=clock sp-keep="&">12:00</div>"#)
        .behaviors(behaviors.clone())
        .build();
    page.boot();
    let clock = page.first("#clock").unwrap();

    let result = page
        .render(RenderOptions::new(
            "#clock",
            r#"<div id=clock sp-keep="&">12:01</div>"#,
        ))
        .unwrap();

    assert_eq!(result.kept, vec![clock]);
    assert_eq!(page.first("#clock"), Some(clock));
    assert_eq!(text(&page, clock), "12:00");
    assert_eq!(destroyed.get(), 0);
    assert_eq!(behaviors.destructor_count(), 1);
    run(result.finished).unwrap();
}
