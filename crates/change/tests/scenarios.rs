mod common;

use bus::{EventBus, Notification};
use change::{ChangeError, Page, RenderOptions, parse_placement};
use common::run;
use core_types::LayerMode;
use focus::{FocusOption, ScrollOption};
use layer::{GetOptions, LayerRef};
use scenario_support::{Action, CloseSpec, Expectation, RenderSpec, Scenario, diff_lines, html_lines};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::mpsc::Receiver;

fn scenario_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/scenarios")
}

fn error_kind(err: &ChangeError) -> &'static str {
    match err {
        ChangeError::CannotMatch { .. } => "cannot_match",
        ChangeError::Aborted { .. } => "aborted",
        ChangeError::Vetoed { .. } => "vetoed",
        ChangeError::HookFailed(_) => "hook_failed",
        ChangeError::Selector(_) => "selector",
        ChangeError::LayerNotOpen(_) => "layer_not_open",
        ChangeError::Layer(_) => "layer",
        ChangeError::Dom(_) => "dom",
    }
}

fn render_options(page: &Page, spec: &RenderSpec, name: &str) -> RenderOptions {
    let mut options = RenderOptions {
        target: spec.target.clone(),
        fallback: spec.fallback.clone(),
        html: spec.html.clone(),
        keep: spec.keep,
        hungry: spec.hungry,
        location: spec.location.clone(),
        title: spec.title.clone(),
        ..RenderOptions::default()
    };
    if let Some(layer) = &spec.layer {
        options.layer = LayerRef::parse(layer)
            .unwrap_or_else(|err| panic!("[{name}] bad layer `{layer}`: {err}"));
    }
    if let Some(mode) = &spec.mode {
        options.mode = mode.parse::<LayerMode>().unwrap_or_default();
    }
    if let Some(placement) = &spec.placement {
        options.placement = parse_placement(placement)
            .unwrap_or_else(|err| panic!("[{name}] bad placement: {err}"));
    }
    if let Some(origin) = &spec.origin {
        options.origin = Some(
            page.first(origin)
                .unwrap_or_else(|| panic!("[{name}] origin {origin} not found")),
        );
    }
    if let Some(focus) = &spec.focus {
        options.focus = FocusOption::parse(focus);
    }
    if let Some(scroll) = &spec.scroll {
        options.scroll = ScrollOption::parse(scroll);
    }
    options
}

fn close(page: &Page, spec: &CloseSpec, accept: bool, name: &str) {
    let reference = LayerRef::parse(spec.layer.as_deref().unwrap_or("front"))
        .unwrap_or_else(|err| panic!("[{name}] bad layer: {err}"));
    let layer = {
        let doc = page.document();
        page.stack()
            .get(&doc, &reference, GetOptions::default())
            .unwrap_or_else(|| panic!("[{name}] no layer matches {reference:?}"))
    };
    let closing = if accept {
        page.accept(layer, spec.value.clone())
    } else {
        page.dismiss(layer, spec.value.clone())
    };
    let closing = closing.unwrap_or_else(|err| panic!("[{name}] closing {layer} failed: {err}"));
    run(closing).unwrap_or_else(|err| panic!("[{name}] {layer} did not close cleanly: {err}"));
}

fn apply(page: &Page, action: &Action, name: &str) {
    match action {
        Action::Render(spec) => {
            let options = render_options(page, spec, name);
            match (page.render(options), &spec.error) {
                (Ok(result), None) => {
                    if let Err(err) = run(result.finished) {
                        assert!(err.is_uncritical(), "[{name}] render did not finish: {err}");
                    }
                }
                (Ok(result), Some(kind)) => {
                    panic!("[{name}] expected {kind}, but rendered {:?}", result.fragments)
                }
                (Err(err), Some(kind)) => {
                    assert_eq!(error_kind(&err), kind, "[{name}] wrong error: {err}")
                }
                (Err(err), None) => panic!("[{name}] render failed: {err}"),
            }
        }
        Action::Accept(spec) => close(page, spec, true, name),
        Action::Dismiss(spec) => close(page, spec, false, name),
    }
}

fn check(page: &Page, seen: &Receiver<Notification>, expect: &Expectation, path: &Path, name: &str) {
    if let Some(body) = &expect.body {
        let actual = {
            let doc = page.document();
            let body = doc.body().expect("page has a body");
            html_lines(&doc.inner_html(body))
        };
        let expected = html_lines(body);
        if actual != expected {
            panic!(
                "[{name}] body mismatch ({})\n{}",
                path.display(),
                diff_lines(&expected, &actual)
            );
        }
    }
    if let Some(count) = expect.layer_count {
        assert_eq!(page.stack().count(), count, "[{name}] layer count");
    }
    if let Some(location) = &expect.location {
        assert_eq!(page.history().location(), Some(location.as_str()), "[{name}] location");
    }
    if let Some(focused) = &expect.focused {
        let target = page.first(focused);
        assert!(target.is_some(), "[{name}] {focused} not found");
        assert_eq!(page.document().active_element(), target, "[{name}] focus");
    }
    for selector in &expect.present {
        assert!(page.first(selector).is_some(), "[{name}] {selector} is missing");
    }
    for selector in &expect.absent {
        assert!(page.first(selector).is_none(), "[{name}] {selector} is still present");
    }
    if let Some(names) = &expect.notifications {
        let actual: Vec<&str> = seen.try_iter().map(|n| n.name()).collect();
        assert_eq!(&actual, names, "[{name}] notifications");
    }
}

fn run_scenario(path: &Path, scenario: &Scenario) {
    let bus = Rc::new(EventBus::new());
    let seen = bus.observe();
    let mut builder = Page::builder(scenario.page.as_str()).events(bus);
    if let Some(location) = &scenario.location {
        builder = builder.location(location.as_str());
    }
    let page = builder.build();
    page.boot();
    if let Some(selector) = &scenario.focus {
        let element = page
            .first(selector)
            .unwrap_or_else(|| panic!("[{}] cannot focus {selector}", scenario.name));
        page.document_mut().focus(element);
    }
    for action in &scenario.actions {
        apply(&page, action, &scenario.name);
    }
    check(&page, &seen, &scenario.expect, path, &scenario.name);
    page.stack().check_invariants().unwrap();
}

#[test]
fn scenario_manifests() {
    let scenarios = scenario_support::load_dir(&scenario_root());
    for (path, scenario) in &scenarios {
        run_scenario(path, scenario);
    }
}
