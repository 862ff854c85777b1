#![allow(dead_code)]

use bus::{EventBus, Notification, Outcome};
use change::{ManualMotion, Page};
use dom::NodeId;
use std::rc::Rc;
use std::sync::mpsc::Receiver;

/// A page wired to an observable bus.
pub struct Fixture {
    pub page: Page,
    pub bus: Rc<EventBus>,
    pub seen: Receiver<Notification>,
}

impl Fixture {
    pub fn new(html: &str) -> Self {
        let bus = Rc::new(EventBus::new());
        let seen = bus.observe();
        let page = Page::builder(html).events(bus.clone()).build();
        Self { page, bus, seen }
    }

    /// Same as [`Fixture::new`] with animations that wait for
    /// [`ManualMotion::finish_all`].
    pub fn animated(html: &str) -> (Self, Rc<ManualMotion>) {
        let bus = Rc::new(EventBus::new());
        let seen = bus.observe();
        let motion = Rc::new(ManualMotion::new());
        let page = Page::builder(html)
            .events(bus.clone())
            .motion(motion.clone())
            .build();
        (Self { page, bus, seen }, motion)
    }

    pub fn find(&self, selector: &str) -> NodeId {
        self.page
            .first(selector)
            .unwrap_or_else(|| panic!("nothing matches {selector}\n{}", self.page.html()))
    }

    pub fn body_html(&self) -> String {
        body_html(&self.page)
    }

    /// Names of everything emitted since the last call.
    pub fn drain(&self) -> Vec<&'static str> {
        self.seen.try_iter().map(|n| n.name()).collect()
    }

    pub fn drain_all(&self) -> Vec<Notification> {
        self.seen.try_iter().collect()
    }

    /// Veto every notification named `name`.
    pub fn veto(&self, name: &'static str) {
        self.bus.on(move |n| {
            if n.name() == name {
                Outcome::Prevented
            } else {
                Outcome::Continue
            }
        });
    }
}

pub fn body_html(page: &Page) -> String {
    let doc = page.document();
    let body = doc.body().expect("page has a body");
    doc.inner_html(body)
}

pub fn text(page: &Page, node: NodeId) -> String {
    page.document().text_content(node)
}

pub fn run<T>(future: futures::future::LocalBoxFuture<'static, T>) -> T {
    futures::executor::block_on(future)
}
