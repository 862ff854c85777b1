//! The motion collaborator: animations and morphs.
//!
//! A morph replaces one element with another and calls four hooks at fixed
//! points. Without an animation the order is
//! `before_start`, `before_detach`, swap, `after_insert`, `after_detach`.
//! With an animation both elements are attached while it plays:
//! `before_start`, insert, `after_insert`, animation, `before_detach`,
//! detach, `after_detach`.

use dom::{Document, NodeId};
use futures::FutureExt;
use futures::future::{self, LocalBoxFuture};
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

pub type SharedDocument = Rc<RefCell<Document>>;

pub type Hook = Box<dyn FnOnce()>;

/// An animation or transition by name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Effect {
    pub name: String,
    /// Milliseconds.
    pub duration: u32,
}

impl Effect {
    pub fn none() -> Self {
        Self {
            name: "none".to_string(),
            duration: 0,
        }
    }

    pub fn new(name: impl Into<String>, duration: u32) -> Self {
        Self {
            name: name.into(),
            duration,
        }
    }

    pub fn is_none(&self) -> bool {
        self.name == "none" || self.name.is_empty() || self.duration == 0
    }
}

impl Default for Effect {
    fn default() -> Self {
        Self::none()
    }
}

/// Everything a motion needs to replace `old` with `new`.
pub struct MorphPlan {
    pub old: NodeId,
    pub new: NodeId,
    pub effect: Effect,
    /// `old` is about to go. Runs before anything moves.
    pub before_start: Hook,
    /// `new` is attached.
    pub after_insert: Hook,
    /// `old` is still attached and about to be detached.
    pub before_detach: Hook,
    /// `old` is detached.
    pub after_detach: Hook,
}

/// Second half of an animated morph.
pub struct MorphExit {
    old: NodeId,
    before_detach: Hook,
    after_detach: Hook,
}

impl MorphPlan {
    /// Swap without animation.
    pub fn swap_directly(self, doc: &SharedDocument) {
        let MorphPlan {
            old,
            new,
            before_start,
            after_insert,
            before_detach,
            after_detach,
            ..
        } = self;
        before_start();
        before_detach();
        let replaced = doc.borrow_mut().replace_with(old, new);
        if let Err(err) = replaced {
            log::warn!(target: "splice.update", "could not swap {old} for {new}: {err}");
        }
        after_insert();
        after_detach();
    }

    /// Attach `new` next to `old` so both are visible while animating.
    pub fn swap_in(self, doc: &SharedDocument) -> MorphExit {
        let MorphPlan {
            old,
            new,
            before_start,
            after_insert,
            before_detach,
            after_detach,
            ..
        } = self;
        before_start();
        {
            let mut doc = doc.borrow_mut();
            let inserted = match doc.parent(old) {
                Some(parent) => doc.insert_before(parent, new, Some(old)),
                None => Err(dom::DomError::Detached(old)),
            };
            if let Err(err) = inserted {
                log::warn!(target: "splice.update", "could not insert {new}: {err}");
            }
        }
        after_insert();
        MorphExit {
            old,
            before_detach,
            after_detach,
        }
    }
}

impl MorphExit {
    pub fn swap_out(self, doc: &SharedDocument) {
        (self.before_detach)();
        doc.borrow_mut().detach(self.old);
        (self.after_detach)();
    }
}

/// Plays animations. Implementations decide how long things take; the
/// engine only relies on the hook order.
pub trait Motion {
    fn animate(
        &self,
        doc: &SharedDocument,
        element: NodeId,
        effect: &Effect,
    ) -> LocalBoxFuture<'static, ()>;

    fn morph(&self, doc: &SharedDocument, plan: MorphPlan) -> LocalBoxFuture<'static, ()>;
}

/// Finishes every animation immediately.
#[derive(Clone, Copy, Debug, Default)]
pub struct InstantMotion;

impl Motion for InstantMotion {
    fn animate(&self, _: &SharedDocument, _: NodeId, _: &Effect) -> LocalBoxFuture<'static, ()> {
        future::ready(()).boxed_local()
    }

    fn morph(&self, doc: &SharedDocument, plan: MorphPlan) -> LocalBoxFuture<'static, ()> {
        plan.swap_directly(doc);
        future::ready(()).boxed_local()
    }
}

/// Poll `fut` once right away so work behind already-finished animations
/// happens synchronously, and hand back whatever is left.
pub(crate) fn settle<F>(fut: F) -> LocalBoxFuture<'static, F::Output>
where
    F: Future + 'static,
{
    let mut fut = fut.boxed_local();
    match (&mut fut).now_or_never() {
        Some(output) => future::ready(output).boxed_local(),
        None => fut,
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use manual::ManualMotion;

#[cfg(any(test, feature = "test-support"))]
mod manual {
    use super::*;
    use futures::channel::oneshot;

    /// Motion double whose animations run until [`ManualMotion::finish_all`].
    /// Effects that are [`Effect::is_none`] finish immediately.
    #[derive(Default)]
    pub struct ManualMotion {
        pending: RefCell<Vec<oneshot::Sender<()>>>,
        played: RefCell<Vec<(NodeId, String)>>,
    }

    impl ManualMotion {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn pending(&self) -> usize {
            self.pending.borrow().len()
        }

        /// Elements and effect names in the order they started.
        pub fn played(&self) -> Vec<(NodeId, String)> {
            self.played.borrow().clone()
        }

        /// Release every running animation. Returns how many were running.
        pub fn finish_all(&self) -> usize {
            let pending: Vec<_> = self.pending.borrow_mut().drain(..).collect();
            let count = pending.len();
            for tx in pending {
                let _ = tx.send(());
            }
            count
        }

        fn hold(&self, element: NodeId, effect: &Effect) -> LocalBoxFuture<'static, ()> {
            self.played.borrow_mut().push((element, effect.name.clone()));
            let (tx, rx) = oneshot::channel();
            self.pending.borrow_mut().push(tx);
            async move {
                let _ = rx.await;
            }
            .boxed_local()
        }
    }

    impl Motion for ManualMotion {
        fn animate(
            &self,
            _: &SharedDocument,
            element: NodeId,
            effect: &Effect,
        ) -> LocalBoxFuture<'static, ()> {
            if effect.is_none() {
                return future::ready(()).boxed_local();
            }
            self.hold(element, effect)
        }

        fn morph(&self, doc: &SharedDocument, plan: MorphPlan) -> LocalBoxFuture<'static, ()> {
            if plan.effect.is_none() {
                plan.swap_directly(doc);
                return future::ready(()).boxed_local();
            }
            let wait = self.hold(plan.new, &plan.effect);
            let exit = plan.swap_in(doc);
            let doc = Rc::clone(doc);
            async move {
                wait.await;
                exit.swap_out(&doc);
            }
            .boxed_local()
        }
    }
}
