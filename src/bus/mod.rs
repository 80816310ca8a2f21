//! Typed publish/subscribe registry shared by all views.
//!
//! Dispatch is synchronous and single-threaded. Handlers for a topic run in
//! registration order over a snapshot of the subscriber list taken when
//! `publish` starts, so subscribing or unsubscribing from inside a handler
//! takes effect on the next publish.
//!
//! Feedback loops are refused rather than recursed into:
//! - a topic cannot be published while its own dispatch is in progress
//! - nested dispatch deeper than `max_dispatch_depth` is rejected
//!
//! Handler panics are not caught; the remaining handlers of that publish do
//! not run.

mod topic;

pub use topic::{
    CountrySelected, CountrySelection, DataUpdate, ParallelCoordinatesFilter, RegionHover,
    RegionSelected, RegionSelection, Topic, YearRangeTopic, YearRangeUpdate, TOPIC_NAMES,
};

use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::dataset::RecordSet;
use crate::error::{Error, Result};

/// Default bound on nested dispatch.
pub const DEFAULT_MAX_DISPATCH_DEPTH: usize = 8;

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Handler<P> = Rc<RefCell<dyn FnMut(&P)>>;
type Subscribers<P> = Vec<(SubscriptionId, Handler<P>)>;

struct BusInner {
    topics: RefCell<HashMap<TypeId, Box<dyn Any>>>,
    active: RefCell<Vec<&'static str>>,
    next_id: Cell<u64>,
    max_depth: usize,
    published: Cell<u64>,
}

/// Pops the active-topic stack when a dispatch ends, including on unwind.
struct DispatchGuard<'a> {
    active: &'a RefCell<Vec<&'static str>>,
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.active.borrow_mut().pop();
    }
}

/// Cheaply clonable handle to one shared bus.
#[derive(Clone)]
pub struct EventBus {
    inner: Rc<BusInner>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("topics", &self.inner.topics.borrow().len())
            .field("active", &self.inner.active.borrow())
            .field("max_depth", &self.inner.max_depth)
            .finish()
    }
}

impl EventBus {
    /// Creates a bus with the default dispatch depth.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DISPATCH_DEPTH)
    }

    /// Creates a bus that rejects dispatch nested deeper than `max_depth`.
    #[must_use]
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            inner: Rc::new(BusInner {
                topics: RefCell::new(HashMap::new()),
                active: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
                max_depth: max_depth.max(1),
                published: Cell::new(0),
            }),
        }
    }

    /// Registers `handler` for topic `T`.
    pub fn subscribe<T, F>(&self, handler: F) -> SubscriptionId
    where
        T: Topic,
        F: FnMut(&T::Payload) + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);

        let handler: Handler<T::Payload> = Rc::new(RefCell::new(handler));
        let mut topics = self.inner.topics.borrow_mut();
        let slot = topics
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Subscribers::<T::Payload>::new()) as Box<dyn Any>);
        if let Some(subs) = slot.downcast_mut::<Subscribers<T::Payload>>() {
            subs.push((id, handler));
        }
        crate::trace!("bus", "subscribe {} #{}", T::NAME, id.0);
        id
    }

    /// Removes a subscription. Returns false if `id` was not registered on `T`.
    pub fn unsubscribe<T: Topic>(&self, id: SubscriptionId) -> bool {
        let mut topics = self.inner.topics.borrow_mut();
        let Some(subs) = topics
            .get_mut(&TypeId::of::<T>())
            .and_then(|slot| slot.downcast_mut::<Subscribers<T::Payload>>())
        else {
            return false;
        };
        let before = subs.len();
        subs.retain(|(sid, _)| *sid != id);
        let removed = subs.len() != before;
        if removed {
            crate::trace!("bus", "unsubscribe {} #{}", T::NAME, id.0);
        }
        removed
    }

    /// Number of handlers registered on `T`.
    #[must_use]
    pub fn subscriber_count<T: Topic>(&self) -> usize {
        self.inner
            .topics
            .borrow()
            .get(&TypeId::of::<T>())
            .and_then(|slot| slot.downcast_ref::<Subscribers<T::Payload>>())
            .map_or(0, Vec::len)
    }

    /// Delivers `payload` to every handler of `T` and returns how many ran.
    ///
    /// Publishing to a topic with no subscribers is a no-op returning `Ok(0)`.
    ///
    /// # Errors
    ///
    /// [`Error::ReentrantPublish`] if `T` is already being dispatched, and
    /// [`Error::DispatchDepthExceeded`] if nesting would exceed the bound.
    pub fn publish<T: Topic>(&self, payload: &T::Payload) -> Result<usize> {
        {
            let active = self.inner.active.borrow();
            if active.contains(&T::NAME) {
                crate::warn!("bus", "refused re-entrant publish on {}", T::NAME);
                return Err(Error::ReentrantPublish { topic: T::NAME });
            }
            if active.len() >= self.inner.max_depth {
                crate::warn!(
                    "bus",
                    "refused publish on {} at depth {}",
                    T::NAME,
                    active.len()
                );
                return Err(Error::DispatchDepthExceeded {
                    topic: T::NAME,
                    depth: self.inner.max_depth,
                });
            }
        }

        let snapshot: Vec<Handler<T::Payload>> = self
            .inner
            .topics
            .borrow()
            .get(&TypeId::of::<T>())
            .and_then(|slot| slot.downcast_ref::<Subscribers<T::Payload>>())
            .map(|subs| subs.iter().map(|(_, h)| Rc::clone(h)).collect())
            .unwrap_or_default();

        self.inner.published.set(self.inner.published.get() + 1);
        if snapshot.is_empty() {
            return Ok(0);
        }

        self.inner.active.borrow_mut().push(T::NAME);
        let _guard = DispatchGuard {
            active: &self.inner.active,
        };
        crate::trace!("bus", "publish {} -> {} handlers", T::NAME, snapshot.len());

        for handler in &snapshot {
            (&mut *handler.borrow_mut())(payload);
        }
        Ok(snapshot.len())
    }

    /// Delivers a record set on both record-set topics: `dataUpdate` first,
    /// then `parallelCoordinatesFilter`.
    pub fn publish_all(&self, records: &RecordSet) -> Result<usize> {
        let data = self.publish::<DataUpdate>(records)?;
        let brushed = self.publish::<ParallelCoordinatesFilter>(records)?;
        Ok(data + brushed)
    }

    /// Current nesting depth (0 outside any handler).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.inner.active.borrow().len()
    }

    /// Maximum nesting depth.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.inner.max_depth
    }

    /// Total publish calls that passed the re-entrancy checks.
    #[must_use]
    pub fn publish_count(&self) -> u64 {
        self.inner.published.get()
    }
}

/// Holds the first error raised by a group of handlers that cannot return
/// one to the bus.
///
/// Handlers sharing a latch check [`FailureLatch::is_set`] first and skip
/// their work once an earlier handler failed. The publisher takes the error
/// after `publish` returns.
#[derive(Debug)]
pub struct FailureLatch<E> {
    slot: Rc<RefCell<Option<E>>>,
}

impl<E> Clone for FailureLatch<E> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<E> Default for FailureLatch<E> {
    fn default() -> Self {
        Self {
            slot: Rc::new(RefCell::new(None)),
        }
    }
}

impl<E> FailureLatch<E> {
    /// Empty latch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `err` unless an earlier error is held. Returns whether it was
    /// stored.
    pub fn record(&self, err: E) -> bool {
        let mut slot = self.slot.borrow_mut();
        if slot.is_some() {
            return false;
        }
        *slot = Some(err);
        true
    }

    /// True while an error is held.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.slot.borrow().is_some()
    }

    /// Removes and returns the held error, re-arming the latch.
    pub fn take(&self) -> Option<E> {
        self.slot.borrow_mut().take()
    }
}
