//! Distinct-state subject
//!
//! Holds the current state of one stream and fans it out to observers,
//! but only when a pushed state actually differs from the held one.
//!
//! # Delivery
//!
//! - `subscribe` registers the observer and hands it the held state before
//!   returning.
//! - `next` notifies every registered observer, in registration order,
//!   before returning. There is no queue and no background task.
//! - No lock is held while an observer runs. An observer may call `next`
//!   on the same subject: the nested state is delivered immediately and
//!   becomes the held state, after which the outer fan-out resumes with its
//!   own (now older) state for the observers it had not reached yet.
//!   Nothing bounds that recursion; an observer that always pushes a new
//!   state will not terminate.
//!
//! Producers racing on one subject must be serialized by the caller.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use strand_core::{StreamId, StreamState};
use tracing::{debug, trace};

use crate::{states_equal, CommitLogEquality, StateEquality};

/// Observer callback
pub type Observer = Arc<dyn Fn(&Arc<StreamState>) + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Subject counters
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubjectStats {
    /// States passed to `next`
    pub offered: u64,
    /// States that replaced the held one
    pub emitted: u64,
    /// States dropped as equal to the held one
    pub suppressed: u64,
}

/// Change-gated holder of a stream's current state
pub struct StreamStateSubject<E = CommitLogEquality> {
    current: Mutex<Arc<StreamState>>,
    /// Ordered by id, which is also registration order
    observers: Mutex<Vec<(SubscriptionId, Observer)>>,
    next_id: AtomicU64,
    stats: Mutex<SubjectStats>,
    oracle: E,
}

impl StreamStateSubject<CommitLogEquality> {
    /// Create a subject holding `initial`. There is no empty subject: every
    /// stream has at least its genesis commit.
    pub fn new(initial: impl Into<Arc<StreamState>>) -> Self {
        Self::with_equality(initial, CommitLogEquality)
    }
}

impl<E: StateEquality> StreamStateSubject<E> {
    /// Create a subject that compares states with `oracle`
    pub fn with_equality(initial: impl Into<Arc<StreamState>>, oracle: E) -> Self {
        StreamStateSubject {
            current: Mutex::new(initial.into()),
            observers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
            stats: Mutex::new(SubjectStats::default()),
            oracle,
        }
    }

    /// The held state
    pub fn value(&self) -> Arc<StreamState> {
        self.current.lock().clone()
    }

    pub fn stream_id(&self) -> StreamId {
        self.current.lock().stream_id()
    }

    /// Register `observer` and deliver the held state to it immediately.
    /// It then sees every later change until unsubscribed.
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&Arc<StreamState>) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let observer: Observer = Arc::new(observer);
        self.observers.lock().push((id, observer.clone()));

        let current = self.value();
        trace!(stream = %current.stream_id(), subscription = id.0, "subscribed");
        observer(&current);
        id
    }

    /// Remove a subscription. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.lock();
        match observers.binary_search_by_key(&id, |(sid, _)| *sid) {
            Ok(pos) => {
                observers.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    /// Offer a candidate state. If it differs from the held state it is
    /// stored and delivered to every observer; otherwise nothing happens.
    /// Returns whether the held state changed.
    pub fn next(&self, candidate: impl Into<Arc<StreamState>>) -> bool {
        let candidate = candidate.into();

        // The oracle runs unlocked; swap only if the held state is still the
        // one it was compared against
        let mut held = self.value();
        loop {
            if states_equal(&self.oracle, &held, &candidate) {
                let mut stats = self.stats.lock();
                stats.offered += 1;
                stats.suppressed += 1;
                trace!(stream = %candidate.stream_id(), "state unchanged");
                return false;
            }

            let mut current = self.current.lock();
            if Arc::ptr_eq(&current, &held) {
                *current = candidate.clone();
                break;
            }
            held = current.clone();
        }

        {
            let mut stats = self.stats.lock();
            stats.offered += 1;
            stats.emitted += 1;
        }

        let ids: Vec<SubscriptionId> = self.observers.lock().iter().map(|(id, _)| *id).collect();
        debug!(
            stream = %candidate.stream_id(),
            tip = %candidate.tip().cid,
            log_len = candidate.len(),
            subscribers = ids.len(),
            "state changed"
        );

        for id in ids {
            // Looked up per call so an observer removed mid fan-out is skipped
            if let Some(observer) = self.observer(id) {
                observer(&candidate);
            }
        }

        true
    }

    pub fn subscriber_count(&self) -> usize {
        self.observers.lock().len()
    }

    pub fn stats(&self) -> SubjectStats {
        self.stats.lock().clone()
    }

    fn observer(&self, id: SubscriptionId) -> Option<Observer> {
        let observers = self.observers.lock();
        observers
            .binary_search_by_key(&id, |(sid, _)| *sid)
            .ok()
            .map(|pos| observers[pos].1.clone())
    }
}

impl<E> fmt::Debug for StreamStateSubject<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let current = self.current.lock().clone();
        f.debug_struct("StreamStateSubject")
            .field("stream", &current.stream_id())
            .field("log_len", &current.len())
            .field("subscribers", &self.observers.lock().len())
            .finish()
    }
}
