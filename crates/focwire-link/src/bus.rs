use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Why a [`Subscription`] produced no item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RecvError {
    /// The stream completed; no further items will arrive.
    #[error("stream closed")]
    Closed,

    #[error("timed out waiting for an item")]
    Timeout,
}

type Filter<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

struct Subscriber<T> {
    filter: Filter<T>,
    tx: Sender<T>,
    /// Shared with the [`Subscription`]; sole owner means it was dropped.
    token: Arc<()>,
}

impl<T> Subscriber<T> {
    fn is_alive(&self) -> bool {
        Arc::strong_count(&self.token) > 1
    }
}

struct State<T> {
    subscribers: Vec<Subscriber<T>>,
    closed: bool,
}

/// Fan-out of items to any number of filtered subscribers.
///
/// Every subscriber owns an unbounded channel, so [`publish`](Self::publish)
/// never waits on a slow consumer. Dropped subscriptions are pruned on the
/// next publish or subscribe, whether or not their filter matches.
pub struct Broadcast<T> {
    state: Mutex<State<T>>,
}

/// Receiving end of one [`Broadcast`] subscription.
#[derive(Debug)]
pub struct Subscription<T> {
    rx: Receiver<T>,
    _token: Arc<()>,
}

impl<T: Clone> Broadcast<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                subscribers: Vec::new(),
                closed: false,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe to items accepted by `filter`.
    ///
    /// Subscribing to a closed broadcast yields an already completed
    /// subscription.
    pub fn subscribe<F>(&self, filter: F) -> Subscription<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let token = Arc::new(());
        let mut state = self.state();
        state.subscribers.retain(Subscriber::is_alive);
        if !state.closed {
            state.subscribers.push(Subscriber {
                filter: Box::new(filter),
                tx,
                token: Arc::clone(&token),
            });
        }
        Subscription { rx, _token: token }
    }

    pub fn subscribe_all(&self) -> Subscription<T> {
        self.subscribe(|_| true)
    }

    /// Deliver `item` to every matching subscriber. Returns how many
    /// subscribers received it.
    pub fn publish(&self, item: &T) -> usize {
        let mut state = self.state();
        let mut delivered = 0;
        state.subscribers.retain(|sub| {
            if !sub.is_alive() {
                return false;
            }
            if !(sub.filter)(item) {
                return true;
            }
            match sub.tx.send(item.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => false,
            }
        });
        delivered
    }

    /// Complete the stream for every current subscriber.
    pub fn close(&self) {
        let mut state = self.state();
        state.closed = true;
        state.subscribers.clear();
    }

    /// Accept subscribers again after [`close`](Self::close).
    pub fn reopen(&self) {
        self.state().closed = false;
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    pub fn subscriber_count(&self) -> usize {
        self.state().subscribers.len()
    }
}

impl<T: Clone> Default for Broadcast<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Broadcast<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Broadcast")
            .field("subscribers", &state.subscribers.len())
            .field("closed", &state.closed)
            .finish()
    }
}

impl<T> Subscription<T> {
    /// Block until the next item or end of stream.
    pub fn recv(&self) -> Result<T, RecvError> {
        self.rx.recv().map_err(|_| RecvError::Closed)
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvError> {
        self.rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => RecvError::Timeout,
            RecvTimeoutError::Disconnected => RecvError::Closed,
        })
    }

    /// Next buffered item, `Ok(None)` if none is queued yet.
    pub fn try_recv(&self) -> Result<Option<T>, RecvError> {
        match self.rx.try_recv() {
            Ok(item) => Ok(Some(item)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(RecvError::Closed),
        }
    }

    /// Blocking iterator that ends with the stream.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.rx.iter()
    }
}
