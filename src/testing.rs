//! Fake data sources shared by the unit and scenario tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use futures::future::{FutureExt, LocalBoxFuture};
use serde_json::{json, Value};

use crate::usecase::ports::source::{DataSource, FetchError};

type Records = Result<Vec<Value>, FetchError>;

/// Returns `Pending` once and wakes itself, so concurrent callers interleave.
struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// Answers each fetch with the next queued response after one yield.
pub struct QueuedSource {
    calls: Cell<usize>,
    responses: RefCell<VecDeque<Records>>,
}

impl QueuedSource {
    pub fn new(responses: Vec<Records>) -> Rc<Self> {
        Rc::new(Self {
            calls: Cell::new(0),
            responses: RefCell::new(responses.into()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl DataSource for QueuedSource {
    fn fetch_records(&self) -> LocalBoxFuture<'_, Result<Vec<Value>, FetchError>> {
        self.calls.set(self.calls.get() + 1);
        let response = self
            .responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::Network("no response queued".to_string())));
        async move {
            YieldOnce(false).await;
            response
        }
        .boxed_local()
    }
}

/// Holds every fetch open until the test releases it.
pub struct GatedSource {
    calls: Cell<usize>,
    gates: RefCell<VecDeque<oneshot::Sender<Records>>>,
}

impl GatedSource {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            calls: Cell::new(0),
            gates: RefCell::new(VecDeque::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    /// Completes the oldest open fetch.
    pub fn release(&self, response: Records) {
        let gate = self
            .gates
            .borrow_mut()
            .pop_front()
            .expect("a fetch should be waiting");
        gate.send(response).expect("fetch should still be waiting");
    }
}

impl DataSource for GatedSource {
    fn fetch_records(&self) -> LocalBoxFuture<'_, Result<Vec<Value>, FetchError>> {
        self.calls.set(self.calls.get() + 1);
        let (sender, receiver) = oneshot::channel();
        self.gates.borrow_mut().push_back(sender);
        async move {
            receiver
                .await
                .unwrap_or_else(|_| Err(FetchError::Network("gate dropped".to_string())))
        }
        .boxed_local()
    }
}

/// `count` raw records with distinct ids and a handful of repeating states.
pub fn sample_records(count: usize) -> Vec<Value> {
    const STATES: [&str; 3] = ["active", "pause", "served"];
    const CITIES: [&str; 4] = ["Austin", "Toledo", "Orange", "Fairfield"];
    (0..count)
        .map(|idx| {
            json!({
                "id": format!("u{idx:03}"),
                "first_name": format!("First{idx}"),
                "last_name": "Tester",
                "city": CITIES[idx % CITIES.len()],
                "state": STATES[idx % STATES.len()],
                "score": (idx * 7) % 11,
            })
        })
        .collect()
}
