use std::cell::RefCell;
use std::rc::{Rc, Weak};

use futures::future::{FutureExt, LocalBoxFuture, Shared};

use crate::domain::entities::dataset::Snapshot;
use crate::usecase::ports::source::{DataSource, FetchError};
use crate::usecase::services::row_transformer::transform_records;

type PendingFetch = Shared<LocalBoxFuture<'static, Result<Snapshot, FetchError>>>;

#[derive(Default)]
struct CacheSlot {
    snapshot: Option<Snapshot>,
    pending: Option<PendingFetch>,
}

/// Memoized full dataset.
///
/// The first caller starts the remote fetch and every caller that arrives
/// while it is in flight awaits the same shared result. A success is kept for
/// the lifetime of the cache; a failure only clears the in-flight marker so
/// the next call retries.
pub struct DatasetCache {
    source: Rc<dyn DataSource>,
    slot: Rc<RefCell<CacheSlot>>,
}

impl DatasetCache {
    pub fn new(source: Rc<dyn DataSource>) -> Self {
        Self {
            source,
            slot: Rc::new(RefCell::new(CacheSlot::default())),
        }
    }

    pub fn cached(&self) -> Option<Snapshot> {
        self.slot.borrow().snapshot.clone()
    }

    pub fn is_fetching(&self) -> bool {
        self.slot.borrow().pending.is_some()
    }

    pub async fn full_dataset(&self) -> Result<Snapshot, FetchError> {
        let pending = {
            let mut slot = self.slot.borrow_mut();
            if let Some(snapshot) = &slot.snapshot {
                return Ok(snapshot.clone());
            }
            match &slot.pending {
                Some(pending) => pending.clone(),
                None => {
                    let pending = self.start_fetch();
                    slot.pending = Some(pending.clone());
                    pending
                }
            }
        };
        pending.await
    }

    fn start_fetch(&self) -> PendingFetch {
        let source = self.source.clone();
        let slot: Weak<RefCell<CacheSlot>> = Rc::downgrade(&self.slot);

        async move {
            tracing::info!("fetching full dataset");
            let outcome = source
                .fetch_records()
                .await
                .map(|records| Snapshot::from(transform_records(&records)));

            if let Some(slot) = slot.upgrade() {
                let mut slot = slot.borrow_mut();
                slot.pending = None;
                match &outcome {
                    Ok(snapshot) => {
                        tracing::info!(rows = snapshot.len(), "dataset cached");
                        slot.snapshot = Some(snapshot.clone());
                    }
                    Err(err) => tracing::warn!(error = %err, "dataset fetch failed"),
                }
            }
            outcome
        }
        .boxed_local()
        .shared()
    }
}
