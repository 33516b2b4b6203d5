use std::{cell::RefCell, future::Future, rc::Rc};

use futures::{
    FutureExt,
    future::{LocalBoxFuture, Shared},
};

use crate::services::ServiceError;

type SharedFetch<T> = Shared<LocalBoxFuture<'static, Result<Rc<T>, ServiceError>>>;

struct FlightState<T> {
    /// Incremented whenever `pending` is dropped, so that readers of a dropped fetch leave its
    /// replacement alone.
    generation: u64,
    pending: Option<SharedFetch<T>>,
}

/// Lazily fetched value shared by all readers.
///
/// The first reader starts the fetch, later readers wait for that same fetch. A successful
/// result is kept until [SingleFlight::invalidate]. A failed result is handed to every reader
/// that was waiting for it, then dropped so that the next reader fetches again.
pub struct SingleFlight<T> {
    state: RefCell<FlightState<T>>,
}

impl<T> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            state: RefCell::new(FlightState {
                generation: 0,
                pending: None,
            }),
        }
    }
}

impl<T: 'static> SingleFlight<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value, calling `fetch` only if no fetch is kept or pending.
    pub async fn get<F, Fut>(&self, fetch: F) -> Result<Rc<T>, ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>> + 'static,
    {
        let (generation, shared) = {
            let mut state = self.state.borrow_mut();
            let shared = match &state.pending {
                Some(shared) => shared.clone(),
                None => {
                    let shared = fetch().map(|result| result.map(Rc::new)).boxed_local().shared();
                    state.pending = Some(shared.clone());
                    shared
                }
            };
            (state.generation, shared)
        };

        let result = shared.await;
        if result.is_err() {
            let mut state = self.state.borrow_mut();
            if state.generation == generation {
                state.pending = None;
                state.generation += 1;
            }
        }
        result
    }

    /// The kept value, if a fetch has completed successfully.
    pub fn peek(&self) -> Option<Rc<T>> {
        let state = self.state.borrow();
        match state.pending.as_ref().and_then(Shared::peek) {
            Some(Ok(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// Drops the kept value or pending fetch. The next reader fetches again; readers already
    /// waiting still get the dropped fetch's result.
    pub fn invalidate(&self) {
        let mut state = self.state.borrow_mut();
        state.pending = None;
        state.generation += 1;
    }
}
