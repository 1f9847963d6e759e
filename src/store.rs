//! Generic data fetching store used by the search UI. It wraps an async
//! fetch operation and tracks the request lifecycle so a presentation layer
//! can render progress and failures without owning the request itself.

use std::cell::{Ref, RefCell};
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};

/// Whether a load is currently in flight.
///
/// There is deliberately no loaded or failed status: a completed load always
/// returns to `Idle` and its outcome is recorded in the store's `error` and
/// `data` fields instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Loading,
}

/// Failure of a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// the transport failed before a response arrived
    Fetch(String),
    /// the response did not match the expected shape
    Parse(String),
    /// the service answered with an error payload of its own
    Service(String),
    /// a failure which carried no message
    Unknown,
}

impl LoadError {
    /// Failures carrying no message are replaced by `Unknown` before they
    /// are stored, so a rendered `error` always says something.
    fn normalised(self) -> Self {
        if self.to_string().is_empty() {
            Self::Unknown
        } else {
            self
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(message) | Self::Parse(message) | Self::Service(message) => {
                f.write_str(message)
            }
            Self::Unknown => f.write_str("Something went wrong. Please try again later."),
        }
    }
}

impl Error for LoadError {}

impl From<serde_json::Error> for LoadError {
    fn from(error: serde_json::Error) -> Self {
        Self::Parse(error.to_string())
    }
}

struct State<T> {
    status: Status,
    error: Option<LoadError>,
    data: Option<T>,
}

impl<T> Default for State<T> {
    fn default() -> Self {
        Self {
            status: Status::Idle,
            error: None,
            data: None,
        }
    }
}

/// A cloneable handle on one logical data source. Created once per source
/// (destinations, flights) and cloned wherever its state is observed or a
/// load is triggered.
///
/// `error` and `data` reflect the most recently *completed* load, never the
/// in-flight one; `data` stays visible while a newer load is running.
/// Overlapping loads are not de-duplicated or cancelled, each call fetches
/// and the last one to settle determines what the store shows.
pub struct AsyncStore<T, P = ()> {
    state: Rc<RefCell<State<T>>>,
    fetcher: Rc<dyn Fn(P) -> LocalBoxFuture<'static, Result<T, LoadError>>>,
}

impl<T, P> Clone for AsyncStore<T, P> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
            fetcher: Rc::clone(&self.fetcher),
        }
    }
}

impl<T: Clone + 'static, P: 'static> AsyncStore<T, P> {
    pub fn new<F, Fut>(fetcher: F) -> Self
    where
        F: Fn(P) -> Fut + 'static,
        Fut: Future<Output = Result<T, LoadError>> + 'static,
    {
        Self {
            state: Rc::new(RefCell::new(State::default())),
            fetcher: Rc::new(move |input| fetcher(input).boxed_local()),
        }
    }

    /// Run the wrapped fetch operation with `input`.
    ///
    /// The store shows `Loading` for as long as the fetch is unsettled, the
    /// previous error is cleared up front. On success the resolved value
    /// becomes `data`; on failure the error is recorded and handed back
    /// unchanged, so callers which do not await can still observe it through
    /// [`AsyncStore::error`].
    pub async fn load_with(&self, input: P) -> Result<T, LoadError> {
        {
            let mut state = self.state.borrow_mut();
            state.status = Status::Loading;
            state.error = None;
        }
        let result = (self.fetcher)(input).await;
        let mut state = self.state.borrow_mut();
        state.status = Status::Idle;
        match result {
            Ok(value) => {
                state.data = Some(value.clone());
                Ok(value)
            }
            Err(error) => {
                state.error = Some(error.clone().normalised());
                Err(error)
            }
        }
    }

    pub fn status(&self) -> Status {
        self.state.borrow().status
    }

    pub fn error(&self) -> Option<LoadError> {
        self.state.borrow().error.clone()
    }

    /// The last successfully loaded value, borrowed from the store.
    pub fn data(&self) -> Option<Ref<'_, T>> {
        Ref::filter_map(self.state.borrow(), |state| state.data.as_ref()).ok()
    }

    pub fn has_data(&self) -> bool {
        self.state.borrow().data.is_some()
    }
}

impl<T: Clone + 'static> AsyncStore<T> {
    /// [`AsyncStore::load_with`] for fetch operations which take no input.
    pub async fn load(&self) -> Result<T, LoadError> {
        self.load_with(()).await
    }
}
