//! Generation-guarded async resource loading.
//!
//! A [`ResourceCell`] binds one backend fetch to observable state the views
//! can render: `Idle` (no credential), `Loading`, `Ready`, or `Failed`. The
//! invariants come straight from the UI contract:
//!
//! - at most one fetch is in flight per cell; a new input aborts the old one,
//! - a superseded fetch can never commit, even if its abort races,
//! - an absent credential resolves to the cell's designated empty value with
//!   no network call — it is not an error,
//! - failures are stored, not propagated; callers render them inline.

use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::AbortHandle;

use middify_core::BearerToken;

use crate::middify::types::{MarketplaceTenant, TenantStates, UserProfile};
use crate::middify::{MiddifyClient, MiddifyError};

/// Observable state of one loaded resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState<T> {
    /// No credential yet; nothing fetched.
    Idle,
    /// A fetch is in flight.
    Loading,
    /// Last fetch succeeded.
    Ready(T),
    /// Last fetch failed with a displayable reason.
    Failed(String),
}

impl<T> ResourceState<T> {
    /// Whether a fetch is currently in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// The ready value, if any.
    #[must_use]
    pub const fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// The failure message, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct CellInner {
    /// Input key of the fetch whose result currently owns the cell.
    key: Option<String>,
    /// Bumped whenever the input changes; stale fetches fail this check.
    generation: u64,
    task: Option<AbortHandle>,
}

/// A single resource slot: current state plus the machinery to (re)load it.
#[derive(Debug)]
pub struct ResourceCell<T> {
    state: watch::Sender<ResourceState<T>>,
    inner: Arc<Mutex<CellInner>>,
}

impl<T> Default for ResourceCell<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ResourceCell<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create an idle cell.
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(ResourceState::Idle);
        Self {
            state,
            inner: Arc::new(Mutex::new(CellInner {
                key: None,
                generation: 0,
                task: None,
            })),
        }
    }

    /// Current state snapshot.
    #[must_use]
    pub fn snapshot(&self) -> ResourceState<T> {
        self.state.borrow().clone()
    }

    /// Reset the cell to a settled value, cancelling any in-flight fetch.
    ///
    /// Used when the credential goes away: the cell resolves immediately to
    /// its designated empty value.
    pub fn reset(&self, state: ResourceState<T>) {
        {
            let mut inner = self.inner.lock().expect("resource cell lock poisoned");
            inner.generation += 1;
            inner.key = None;
            if let Some(task) = inner.task.take() {
                task.abort();
            }
        }
        self.state.send_replace(state);
    }

    /// Ensure the cell holds (or is loading) the resource for `key`.
    ///
    /// Re-invoking with the current key is a no-op. A new key aborts the
    /// in-flight fetch, enters `Loading`, and spawns `fetch`; only the fetch
    /// started last is allowed to commit its result.
    pub fn ensure<F, Fut>(&self, key: &str, fetch: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, MiddifyError>> + Send + 'static,
    {
        let generation = {
            let mut inner = self.inner.lock().expect("resource cell lock poisoned");
            if inner.key.as_deref() == Some(key) {
                return;
            }
            inner.generation += 1;
            inner.key = Some(key.to_string());
            if let Some(task) = inner.task.take() {
                task.abort();
            }
            // Inside the lock: a concurrent reset must observe either the old
            // state or Loading-with-our-generation, never a torn sequence.
            self.state.send_replace(ResourceState::Loading);
            inner.generation
        };

        let future = fetch();
        let state = self.state.clone();
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            let result = future.await;
            let next = match result {
                Ok(value) => ResourceState::Ready(value),
                Err(error) => ResourceState::Failed(error.to_string()),
            };
            let current = inner
                .lock()
                .map(|inner| inner.generation == generation)
                .unwrap_or(false);
            if current {
                state.send_replace(next);
            }
        });

        self.inner
            .lock()
            .expect("resource cell lock poisoned")
            .task = Some(handle.abort_handle());
    }

    /// Wait until the cell is not `Loading` and return the settled state.
    pub async fn wait_settled(&self) -> ResourceState<T> {
        let mut receiver = self.state.subscribe();
        receiver
            .wait_for(|state| !state.is_loading())
            .await
            .map_or(ResourceState::Idle, |state| state.clone())
    }
}

/// The three backend resources every page of the shell consumes.
#[derive(Debug, Default)]
pub struct SharedResources {
    pub tenant_states: ResourceCell<Vec<TenantStates>>,
    pub marketplace_summary: ResourceCell<Vec<MarketplaceTenant>>,
    pub profile: ResourceCell<Option<UserProfile>>,
}

impl SharedResources {
    /// Align all three cells with the current credential.
    ///
    /// No token → each cell settles to its empty value immediately, with no
    /// network call. With a token, each cell (re)fetches when the token
    /// changed since its last load.
    pub fn sync(&self, token: Option<&BearerToken>, client: &MiddifyClient) {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            self.tenant_states.reset(ResourceState::Ready(Vec::new()));
            self.marketplace_summary
                .reset(ResourceState::Ready(Vec::new()));
            self.profile.reset(ResourceState::Ready(None));
            return;
        };

        let key = token.as_str();

        self.tenant_states.ensure(key, || {
            let client = client.clone();
            let token = token.clone();
            async move { client.order_states(Some(&token)).await }
        });

        self.marketplace_summary.ensure(key, || {
            let client = client.clone();
            let token = token.clone();
            async move { client.marketplace_summary(Some(&token)).await }
        });

        self.profile.ensure(key, || {
            let client = client.clone();
            let token = token.clone();
            async move { client.user_profile(Some(&token)).await.map(Some) }
        });
    }

    /// Wait for all three cells to settle (first page load after sign-in).
    pub async fn settle(
        &self,
    ) -> (
        ResourceState<Vec<TenantStates>>,
        ResourceState<Vec<MarketplaceTenant>>,
        ResourceState<Option<UserProfile>>,
    ) {
        (
            self.tenant_states.wait_settled().await,
            self.marketplace_summary.wait_settled().await,
            self.profile.wait_settled().await,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ok<T: Send + 'static>(value: T) -> impl Future<Output = Result<T, MiddifyError>> + Send {
        async move { Ok(value) }
    }

    #[tokio::test]
    async fn test_ensure_loads_once_per_key() {
        let cell = ResourceCell::<u32>::new();
        cell.ensure("token-a", || ok(1));
        assert_eq!(cell.wait_settled().await, ResourceState::Ready(1));

        // Same key: no reload, value unchanged even with a different fetch.
        cell.ensure("token-a", || ok(2));
        assert_eq!(cell.snapshot(), ResourceState::Ready(1));

        // New key: reloads.
        cell.ensure("token-b", || ok(3));
        assert_eq!(cell.wait_settled().await, ResourceState::Ready(3));
    }

    #[tokio::test]
    async fn test_superseded_fetch_never_commits() {
        let cell = ResourceCell::<u32>::new();
        cell.ensure("slow", || async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(111)
        });
        cell.ensure("fast", || ok(222));

        assert_eq!(cell.wait_settled().await, ResourceState::Ready(222));

        // Give the (aborted) slow fetch time to have fired if it was going to.
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(cell.snapshot(), ResourceState::Ready(222));
    }

    #[tokio::test]
    async fn test_reset_cancels_and_settles_empty() {
        let cell = ResourceCell::<Vec<u32>>::new();
        cell.ensure("token", || async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(vec![9])
        });
        cell.reset(ResourceState::Ready(Vec::new()));

        assert_eq!(cell.wait_settled().await, ResourceState::Ready(Vec::new()));
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(cell.snapshot(), ResourceState::Ready(Vec::new()));
    }

    #[tokio::test]
    async fn test_failure_is_stored_not_propagated() {
        let cell = ResourceCell::<u32>::new();
        cell.ensure("token", || async {
            Err(MiddifyError::Api("backend said no".to_string()))
        });
        let state = cell.wait_settled().await;
        assert_eq!(
            state.failure(),
            Some("backend reported failure: backend said no")
        );
    }
}
