//! A bounded queue for renderer-driven tile requests.
//!
//! Requests are dispatched most-recent-first, since the renderer asks for the tiles it needs now last. Each request carries
//! a relevance filter that is checked right before dispatch; a request that is no longer relevant is answered with
//! `Response::Abort` without touching the network.

use crate::{Response, TransportError};

use terrain_tiles_core::TileKey;
use terrain_tiles_storage::SmallKeyHashMap;

use futures::future::{AbortHandle, Abortable, BoxFuture};
use futures::task::{LocalSpawn, LocalSpawnExt};
use std::cell::{Cell, RefCell, RefMut};
use std::rc::Rc;

/// The default bound on concurrently loading requests.
pub const MAX_REQUESTS: usize = 24;

pub type RelevanceFilter = Box<dyn Fn() -> bool>;
pub type StartRequest = Box<dyn FnOnce() -> BoxFuture<'static, Response>>;
pub type Completion = Box<dyn FnOnce(Response)>;

/// One queued request.
pub struct LoadRequest {
    pub key: TileKey,
    pub url: String,
    pub filter: RelevanceFilter,
    pub start: StartRequest,
}

impl LoadRequest {
    pub fn new(
        key: TileKey,
        url: String,
        filter: impl Fn() -> bool + 'static,
        start: impl FnOnce() -> BoxFuture<'static, Response> + 'static,
    ) -> Self {
        Self {
            key,
            url,
            filter: Box::new(filter),
            start: Box::new(start),
        }
    }
}

/// Runs at most `max_requests` requests at once on a `LocalSpawn` executor.
///
/// Clones share the same queue. The loader lives on the executor's thread, so callbacks need not be `Send`.
pub struct Loader<S> {
    inner: Rc<LoaderInner<S>>,
}

impl<S> Clone for Loader<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

struct LoaderInner<S> {
    spawner: S,
    max_requests: usize,
    state: RefCell<LoaderState>,
    loadend_listeners: RefCell<Vec<Rc<dyn Fn()>>>,
}

#[derive(Default)]
struct LoaderState {
    queue: Vec<(LoadRequest, Completion)>,
    loading: usize,
    in_flight: SmallKeyHashMap<u64, AbortHandle>,
    next_id: u64,
    active: bool,
}

type SharedCompletion = Rc<Cell<Option<Completion>>>;

impl<S> Loader<S>
where
    S: LocalSpawn + 'static,
{
    pub fn new(spawner: S, max_requests: usize) -> Self {
        Self {
            inner: Rc::new(LoaderInner {
                spawner,
                max_requests: max_requests.max(1),
                state: Default::default(),
                loadend_listeners: Default::default(),
            }),
        }
    }

    /// Queues `request`. `completion` is called exactly once, with `Response::Abort` if the request is filtered out or
    /// aborted.
    pub fn load(&self, request: LoadRequest, completion: impl FnOnce(Response) + 'static) {
        {
            let mut state = self.inner.lock();
            state.queue.push((request, Box::new(completion)));
            state.active = true;
        }
        self.inner.dispatch();
    }

    /// Answers every queued request with `Response::Abort` and aborts every request in flight.
    pub fn abort_all(&self) {
        let (queued, in_flight) = {
            let mut state = self.inner.lock();
            let queued: Vec<_> = state.queue.drain(..).collect();
            let in_flight: Vec<_> = state.in_flight.drain().map(|(_, handle)| handle).collect();
            (queued, in_flight)
        };
        tracing::debug!(
            queued = queued.len(),
            in_flight = in_flight.len(),
            "aborting terrain loads"
        );
        for handle in in_flight {
            handle.abort();
        }
        for (_, completion) in queued {
            completion(Response::Abort);
        }
        self.inner.dispatch();
    }

    /// Registers a listener called whenever the loader becomes idle after having work.
    pub fn on_loadend(&self, listener: impl Fn() + 'static) {
        self.inner.loadend_listeners.borrow_mut().push(Rc::new(listener));
    }

    /// Number of dispatched requests that have not settled.
    #[inline]
    pub fn loading(&self) -> usize {
        self.inner.lock().loading
    }

    /// Number of requests waiting for a slot.
    #[inline]
    pub fn queued(&self) -> usize {
        self.inner.lock().queue.len()
    }

    #[inline]
    pub fn max_requests(&self) -> usize {
        self.inner.max_requests
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        let state = self.inner.lock();
        state.loading == 0 && state.queue.is_empty()
    }
}

impl<S> LoaderInner<S>
where
    S: LocalSpawn + 'static,
{
    /// Callbacks never run while this borrow is alive.
    fn lock(&self) -> RefMut<'_, LoaderState> {
        self.state.borrow_mut()
    }

    fn dispatch(self: &Rc<Self>) {
        loop {
            let (request, completion) = {
                let mut state = self.lock();
                if state.loading >= self.max_requests {
                    break;
                }
                match state.queue.pop() {
                    Some(job) => {
                        // Reserve the slot before the borrow is released.
                        state.loading += 1;
                        job
                    }
                    None => break,
                }
            };

            if !(request.filter)() {
                tracing::trace!(tile = %request.key, "dropping request that is no longer relevant");
                self.lock().loading -= 1;
                completion(Response::Abort);
                continue;
            }

            tracing::trace!(tile = %request.key, url = %request.url, "dispatching terrain request");
            let (abort_handle, registration) = AbortHandle::new_pair();
            let id = {
                let mut state = self.lock();
                let id = state.next_id;
                state.next_id += 1;
                state.in_flight.insert(id, abort_handle);
                id
            };

            let completion: SharedCompletion = Rc::new(Cell::new(Some(completion)));
            let task_completion = Rc::clone(&completion);
            let inner = Rc::clone(self);
            let response = Abortable::new((request.start)(), registration);
            let task = async move {
                let response = response.await.unwrap_or(Response::Abort);
                inner.settle(id, &task_completion, response);
            };

            if let Err(e) = self.spawner.spawn_local(task) {
                tracing::warn!(tile = %request.key, "failed to spawn terrain request: {}", e);
                self.settle(
                    id,
                    &completion,
                    Response::Error(TransportError::Spawn { url: request.url }),
                );
            }
        }

        self.notify_if_idle();
    }

    fn settle(self: &Rc<Self>, id: u64, completion: &SharedCompletion, response: Response) {
        {
            let mut state = self.lock();
            state.in_flight.remove(&id);
            state.loading -= 1;
        }
        if let Some(completion) = completion.take() {
            completion(response);
        }
        self.dispatch();
    }

    fn notify_if_idle(&self) {
        let became_idle = {
            let mut state = self.lock();
            let idle = state.active && state.loading == 0 && state.queue.is_empty();
            if idle {
                state.active = false;
            }
            idle
        };
        if became_idle {
            let listeners: Vec<_> = self.loadend_listeners.borrow().clone();
            for listener in listeners {
                listener();
            }
        }
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
