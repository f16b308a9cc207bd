//! Ambient scope management.
//!
//! Scopes form a per-thread stack: beginning a scope while another is
//! active pushes a child, and ending it pops back to the parent. The stack
//! is thread-confined, so a scope's own bookkeeping needs no locks; the
//! guard type is `!Send` to keep that confinement honest. Per-scope service
//! instances and the disposables created while the scope is active live in
//! the scope and are released when it ends.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, error};

use crate::error::{DiError, DiResult};
use crate::internal::{run_reverse, Disposer};
use crate::key::ServiceKey;
use crate::lifetime::SharedInstance;

thread_local! {
    static SCOPES: RefCell<Vec<Rc<ScopeState>>> = const { RefCell::new(Vec::new()) };
}

pub(crate) struct ScopeState {
    instances: RefCell<HashMap<ServiceKey, SharedInstance>>,
    disposers: RefCell<Vec<Disposer>>,
    ended: Cell<bool>,
}

impl ScopeState {
    pub(crate) fn cached(&self, key: &ServiceKey) -> Option<SharedInstance> {
        self.instances.borrow().get(key).cloned()
    }

    pub(crate) fn cache(&self, key: ServiceKey, value: SharedInstance) {
        self.instances.borrow_mut().insert(key, value);
    }

    fn track(&self, disposer: Disposer) {
        self.disposers.borrow_mut().push(disposer);
    }
}

/// The scope at the top of this thread's stack, if any.
pub(crate) fn current() -> Option<Rc<ScopeState>> {
    SCOPES.with(|scopes| scopes.borrow().last().cloned())
}

/// Register a disposer with the active scope. Hands the disposer back when
/// no scope is active so the caller can apply its own policy.
pub(crate) fn track_current(disposer: Disposer) -> Result<(), Disposer> {
    match current() {
        Some(scope) => {
            scope.track(disposer);
            Ok(())
        }
        None => Err(disposer),
    }
}

/// Guard for one logical unit of work.
///
/// Returned by [`ServiceContainer::begin_scope`](crate::ServiceContainer::begin_scope).
/// Disposables created while the scope is active are released in reverse
/// creation order when the scope ends: through [`end`](Scope::end) on the
/// success path, or on drop for every other exit path. `end` surfaces
/// aggregated disposal failures; drop can only log them.
///
/// The guard is `!Send`: a scope belongs to the thread that opened it.
#[must_use = "the scope ends (and disposes its instances) when this guard is dropped"]
pub struct Scope {
    state: Rc<ScopeState>,
}

impl Scope {
    pub(crate) fn begin() -> Self {
        let state = Rc::new(ScopeState {
            instances: RefCell::new(HashMap::new()),
            disposers: RefCell::new(Vec::new()),
            ended: Cell::new(false),
        });
        SCOPES.with(|scopes| scopes.borrow_mut().push(state.clone()));
        debug!("scope started");
        Self { state }
    }

    /// End the scope, disposing everything it tracked in reverse creation
    /// order. Failures do not stop the sweep and are aggregated into
    /// [`DiError::Disposal`].
    pub fn end(self) -> DiResult<()> {
        finish(&self.state)
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        if self.state.ended.get() {
            return;
        }
        if let Err(e) = finish(&self.state) {
            error!(error = %e, "scope disposal failed during drop");
        }
    }
}

fn finish(state: &Rc<ScopeState>) -> DiResult<()> {
    state.ended.set(true);
    SCOPES.with(|scopes| {
        let mut scopes = scopes.borrow_mut();
        if let Some(position) = scopes.iter().rposition(|s| Rc::ptr_eq(s, state)) {
            scopes.remove(position);
        }
    });
    state.instances.borrow_mut().clear();
    let disposers = state.disposers.take();
    let tracked = disposers.len();
    let failures = run_reverse(disposers);
    debug!(disposed = tracked, failed = failures.len(), "scope ended");
    if failures.is_empty() {
        Ok(())
    } else {
        Err(DiError::Disposal(failures))
    }
}
