//! Invoke-time resolution stack.
//!
//! Planning already rejects cycles declared through blueprints, but opaque
//! factory closures can re-enter the resolver with arbitrary keys. This
//! thread-local stack catches those cycles at invocation time, before they
//! can exhaust the call stack. Membership is checked before pushing and the
//! failure is reported as a `Result`, never as a panic.

use std::cell::RefCell;

use crate::error::{DiError, DiResult};
use crate::key::ServiceKey;

const MAX_DEPTH: usize = 1024;

thread_local! {
    static RESOLVING: RefCell<Vec<ServiceKey>> = const { RefCell::new(Vec::new()) };
}

/// Guard holding one frame of the thread's resolution stack.
pub(crate) struct ResolveGuard;

impl ResolveGuard {
    pub(crate) fn push(key: ServiceKey) -> DiResult<Self> {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(&key) {
                let mut path = stack.clone();
                path.push(key);
                return Err(DiError::Recursive(path));
            }
            if stack.len() >= MAX_DEPTH {
                return Err(DiError::DepthExceeded(stack.len()));
            }
            stack.push(key);
            Ok(ResolveGuard)
        })
    }
}

impl Drop for ResolveGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}
