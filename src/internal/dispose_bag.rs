//! Disposal bookkeeping with LIFO execution order.

use crate::error::{DisposalFailure, DisposeError};

/// One pending disposal, bound to the instance it releases.
pub(crate) struct Disposer {
    service: &'static str,
    run: Box<dyn FnOnce() -> Result<(), DisposeError> + Send>,
}

impl Disposer {
    pub(crate) fn new(
        service: &'static str,
        run: impl FnOnce() -> Result<(), DisposeError> + Send + 'static,
    ) -> Self {
        Self { service, run: Box::new(run) }
    }

    pub(crate) fn service(&self) -> &'static str {
        self.service
    }
}

/// Run all disposers in reverse registration order. Failures do not stop
/// the sweep; every failure is collected and returned.
pub(crate) fn run_reverse(mut disposers: Vec<Disposer>) -> Vec<DisposalFailure> {
    let mut failures = Vec::new();
    while let Some(disposer) = disposers.pop() {
        if let Err(error) = (disposer.run)() {
            failures.push(DisposalFailure { service: disposer.service, error });
        }
    }
    failures
}
