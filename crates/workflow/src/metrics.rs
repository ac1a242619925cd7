//! Observer hook for finished workflows.
//!
//! A process installs one [`WorkflowMetrics`] with [`set_workflow_metrics`];
//! each orchestrator entry point reports a [`WorkflowRun`] when it returns.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use classify::ErrorKind;
use once_cell::sync::Lazy;

/// One finished orchestrator workflow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkflowRun<'a> {
    /// `ticket`, `cancel`, `import`, `get_ticket` or `create_booking`.
    pub workflow: &'a str,
    /// Wall-clock time of the run, retries and fallbacks included.
    pub latency: Duration,
    /// Kind of the returned error; `None` when the workflow succeeded.
    pub failure: Option<ErrorKind>,
}

impl WorkflowRun<'_> {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

pub trait WorkflowMetrics: Send + Sync {
    fn record_workflow(&self, run: &WorkflowRun<'_>);
}

static RECORDER: Lazy<RwLock<Option<Arc<dyn WorkflowMetrics>>>> =
    Lazy::new(|| RwLock::new(None));

pub(crate) fn report(run: &WorkflowRun<'_>) {
    let recorder = RECORDER
        .read()
        .map(|slot| slot.clone())
        .unwrap_or_else(|poisoned| poisoned.into_inner().clone());
    if let Some(recorder) = recorder {
        recorder.record_workflow(run);
    }
}

/// Replace the process-wide recorder; `None` stops reporting.
pub fn set_workflow_metrics(recorder: Option<Arc<dyn WorkflowMetrics>>) {
    match RECORDER.write() {
        Ok(mut slot) => *slot = recorder,
        Err(poisoned) => *poisoned.into_inner() = recorder,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_is_the_absence_of_a_failure_kind() {
        let run = WorkflowRun { workflow: "ticket", latency: Duration::ZERO, failure: None };
        assert!(run.succeeded());
        let run = WorkflowRun { failure: Some(ErrorKind::TicketingFailed), ..run };
        assert!(!run.succeeded());
    }
}
