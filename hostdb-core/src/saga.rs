//! Ordered administrative statements with compensating undo steps.
//!
//! Engine DDL is not transactional. A [`Saga`] runs its steps in order and,
//! when one fails, runs the compensations of the steps that completed in
//! reverse order, once. Compensations are idempotent (`... IF EXISTS`).
//!
//! Forward steps are bounded by the caller's [`Deadline`] and by the
//! per-statement timeout. Compensations run outside the caller's deadline,
//! each bounded only by the compensation timeout. When a forward step timed
//! out its effect is unknown, so its own compensation runs as well.

use std::time::Duration;

use hostdb_mysql::{AdminEngine, ddl};
use tracing::{debug, warn};

use crate::deadline::Deadline;
use crate::error::{CoreError, CoreResult};

/// One forward statement and the statement that undoes it.
#[derive(Clone)]
pub struct SagaStep {
    name: &'static str,
    action: String,
    compensation: Option<String>,
}

impl SagaStep {
    /// A step that cannot be undone on its own.
    pub fn new(name: &'static str, action: impl Into<String>) -> Self {
        Self {
            name,
            action: action.into(),
            compensation: None,
        }
    }

    /// Attach the undo statement.
    pub fn compensate_with(mut self, compensation: impl Into<String>) -> Self {
        self.compensation = Some(compensation.into());
        self
    }

    /// The step name used in errors and logs.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl std::fmt::Debug for SagaStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SagaStep")
            .field("name", &self.name)
            .field("action", &ddl::redact(&self.action))
            .field("compensation", &self.compensation)
            .finish()
    }
}

/// A sequence of [`SagaStep`]s against one administrative engine.
pub struct Saga<'a> {
    engine: &'a dyn AdminEngine,
    steps: Vec<SagaStep>,
    statement_timeout: Duration,
    compensation_timeout: Duration,
    completed: usize,
}

impl<'a> Saga<'a> {
    /// An empty saga.
    pub fn new(
        engine: &'a dyn AdminEngine,
        statement_timeout: Duration,
        compensation_timeout: Duration,
    ) -> Self {
        Self {
            engine,
            steps: Vec::new(),
            statement_timeout,
            compensation_timeout,
            completed: 0,
        }
    }

    /// Append a step.
    pub fn step(mut self, step: SagaStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Number of steps that ran to completion.
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Run every step. On failure the completed steps are compensated and
    /// the forward error is returned: [`CoreError::Provisioning`] naming the
    /// step for an engine error, [`CoreError::Timeout`] for an expired
    /// deadline or statement timeout.
    pub async fn run(&mut self, deadline: Deadline) -> CoreResult<()> {
        while self.completed < self.steps.len() {
            let step = &self.steps[self.completed];
            debug!(step = step.name, "Running provisioning step");

            let bound = deadline.min(Deadline::after(self.statement_timeout));
            match bound.bound(self.engine.execute(&step.action)).await {
                Ok(Ok(())) => self.completed += 1,
                Ok(Err(source)) => {
                    let step = step.name.to_string();
                    self.compensate(self.completed).await;
                    return Err(CoreError::Provisioning { step, source });
                }
                Err(_) => {
                    let name = step.name;
                    // The statement may have been applied before the timer fired.
                    self.compensate(self.completed + 1).await;
                    return Err(CoreError::timeout(format!("provisioning step `{}`", name)));
                }
            }
        }
        Ok(())
    }

    /// Undo every completed step, for a failure after the saga finished.
    pub async fn rollback(&mut self) {
        self.compensate(self.completed).await;
        self.completed = 0;
    }

    /// Run the compensations of the first `count` steps in reverse order.
    /// Failures are logged and never mask the forward error.
    async fn compensate(&self, count: usize) {
        for step in self.steps[..count.min(self.steps.len())].iter().rev() {
            let Some(compensation) = &step.compensation else {
                continue;
            };
            match tokio::time::timeout(self.compensation_timeout, self.engine.execute(compensation))
                .await
            {
                Ok(Ok(())) => debug!(step = step.name, "Compensated provisioning step"),
                Ok(Err(e)) => warn!(
                    step = step.name,
                    error = %e,
                    "Compensation failed; engine objects may be left behind"
                ),
                Err(_) => warn!(
                    step = step.name,
                    timeout_ms = self.compensation_timeout.as_millis() as u64,
                    "Compensation timed out; engine objects may be left behind"
                ),
            }
        }
    }
}
