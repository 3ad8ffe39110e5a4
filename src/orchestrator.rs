//! Batch execution.
//!
//! Drives the configured plans in order, isolating each plan's failure and
//! reporting every outcome through the notifier when one is configured.

use log::{debug, error, info, warn};

use crate::config::EmailSettings;
use crate::notify::{self, Notifier};
use crate::plan::{Outcome, Plan};
use crate::store::BlobStore;

/// Aggregate tally of one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Runs a batch of plans against a blob store, one at a time.
pub struct Orchestrator<'a> {
    store: &'a dyn BlobStore,
    notification: Option<Notification<'a>>,
}

struct Notification<'a> {
    notifier: &'a dyn Notifier,
    email: &'a EmailSettings,
}

impl<'a> Orchestrator<'a> {
    pub fn new(store: &'a dyn BlobStore) -> Self {
        Self {
            store,
            notification: None,
        }
    }

    /// Enables a status email for every outcome.
    pub fn with_notifier(mut self, notifier: &'a dyn Notifier, email: &'a EmailSettings) -> Self {
        self.notification = Some(Notification { notifier, email });
        self
    }

    /// Runs every plan in order.
    ///
    /// Plan N's whole pipeline and notification complete before plan N+1
    /// starts. A failing plan is reported and counted, never fatal to the
    /// rest of the batch. An empty list performs no work.
    pub fn run_plans(&self, plans: &[Plan]) -> BatchSummary {
        let mut summary = BatchSummary::default();
        if plans.is_empty() {
            warn!("no plans to execute");
            return summary;
        }

        for (index, plan) in plans.iter().enumerate() {
            info!("executing plan {} of {}", index + 1, plans.len());
            let outcome = plan.run(self.store);
            if outcome.succeeded() {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
            self.notify(plan, &outcome);
        }

        info!(
            "finished running backup plans: {} succeeded, {} failed",
            summary.succeeded, summary.failed
        );
        summary
    }

    fn notify(&self, plan: &Plan, outcome: &Outcome) {
        let Some(notification) = &self.notification else {
            debug!("email not configured, status update not sent");
            return;
        };
        let (subject, body) = notify::status_email(plan, outcome);
        if let Err(e) = notification.notifier.send(
            &notification.email.from,
            &notification.email.to,
            &subject,
            &body,
        ) {
            error!("{e}");
        }
    }
}
