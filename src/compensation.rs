use std::{future::Future, pin::Pin};

use tracing::{info, warn};

type Action = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>>;

/// Undo steps for a multi-step write that has no transaction around it.
///
/// Futures are lazy, so a recorded action does nothing until [`unwind`](Self::unwind)
/// awaits it. On success call [`disarm`](Self::disarm). A crash between steps still
/// leaves whatever was already written.
#[derive(Default)]
pub struct Compensations {
    actions: Vec<(&'static str, Action)>,
}

impl Compensations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record<F>(&mut self, label: &'static str, action: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.actions.push((label, Box::pin(action)));
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn disarm(self) {
        drop(self.actions);
    }

    /// Runs every recorded action, newest first. Failures are logged and skipped.
    pub async fn unwind(self) {
        for (label, action) in self.actions.into_iter().rev() {
            match action.await {
                Ok(()) => info!(step = label, "compensation applied"),
                Err(e) => warn!(step = label, error = %e, "compensation failed"),
            }
        }
    }
}
