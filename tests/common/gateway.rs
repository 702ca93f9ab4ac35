#![cfg(test)]

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use storcon::{
    AdminGateway, ArchiveStream, GatewayError, NodeCommandStatus, ProfilerKind, RequestContext,
};

/// Deterministic gateway standing in for the cluster's administrative
/// transport. Counts calls and opened streams so tests can assert that
/// rejected requests never touch the wire and never leak archives.
#[derive(Default)]
pub struct MockGateway {
    pub outcomes: Vec<NodeCommandStatus>,
    pub archive: Vec<u8>,
    pub reject_start: Option<String>,
    pub reject_stop: Option<String>,
    pub start_calls: AtomicUsize,
    pub stop_calls: AtomicUsize,
    pub streams_opened: AtomicUsize,
}

impl MockGateway {
    pub fn with_outcomes(outcomes: Vec<NodeCommandStatus>) -> Self {
        Self {
            outcomes,
            ..Self::default()
        }
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    pub fn streams_opened(&self) -> usize {
        self.streams_opened.load(Ordering::SeqCst)
    }
}

impl AdminGateway for MockGateway {
    fn start_profiling(
        &self,
        ctx: &RequestContext,
        _kind: ProfilerKind,
    ) -> Result<Vec<NodeCommandStatus>, GatewayError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        ctx.check()?;
        if let Some(details) = &self.reject_start {
            return Err(GatewayError::Rejected {
                details: details.clone(),
            });
        }
        Ok(self.outcomes.clone())
    }

    fn stop_profiling(&self, ctx: &RequestContext) -> Result<ArchiveStream, GatewayError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        ctx.check()?;
        if let Some(details) = &self.reject_stop {
            return Err(GatewayError::Rejected {
                details: details.clone(),
            });
        }
        self.streams_opened.fetch_add(1, Ordering::SeqCst);
        Ok(ArchiveStream::from_reader(Cursor::new(self.archive.clone())))
    }
}

pub fn node(name: &str, success: bool, error: &str) -> NodeCommandStatus {
    NodeCommandStatus {
        node_name: name.into(),
        success,
        error: error.into(),
    }
}
