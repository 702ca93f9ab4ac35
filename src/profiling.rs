use crate::archive::ArchiveStream;
use crate::context::{ContextError, RequestContext};
use crate::gateway::{AdminGateway, GatewayError, NodeCommandStatus};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of cluster-wide profiling captures. The remote authority only
/// understands these seven; anything else is rejected before a command is
/// issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfilerKind {
    #[serde(rename = "cpu")]
    Cpu,
    #[serde(rename = "mem")]
    Memory,
    #[serde(rename = "block")]
    BlockContention,
    #[serde(rename = "mutex")]
    MutexContention,
    #[serde(rename = "trace")]
    ExecutionTrace,
    #[serde(rename = "threads")]
    ThreadDump,
    #[serde(rename = "goroutines")]
    TaskDump,
}

impl ProfilerKind {
    pub const ALL: [ProfilerKind; 7] = [
        ProfilerKind::Cpu,
        ProfilerKind::Memory,
        ProfilerKind::BlockContention,
        ProfilerKind::MutexContention,
        ProfilerKind::ExecutionTrace,
        ProfilerKind::ThreadDump,
        ProfilerKind::TaskDump,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Memory => "mem",
            Self::BlockContention => "block",
            Self::MutexContention => "mutex",
            Self::ExecutionTrace => "trace",
            Self::ThreadDump => "threads",
            Self::TaskDump => "goroutines",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == value)
    }
}

/// Inbound start-profiling body. The kind arrives as a raw string so the
/// orchestrator can enforce the closed set itself even when an outer
/// validator exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartProfilingRequest {
    #[serde(rename = "type")]
    pub profiler_type: String,
}

/// One participant's report for a single profiling command. Created once
/// per node per start call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeProfilingOutcome {
    #[serde(rename = "nodeName")]
    pub node_name: String,
    pub success: bool,
    pub error: String,
}

/// Ordered per-node outcomes for one start call. `total` always equals the
/// outcome count; order and duplicates are preserved verbatim from the
/// gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilingResultSet {
    #[serde(rename = "startResults")]
    pub start_results: Vec<NodeProfilingOutcome>,
    pub total: u64,
}

impl ProfilingResultSet {
    pub fn from_outcomes(start_results: Vec<NodeProfilingOutcome>) -> Self {
        let total = start_results.len() as u64;
        Self {
            start_results,
            total,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProfilingError {
    #[error("profiling request body is missing")]
    MissingRequestBody,
    #[error("unknown profiler kind `{0}`")]
    InvalidKind(String),
    #[error("administrative endpoint unavailable")]
    UpstreamUnavailable(#[source] GatewayError),
    #[error("administrative call failed")]
    UpstreamFailure(#[source] GatewayError),
    #[error("request canceled")]
    Canceled,
    #[error("request deadline exceeded")]
    DeadlineExceeded,
}

impl From<ContextError> for ProfilingError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::Canceled => Self::Canceled,
            ContextError::DeadlineExceeded => Self::DeadlineExceeded,
        }
    }
}

impl From<GatewayError> for ProfilingError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Unavailable { .. } => Self::UpstreamUnavailable(err),
            GatewayError::Interrupted(ctx) => Self::from(ctx),
            GatewayError::Rejected { .. } | GatewayError::Transport(_) => {
                Self::UpstreamFailure(err)
            }
        }
    }
}

/// Sequences profiling commands against the administrative capability.
///
/// The cluster's `Idle -> Profiling -> Idle` session state lives in the
/// remote authority, never here; every call re-commands the remote side and
/// surfaces its rejection of an out-of-order transition as an upstream
/// failure. Per-node failures inside a successful start are data, not
/// errors.
pub struct ProfilingOrchestrator<G: AdminGateway> {
    gateway: G,
}

impl<G: AdminGateway> ProfilingOrchestrator<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Begins a named profiling session on every reachable node.
    ///
    /// Either the whole call succeeds with a (possibly mixed-success)
    /// result set or it fails with a single top-level error; no partial
    /// result set is ever returned.
    pub fn start_session(
        &self,
        ctx: &RequestContext,
        body: Option<&StartProfilingRequest>,
    ) -> Result<ProfilingResultSet, ProfilingError> {
        let kind = validate_start_request(body)?;
        ctx.check()?;
        let statuses = self
            .gateway
            .start_profiling(ctx, kind)
            .map_err(|err| classify(err, "profiling_start"))?;
        let outcomes: Vec<NodeProfilingOutcome> = statuses
            .into_iter()
            .map(|status| NodeProfilingOutcome {
                node_name: status.node_name,
                success: status.success,
                error: status.error,
            })
            .collect();
        let failures = outcomes.iter().filter(|outcome| !outcome.success).count();
        let result = ProfilingResultSet::from_outcomes(outcomes);
        info!(
            "event=profiling_start kind={} nodes={} node_failures={}",
            kind.as_str(),
            result.total,
            failures
        );
        Ok(result)
    }

    /// Ends the active session and returns the archive stream.
    ///
    /// Ownership of the stream transfers to the caller; on error no stream
    /// is live, so the caller never holds both an error and an open stream.
    pub fn stop_session(&self, ctx: &RequestContext) -> Result<ArchiveStream, ProfilingError> {
        ctx.check()?;
        let stream = self
            .gateway
            .stop_profiling(ctx)
            .map_err(|err| classify(err, "profiling_stop"))?;
        info!("event=profiling_stop outcome=archive_open");
        Ok(stream)
    }
}

fn validate_start_request(
    body: Option<&StartProfilingRequest>,
) -> Result<ProfilerKind, ProfilingError> {
    let request = body.ok_or(ProfilingError::MissingRequestBody)?;
    let raw = request.profiler_type.trim();
    if raw.is_empty() {
        return Err(ProfilingError::MissingRequestBody);
    }
    ProfilerKind::parse(raw).ok_or_else(|| ProfilingError::InvalidKind(raw.to_string()))
}

fn classify(err: GatewayError, operation: &'static str) -> ProfilingError {
    warn!("event={operation} outcome=error error={err}");
    ProfilingError::from(err)
}
