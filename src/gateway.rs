use crate::archive::ArchiveStream;
use crate::context::{ContextError, RequestContext};
use crate::profiling::ProfilerKind;
use thiserror::Error;

/// One cluster participant's response to a profiling command, as reported
/// by the administrative transport. `error` is empty when `success` holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeCommandStatus {
    pub node_name: String,
    pub success: bool,
    pub error: String,
}

/// Administrative capability consumed by the orchestrator.
///
/// The concrete implementation owns node discovery, authentication, and the
/// cluster fan-out; from this side both operations are single blocking
/// calls. `start_profiling` returns the complete set of per-node outcomes
/// or fails as a whole (no partial delivery). `stop_profiling` transfers
/// full ownership of the returned stream to the caller; on error no stream
/// may be left open.
///
/// Implementations must observe the request context and return
/// [`GatewayError::Interrupted`] promptly once it is canceled or expired.
pub trait AdminGateway: Send + Sync {
    fn start_profiling(
        &self,
        ctx: &RequestContext,
        kind: ProfilerKind,
    ) -> Result<Vec<NodeCommandStatus>, GatewayError>;

    fn stop_profiling(&self, ctx: &RequestContext) -> Result<ArchiveStream, GatewayError>;
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("administrative endpoint unavailable: {details}")]
    Unavailable { details: String },
    #[error("cluster rejected the command: {details}")]
    Rejected { details: String },
    #[error("transport failure during administrative call: {0}")]
    Transport(#[from] std::io::Error),
    #[error("administrative call interrupted: {0}")]
    Interrupted(#[from] ContextError),
}
