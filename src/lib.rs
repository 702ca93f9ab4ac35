//! Core library for the storcon profiling capture console.
//! Orchestrates cluster-wide diagnostic profiling sessions against an
//! abstract administrative capability and streams the resulting archive
//! back to callers with single-close discipline.

pub mod archive;
pub mod context;
pub mod gateway;
#[cfg(feature = "net")]
pub mod net;
pub mod profiling;

pub use archive::{ArchiveStream, ARCHIVE_FILENAME};
pub use context::{CancelHandle, ContextError, RequestContext};
pub use gateway::{AdminGateway, GatewayError, NodeCommandStatus};
pub use profiling::{
    NodeProfilingOutcome, ProfilerKind, ProfilingError, ProfilingOrchestrator, ProfilingResultSet,
    StartProfilingRequest,
};
