use crate::context::RequestContext;
use crate::gateway::AdminGateway;
use crate::net::deliver::deliver_archive;
use crate::net::http::{write_json_response, SimpleHttpRequest};
use crate::net::NetError;
use crate::profiling::{ProfilingError, ProfilingOrchestrator, StartProfilingRequest};
use log::warn;
use std::io::Write;

/// Routes one parsed profiling request to the orchestrator and writes the
/// response.
///
/// The stop route hands the archive stream straight to the deliverer, so a
/// successful stop commits its headers here and any later transport
/// failure is logged rather than returned. Errors from this function are
/// connection-level only (the response itself could not be written).
pub fn handle_profiling_request<G: AdminGateway>(
    orchestrator: &ProfilingOrchestrator<G>,
    ctx: &RequestContext,
    request: &SimpleHttpRequest,
    sink: &mut (impl Write + ?Sized),
) -> Result<(), NetError> {
    match (request.method.as_str(), request.path.as_str()) {
        ("POST", "/api/v1/profiling/start") => {
            let body = match parse_start_body(request) {
                Ok(body) => body,
                Err(err) => return write_json_response(sink, err.status, &err.body),
            };
            match orchestrator.start_session(ctx, body.as_ref()) {
                Ok(result) => write_json_response(sink, 201, &result),
                Err(err) => {
                    let translated = HttpProfilingError::from(err);
                    write_json_response(sink, translated.status, &translated.body)
                }
            }
        }
        ("POST", "/api/v1/profiling/stop") => match orchestrator.stop_session(ctx) {
            Ok(stream) => {
                deliver_archive(stream, sink);
                Ok(())
            }
            Err(err) => {
                let translated = HttpProfilingError::from(err);
                write_json_response(sink, translated.status, &translated.body)
            }
        },
        _ => {
            let err = HttpProfilingError::status_message(
                404,
                format!("no route for {} {}", request.method, request.path),
            );
            write_json_response(sink, err.status, &err.body)
        }
    }
}

fn parse_start_body(
    request: &SimpleHttpRequest,
) -> Result<Option<StartProfilingRequest>, HttpProfilingError> {
    // An absent body is the orchestrator's MissingRequestBody case, not a
    // malformed request.
    if request.body.is_empty() {
        return Ok(None);
    }
    if request
        .header("content-type")
        .map(|value| value.eq_ignore_ascii_case("application/json"))
        != Some(true)
    {
        return Err(HttpProfilingError::status_message(
            415,
            "Content-Type must be application/json",
        ));
    }
    serde_json::from_slice(&request.body)
        .map(Some)
        .map_err(|err| {
            HttpProfilingError::status_message(400, format!("invalid JSON body: {err}"))
        })
}

/// Boundary-facing translation of the profiling failure taxonomy.
pub struct HttpProfilingError {
    pub status: u16,
    pub body: serde_json::Value,
}

impl HttpProfilingError {
    fn status_message(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: serde_json::json!({ "error": message.into(), "status": status }),
        }
    }
}

impl From<ProfilingError> for HttpProfilingError {
    fn from(err: ProfilingError) -> Self {
        warn!("event=profiling_api outcome=error error={err}");
        match &err {
            ProfilingError::MissingRequestBody | ProfilingError::InvalidKind(_) => {
                Self::status_message(400, err.to_string())
            }
            ProfilingError::UpstreamUnavailable(_) => {
                Self::status_message(503, "administrative endpoint unavailable")
            }
            ProfilingError::UpstreamFailure(source) => {
                Self::status_message(500, format!("profiling command failed: {source}"))
            }
            ProfilingError::Canceled => Self::status_message(499, "request canceled"),
            ProfilingError::DeadlineExceeded => {
                Self::status_message(408, "request deadline exceeded")
            }
        }
    }
}
