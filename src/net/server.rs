use crate::context::RequestContext;
use crate::gateway::AdminGateway;
use crate::net::api::handle_profiling_request;
use crate::net::http::{read_request, write_json_response};
use crate::net::NetError;
use crate::profiling::ProfilingOrchestrator;
use log::{error, info, warn};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub struct ProfilingHttpServerConfig {
    pub bind: SocketAddr,
    /// Deadline applied to each inbound request's context and to the
    /// socket's read/write timeouts.
    pub request_timeout: Duration,
}

pub struct ProfilingHttpServerHandle {
    local_addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    join: Option<thread::JoinHandle<()>>,
}

impl ProfilingHttpServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.join.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ProfilingHttpServerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Plain-TCP HTTP server exposing the profiling capture routes.
///
/// One thread per connection; the orchestrator is shared immutably, so
/// concurrent start/stop requests race at the remote authority rather than
/// being serialized here.
pub struct ProfilingHttpServer;

impl ProfilingHttpServer {
    pub fn spawn<G: AdminGateway + 'static>(
        config: ProfilingHttpServerConfig,
        orchestrator: ProfilingOrchestrator<G>,
    ) -> Result<ProfilingHttpServerHandle, NetError> {
        let listener = TcpListener::bind(config.bind)?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;
        info!("profiling HTTP server listening on {local_addr}");
        let shared = Arc::new(orchestrator);
        let request_timeout = config.request_timeout;
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_flag = shutdown.clone();
        let handle = thread::spawn(move || loop {
            if shutdown_flag.load(Ordering::Relaxed) {
                break;
            }
            match listener.accept() {
                Ok((stream, addr)) => {
                    let orchestrator = shared.clone();
                    thread::spawn(move || {
                        if let Err(err) =
                            handle_connection(stream, addr, request_timeout, &orchestrator)
                        {
                            warn!("profiling connection {addr} error: {err}");
                        }
                    });
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(25));
                }
                Err(err) => {
                    error!("profiling accept error: {err}");
                    break;
                }
            }
        });
        Ok(ProfilingHttpServerHandle {
            local_addr,
            shutdown,
            join: Some(handle),
        })
    }
}

fn handle_connection<G: AdminGateway>(
    mut stream: TcpStream,
    addr: SocketAddr,
    request_timeout: Duration,
    orchestrator: &ProfilingOrchestrator<G>,
) -> Result<(), NetError> {
    stream.set_read_timeout(Some(request_timeout))?;
    stream.set_write_timeout(Some(request_timeout))?;
    let request = match read_request(&mut stream) {
        Ok(request) => request,
        Err(err) => {
            warn!("invalid profiling request from {addr}: {err}");
            write_json_response(
                &mut stream,
                400,
                &serde_json::json!({ "error": "invalid HTTP request", "status": 400 }),
            )?;
            return Ok(());
        }
    };
    let ctx = RequestContext::with_timeout(request_timeout);
    handle_profiling_request(orchestrator, &ctx, &request, &mut stream)
}
