// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket server and connection handling.

use fx_adapters::ToolAdapter;
use fx_daemon::protocol::{self, Request, Response, DEFAULT_TIMEOUT, PROTOCOL_VERSION};
use fx_engine::Ticket;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, error, info};

use crate::lifecycle::Service;

/// Handle a single client connection
///
/// A submitted job stays registered until its report has been written, so
/// the sweeper cannot reclaim outputs the caller has not yet seen.
pub async fn handle_connection<T, S>(service: &Service<T>, stream: S) -> Result<(), ServerError>
where
    T: ToolAdapter,
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut reader, mut writer) = tokio::io::split(stream);

    let request = match protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await {
        Ok(req) => req,
        Err(protocol::ProtocolError::Timeout) => {
            error!("Request read timeout");
            return Err(ServerError::Timeout);
        }
        Err(protocol::ProtocolError::ConnectionClosed) => {
            debug!("Client disconnected before sending request");
            return Ok(());
        }
        Err(e) => {
            error!("Failed to read request: {}", e);
            let response = Response::Error {
                message: format!("invalid request: {}", e),
            };
            let _ = protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await;
            return Err(ServerError::Protocol(e));
        }
    };

    debug!("Received request: {:?}", request);
    let shutdown = matches!(request, Request::Shutdown);

    let (response, ticket) = handle_request(service, request).await;

    debug!("Sending response: {:?}", response);
    let written = protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await;

    // Releases the job's registration
    drop(ticket);

    if shutdown {
        service.request_shutdown();
    }
    written.map_err(ServerError::Protocol)
}

/// Handle a single request
///
/// Returns the ticket of a submitted job alongside its response.
pub async fn handle_request<T: ToolAdapter>(
    service: &Service<T>,
    request: Request,
) -> (Response, Option<Ticket>) {
    match request {
        Request::Ping => (Response::Pong, None),

        Request::Hello { version } => {
            if version != PROTOCOL_VERSION {
                info!(client = %version, daemon = PROTOCOL_VERSION, "Client version differs");
            }
            (
                Response::Hello {
                    version: PROTOCOL_VERSION.to_string(),
                },
                None,
            )
        }

        Request::Submit { source, effect } => {
            if service.shutdown.is_cancelled() {
                return (
                    Response::Error {
                        message: "daemon is shutting down".to_string(),
                    },
                    None,
                );
            }
            let ticket = service
                .pipeline
                .submit_with_cancel(&source, &effect, service.shutdown.child_token())
                .await;
            let response = Response::Job {
                report: Box::new(ticket.report().clone()),
            };
            (response, Some(ticket))
        }

        Request::Status => (
            Response::Status {
                uptime_secs: service.start_time.elapsed().as_secs(),
                active_jobs: service.pipeline.registry().active_count(),
                last_sweep: service.sweeper.last_report(),
            },
            None,
        ),

        Request::Sweep => {
            let sweeper = service.sweeper.clone();
            let response = match tokio::task::spawn_blocking(move || sweeper.run_once()).await {
                Ok(report) => Response::Swept { report },
                Err(e) => {
                    error!("Sweep task failed: {}", e);
                    Response::Error {
                        message: "sweep failed".to_string(),
                    }
                }
            };
            (response, None)
        }

        Request::Shutdown => (Response::ShuttingDown, None),
    }
}

/// Server errors
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),

    #[error("Request timeout")]
    Timeout,
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
