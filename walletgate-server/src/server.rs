//! HTTP/2 server for the authentication endpoints

use crate::handlers::handle_request;
use http_body_util::Full;
use hyper::server::conn::http2;
use hyper::service::service_fn;
use hyper::Response;
use hyper_util::rt::{TokioExecutor, TokioIo};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info};
use walletgate_core::auth::Authenticator;

pub struct AuthServer {
    authenticator: Arc<Authenticator>,
}

impl AuthServer {
    pub fn new(authenticator: Authenticator) -> Self {
        Self {
            authenticator: Arc::new(authenticator),
        }
    }

    pub async fn serve(self, addr: SocketAddr) -> std::io::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        info!("walletgate server listening on {}", addr);

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            debug!("New connection from {}", remote_addr);

            let authenticator = self.authenticator.clone();
            tokio::spawn(async move {
                Self::handle_connection(stream, authenticator).await;
            });
        }
    }

    async fn handle_connection(stream: TcpStream, authenticator: Arc<Authenticator>) {
        let io = TokioIo::new(stream);

        let service = service_fn(move |req| {
            let authenticator = authenticator.clone();
            async move { handle_request(req, authenticator).await }
        });

        if let Err(err) = http2::Builder::new(TokioExecutor::new())
            .serve_connection(io, service)
            .await
        {
            error!("HTTP/2 connection error: {}", err);
        }
    }
}

/// Simple JSON response builder
pub fn simple_response(
    status: hyper::StatusCode,
    body: impl Into<String>,
) -> Result<Response<Full<bytes::Bytes>>, hyper::Error> {
    Ok(Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .header("server", "walletgate/0.1.0")
        .body(Full::new(bytes::Bytes::from(body.into())))
        .unwrap())
}
