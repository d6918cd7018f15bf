//! HTTP request handlers for the authentication endpoints

use crate::server::simple_response;
use http_body_util::BodyExt;
use hyper::{Method, Request, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info};
use walletgate_core::auth::Authenticator;
use walletgate_core::GateError;

type BoxBody = http_body_util::Full<bytes::Bytes>;

#[derive(Debug, Deserialize)]
struct InitiateRequest {
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VerifyRequest {
    address: Option<String>,
    signature: Option<String>,
}

/// Main request handler
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    authenticator: Arc<Authenticator>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("Handling {} {}", method, path);

    let (status, body) = match (&method, path.as_str()) {
        // Liveness probe
        (&Method::GET, "/health") => handle_health(),

        // Phase one: challenge issuance
        (&Method::POST, "/auth/initiate") => {
            let body_bytes = req.collect().await?.to_bytes();
            handle_initiate(&body_bytes, &authenticator)
        }

        // Phase two: signature verification
        (&Method::POST, "/auth/verify") => {
            let body_bytes = req.collect().await?.to_bytes();
            handle_verify(&body_bytes, &authenticator)
        }

        // Not found
        _ => (StatusCode::NOT_FOUND, json!({"error": "Not found"})),
    };

    info!("{} {} -> {}", method, path, status);
    simple_response(status, body.to_string())
}

/// Liveness probe handler
fn handle_health() -> (StatusCode, serde_json::Value) {
    (
        StatusCode::OK,
        json!({
            "status": "ok",
            "timestamp": chrono::Utc::now().timestamp_millis(),
        }),
    )
}

/// Challenge issuance handler
fn handle_initiate(body: &[u8], authenticator: &Authenticator) -> (StatusCode, serde_json::Value) {
    let request: InitiateRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(_) => return error_response(&GateError::InvalidInput("request body")),
    };

    let Some(address) = request.address else {
        return error_response(&GateError::InvalidInput("address"));
    };

    match authenticator.initiate(&address) {
        Ok(grant) => (
            StatusCode::OK,
            json!({
                "code": grant.code,
                "message": grant.message,
                "instructions": grant.instructions,
            }),
        ),
        Err(err) => error_response(&err),
    }
}

/// Signature verification handler
fn handle_verify(body: &[u8], authenticator: &Authenticator) -> (StatusCode, serde_json::Value) {
    let request: VerifyRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(_) => return verify_error_response(&GateError::InvalidInput("request body")),
    };

    let Some(address) = request.address else {
        return verify_error_response(&GateError::InvalidInput("address"));
    };
    let Some(signature) = request.signature else {
        return verify_error_response(&GateError::InvalidInput("signature"));
    };

    match authenticator.verify(&address, &signature) {
        Ok(grant) => (
            StatusCode::OK,
            json!({
                "success": true,
                "token": grant.token.as_str(),
                "message": "Wallet ownership verified",
            }),
        ),
        Err(err) => verify_error_response(&err),
    }
}

/// Map a flow error to its HTTP status
fn status_for(err: &GateError) -> StatusCode {
    match err {
        GateError::InvalidInput(_)
        | GateError::InvalidAddress(_)
        | GateError::MalformedSignature(_) => StatusCode::BAD_REQUEST,
        GateError::NotWhitelisted => StatusCode::FORBIDDEN,
        GateError::NoChallenge => StatusCode::NOT_FOUND,
        GateError::VerificationFailed => StatusCode::UNAUTHORIZED,
        GateError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Error body for initiation failures.
///
/// Internal faults are logged server-side and surfaced without detail.
fn error_response(err: &GateError) -> (StatusCode, serde_json::Value) {
    if let GateError::Internal(detail) = err {
        error!("Internal error: {}", detail);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": "Internal server error"}),
        );
    }

    (status_for(err), json!({"error": err.to_string()}))
}

/// Error body for verification failures, which also carry `success: false`.
fn verify_error_response(err: &GateError) -> (StatusCode, serde_json::Value) {
    let (status, mut body) = error_response(err);
    if let Some(object) = body.as_object_mut() {
        object.insert("success".to_string(), json!(false));
    }
    (status, body)
}
