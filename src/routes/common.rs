//! Response and request-body helpers shared by the route handlers

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, CONTENT_TYPE,
};
use hyper::{Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::error;

use crate::types::AdminError;

/// Largest accepted request body (the full insights document fits comfortably)
pub const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// Body type of every response
pub type ResponseBody = Full<Bytes>;

/// Error bounds shared by every request body type the router accepts
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Serialize)]
struct Success<'a, T: Serialize> {
    success: bool,
    data: &'a T,
}

#[derive(Serialize)]
struct Failure {
    success: bool,
    error: String,
}

fn with_cors(response: &mut Response<ResponseBody>) {
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
}

/// Serialize `body` as a JSON response with CORS headers
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<ResponseBody> {
    let (status, json) = match serde_json::to_vec(body) {
        Ok(json) => (status, json),
        Err(e) => {
            error!("Failed to serialize response: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                br#"{"success":false,"error":"Internal server error"}"#.to_vec(),
            )
        }
    };

    let mut response = Response::new(Full::new(Bytes::from(json)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    with_cors(&mut response);
    response
}

/// `{"success": true, "data": ...}`
pub fn success_response<T: Serialize>(data: &T) -> Response<ResponseBody> {
    json_response(
        StatusCode::OK,
        &Success {
            success: true,
            data,
        },
    )
}

/// `{"success": false, "error": ...}` with the error's status
pub fn error_response(err: AdminError) -> Response<ResponseBody> {
    if err.status_code().is_server_error() {
        error!(error = %err, "Request failed");
    }
    let (status, message) = err.into_status_code_and_body();
    json_response(
        status,
        &Failure {
            success: false,
            error: message,
        },
    )
}

/// CORS preflight
pub fn cors_preflight() -> Response<ResponseBody> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::NO_CONTENT;
    with_cors(&mut response);
    response
        .headers_mut()
        .insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400"));
    response
}

/// Collect the request body (bounded) and parse it as JSON
pub async fn parse_json_body<T, B>(req: Request<B>) -> Result<T, AdminError>
where
    T: DeserializeOwned,
    B: Body,
    B::Error: Into<BoxError>,
{
    let collected = Limited::new(req.into_body(), MAX_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| {
            if e.is::<LengthLimitError>() {
                AdminError::BadRequest("Request body too large".into())
            } else {
                AdminError::BadRequest(format!("Failed to read body: {e}"))
            }
        })?;

    serde_json::from_slice(&collected.to_bytes())
        .map_err(|e| AdminError::BadRequest(format!("Invalid JSON body: {e}")))
}
