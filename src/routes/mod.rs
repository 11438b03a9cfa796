//! HTTP routes for the admin API

pub mod auth_routes;
pub mod budget;
pub mod common;
pub mod content;
pub mod health;

use hyper::{Method, Request, Response};

use crate::server::AppState;
use crate::store::Collection;
use crate::types::AdminError;
pub use common::{
    cors_preflight, error_response, json_response, parse_json_body, success_response, BoxError,
    ResponseBody, MAX_BODY_BYTES,
};
pub use health::health_check;

const VIGNETTES_PREFIX: &str = "/api/admin/vignettes/";

/// `{phase}/{persona}` under the vignettes path
fn vignette_segments(path: &str) -> Option<(&str, &str)> {
    let rest = path.strip_prefix(VIGNETTES_PREFIX)?;
    let (phase, persona) = rest.split_once('/')?;
    if phase.is_empty() || persona.is_empty() || persona.contains('/') {
        return None;
    }
    Some((phase, persona))
}

fn method_not_allowed(method: &Method, path: &str) -> Response<ResponseBody> {
    error_response(AdminError::MethodNotAllowed(format!(
        "{method} not allowed on {path}"
    )))
}

/// Dispatch a request to its handler.
///
/// Generic over the body so tests can drive it with in-memory bodies.
pub async fn route<B>(state: &AppState, req: Request<B>) -> Response<ResponseBody>
where
    B: hyper::body::Body,
    B::Error: Into<BoxError>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    if method == Method::OPTIONS {
        return cors_preflight();
    }

    match (&method, path.as_str()) {
        (&Method::GET, "/api/health") => health_check(state).await,

        (&Method::POST, "/api/admin/auth") => auth_routes::handle_login(req, state).await,

        (&Method::GET, "/api/admin/insights") => content::get_insights(req, state).await,
        (&Method::POST, "/api/admin/insights") => content::save_insights(req, state).await,
        (&Method::POST, "/api/admin/insights/bulk") => {
            content::save_insights_bulk(req, state).await
        }

        (&Method::GET, "/api/admin/phases") => {
            content::get_document(req, state, Collection::Phases).await
        }
        (&Method::POST, "/api/admin/phases") => {
            content::save_document(req, state, Collection::Phases).await
        }
        (&Method::GET, "/api/admin/closings") => {
            content::get_document(req, state, Collection::Closings).await
        }
        (&Method::POST, "/api/admin/closings") => {
            content::save_document(req, state, Collection::Closings).await
        }
        (&Method::GET, "/api/admin/vignettes") => {
            content::get_document(req, state, Collection::Vignettes).await
        }
        (&Method::POST, "/api/admin/vignettes") => {
            content::save_document(req, state, Collection::Vignettes).await
        }

        (&Method::GET, "/api/admin/budget") => budget::get_status(req, state).await,
        (&Method::POST, "/api/admin/budget/check") => budget::check_request(req, state).await,
        (&Method::POST, "/api/admin/budget/usage") => budget::track_usage(req, state).await,
        (&Method::POST, "/api/admin/budget/reset") => budget::reset(req, state).await,

        (_, "/api/health")
        | (_, "/api/admin/auth")
        | (_, "/api/admin/insights")
        | (_, "/api/admin/insights/bulk")
        | (_, "/api/admin/phases")
        | (_, "/api/admin/closings")
        | (_, "/api/admin/vignettes")
        | (_, "/api/admin/budget")
        | (_, "/api/admin/budget/check")
        | (_, "/api/admin/budget/usage")
        | (_, "/api/admin/budget/reset") => method_not_allowed(&method, &path),

        (_, p) => match vignette_segments(p) {
            Some((phase, persona)) if method == Method::GET => {
                content::get_vignettes_for(req, state, phase, persona).await
            }
            Some(_) => method_not_allowed(&method, &path),
            None => error_response(AdminError::NotFound(format!("No route for {path}"))),
        },
    }
}
