//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo; one task per connection.

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::auth::{AdminCredential, JwtValidator};
use crate::budget::BudgetProtection;
use crate::config::Args;
use crate::content::ContentService;
use crate::logging::AuditLogger;
use crate::routes::{self, ResponseBody};
use crate::store::{DocumentStore, FileDocumentStore};
use crate::types::AdminError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Insights, phases, closings and vignettes
    pub content: ContentService,
    pub jwt: JwtValidator,
    /// The single admin account
    pub credential: AdminCredential,
    pub budget: BudgetProtection,
    pub audit: AuditLogger,
}

impl AppState {
    /// State backed by JSON files in `args.data_dir`
    pub fn new(args: Args) -> Result<Self, AdminError> {
        let store = Arc::new(FileDocumentStore::new(args.data_dir.clone()));
        let budget = BudgetProtection::new(args.budget.limits());
        Self::with_parts(args, store, budget)
    }

    /// State over an explicit store and budget service
    pub fn with_parts(
        args: Args,
        store: Arc<dyn DocumentStore>,
        budget: BudgetProtection,
    ) -> Result<Self, AdminError> {
        let secret = args
            .jwt_secret()
            .ok_or_else(|| AdminError::Config("JWT_SECRET is required in production mode".into()))?;
        let jwt = JwtValidator::new(secret, args.jwt_expiry_seconds)?;
        let credential = AdminCredential::from_args(&args);
        let audit = AuditLogger::new(args.node_id.to_string());

        Ok(Self {
            content: ContentService::new(store),
            jwt,
            credential,
            budget,
            audit,
            args,
        })
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), AdminError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "MoodCycle admin API listening on {} as node {}",
        state.args.listen, state.args.node_id
    );
    info!(data_dir = %state.args.data_dir.display(), "Serving content documents");

    if state.args.dev_mode {
        warn!("Development mode enabled - do not use in production");
    }
    if !state.credential.is_configured() {
        warn!("No admin password configured - every login will be refused");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<ResponseBody>, Infallible> {
    info!("[{}] {} {}", addr, req.method(), req.uri().path());
    Ok(routes::route(&state, req).await)
}
