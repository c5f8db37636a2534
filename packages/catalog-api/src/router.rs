//! Matchit routing configuration.

use std::sync::Arc;

use hyper::{body::Bytes, Method, Request, Response};
use matchit::Router as MatchitRouter;

use crate::handlers::{self, RequestBody, RouteParams};
use catalog_core::{config::CatalogConfig, Catalog};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Catalog service
    pub catalog: Arc<Catalog>,
    /// Catalog configuration
    pub config: Arc<CatalogConfig>,
}

/// HTTP request router.
pub struct Router {
    inner: MatchitRouter<RouteHandler>,
    state: AppState,
}

impl Router {
    /// Creates a router serving the data file endpoints.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let mut router = MatchitRouter::new();

        router
            .insert("/api/datafiles", RouteHandler::Files)
            .expect("Failed to insert /api/datafiles route");
        router
            .insert("/api/datafiles/{file_id}", RouteHandler::File)
            .expect("Failed to insert /api/datafiles/{file_id} route");
        router
            .insert("/api/datafiles/{file_id}/fields", RouteHandler::Fields)
            .expect("Failed to insert /api/datafiles/{file_id}/fields route");
        router
            .insert(
                "/api/datafiles/{file_id}/fields/{field_id}",
                RouteHandler::Field,
            )
            .expect("Failed to insert /api/datafiles/{file_id}/fields/{field_id} route");
        router
            .insert(
                "/api/datafiles/{file_id}/fields/{field_id}/validdata",
                RouteHandler::ValidDataList,
            )
            .expect("Failed to insert validdata collection route");
        router
            .insert(
                "/api/datafiles/{file_id}/fields/{field_id}/validdata/{valid_data_id}",
                RouteHandler::ValidData,
            )
            .expect("Failed to insert validdata item route");

        let config = Arc::new(catalog.config().clone());
        Self {
            inner: router,
            state: AppState { catalog, config },
        }
    }

    /// Returns the shared state handed to every handler.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Routes an incoming request to the appropriate handler.
    ///
    /// # Arguments
    /// * `req` - HTTP request
    ///
    /// # Returns
    /// `Result<Response<Bytes>, RouterError>` containing the response or an error.
    pub async fn route<B>(&self, req: Request<B>) -> Result<Response<Bytes>, RouterError>
    where
        B: RequestBody,
    {
        let path = req.uri().path().to_string();

        let (handler, params) = match self.inner.at(&path) {
            Ok(matched) => (*matched.value, RouteParams::from_matched(&matched.params)),
            Err(_) => {
                return Err(RouterError::NotFound(format!(
                    "No route found for {}",
                    path
                )))
            }
        };
        handler.handle(req, params, self.state.clone()).await
    }

    /// Routes a request and renders any error as its JSON error response.
    pub async fn respond<B>(&self, req: Request<B>) -> Response<Bytes>
    where
        B: RequestBody,
    {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        match self.route(req).await {
            Ok(response) => response,
            Err(err) => {
                if err.status() >= 500 {
                    tracing::error!(%method, path, "Request failed: {}", err);
                } else {
                    tracing::debug!(%method, path, "Request rejected: {}", err);
                }
                err.into()
            }
        }
    }
}

/// Route handler function.
#[derive(Debug, Clone, Copy)]
enum RouteHandler {
    Files,
    File,
    Fields,
    Field,
    ValidDataList,
    ValidData,
}

impl RouteHandler {
    /// Handles a request with the given route parameters.
    async fn handle<B>(
        self,
        req: Request<B>,
        params: RouteParams,
        state: AppState,
    ) -> Result<Response<Bytes>, RouterError>
    where
        B: RequestBody,
    {
        let method = req.method().clone();
        match (self, method) {
            (RouteHandler::Files, Method::GET) => handlers::list_files(req, state).await,
            (RouteHandler::Files, Method::POST) => handlers::create_file(req, state).await,
            (RouteHandler::File, Method::GET) => handlers::get_file(req, params, state).await,
            (RouteHandler::File, Method::PATCH) => handlers::update_file(req, params, state).await,
            (RouteHandler::File, Method::DELETE) => {
                handlers::delete_file(req, params, state).await
            }
            (RouteHandler::Fields, Method::POST) => {
                handlers::create_field(req, params, state).await
            }
            (RouteHandler::Field, Method::PATCH) => {
                handlers::update_field(req, params, state).await
            }
            (RouteHandler::Field, Method::DELETE) => {
                handlers::delete_field(req, params, state).await
            }
            (RouteHandler::ValidDataList, Method::POST) => {
                handlers::create_valid_data(req, params, state).await
            }
            (RouteHandler::ValidData, Method::PATCH) => {
                handlers::update_valid_data(req, params, state).await
            }
            (RouteHandler::ValidData, Method::DELETE) => {
                handlers::delete_valid_data(req, params, state).await
            }
            _ => Err(RouterError::MethodNotAllowed),
        }
    }
}

/// Router error type.
#[derive(Debug)]
pub enum RouterError {
    MethodNotAllowed,
    InternalError(String),
    Timeout,
    BadRequest(String),
    NotFound(String),
    /// A catalog record addressed by the request does not exist
    RecordNotFound {
        entity: &'static str,
        id: String,
    },
    Unauthorized(String),
    Forbidden(String),
}

impl RouterError {
    /// HTTP status code for this error.
    pub fn status(&self) -> u16 {
        match self {
            RouterError::MethodNotAllowed => 405,
            RouterError::InternalError(_) => 500,
            RouterError::Timeout => 408,
            RouterError::BadRequest(_) => 400,
            RouterError::NotFound(_) | RouterError::RecordNotFound { .. } => 404,
            RouterError::Unauthorized(_) => 401,
            RouterError::Forbidden(_) => 403,
        }
    }
}

impl std::fmt::Display for RouterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouterError::MethodNotAllowed => write!(f, "Method Not Allowed"),
            RouterError::InternalError(msg) => write!(f, "Internal Error: {}", msg),
            RouterError::Timeout => write!(f, "Request Timeout"),
            RouterError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            RouterError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            RouterError::RecordNotFound { entity, id } => {
                write!(f, "Not Found: {} with ID {} not found.", entity, id)
            }
            RouterError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            RouterError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
        }
    }
}

impl std::error::Error for RouterError {}

impl From<RouterError> for Response<Bytes> {
    fn from(err: RouterError) -> Self {
        let status = err.status();
        let (message, details) = match &err {
            RouterError::MethodNotAllowed => ("Method Not Allowed".to_string(), None),
            RouterError::Timeout => ("Request Timeout".to_string(), None),
            RouterError::RecordNotFound { entity, id } => (
                format!("{} with ID {} not found.", entity, id),
                Some(serde_json::json!({"entity": entity, "id": id})),
            ),
            RouterError::InternalError(msg)
            | RouterError::BadRequest(msg)
            | RouterError::NotFound(msg)
            | RouterError::Unauthorized(msg)
            | RouterError::Forbidden(msg) => (msg.clone(), None),
        };

        let error_response = handlers::error_response(status, message, details);
        let body = serde_json::to_vec(&error_response)
            .unwrap_or_else(|e| format!("{{\"success\":false,\"error\":{{\"code\":\"500\",\"message\":\"Failed to serialize error: {}\"}}}}", e).into_bytes());

        Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .body(Bytes::from(body))
            .unwrap_or_else(|_| {
                let mut fallback = Response::new(Bytes::from("Internal Server Error"));
                *fallback.status_mut() = hyper::StatusCode::INTERNAL_SERVER_ERROR;
                fallback
            })
    }
}
