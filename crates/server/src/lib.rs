//! Server runtime: the string analysis service and its HTTP routes.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use textprint_core::{
    errors::{CoreError, ValidationError},
    filter::{self, FilterParams, FilterSpec},
    model::AnalyzedRecord,
    nl::{self, InterpretedQuery},
    store::RecordStore,
    traits::Storage,
    validate::value_from_json,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("io: {0}")]
    Io(String),
}

#[derive(Clone, Debug, Serialize)]
pub struct ListResponse {
    pub data: Vec<AnalyzedRecord>,
    pub count: usize,
    pub filters_applied: FilterSpec,
}

#[derive(Clone, Debug, Serialize)]
pub struct NlResponse {
    pub data: Vec<AnalyzedRecord>,
    pub count: usize,
    pub interpreted_query: InterpretedQuery,
}

pub struct Server<S> {
    store: Arc<RecordStore<S>>,
}

impl<S> Clone for Server<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> Server<S>
where
    S: Storage + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self {
            store: Arc::new(RecordStore::new(storage)),
        }
    }

    pub fn store(&self) -> &RecordStore<S> {
        &self.store
    }

    /// Run `op` against the store on the blocking pool.
    async fn blocking<T, F>(&self, op: F) -> Result<T, CoreError>
    where
        T: Send + 'static,
        F: FnOnce(&RecordStore<S>) -> Result<T, CoreError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(CoreError::storage)?
    }

    pub async fn create(&self, value: String) -> Result<AnalyzedRecord, CoreError> {
        self.blocking(move |store| store.insert(&value)).await
    }

    pub async fn get(&self, value: String) -> Result<AnalyzedRecord, CoreError> {
        self.blocking(move |store| store.get_by_value(&value)).await
    }

    pub async fn delete(&self, value: String) -> Result<(), CoreError> {
        self.blocking(move |store| store.delete_by_value(&value))
            .await
    }

    pub async fn list(&self, spec: FilterSpec) -> Result<ListResponse, CoreError> {
        let outcome = self
            .blocking(move |store| filter::apply(store, &spec))
            .await?;
        Ok(ListResponse {
            count: outcome.records.len(),
            data: outcome.records,
            filters_applied: outcome.filters_applied,
        })
    }

    /// Unlike [`Server::list`], an impossible length range here is reported
    /// as [`CoreError::ConflictingFilters`] instead of an empty result.
    pub async fn filter_by_natural_language(&self, query: String) -> Result<NlResponse, CoreError> {
        let interpreted = nl::translate(&query)?;
        interpreted.parsed_filters.check_conflicts()?;
        let spec = interpreted.parsed_filters.clone();
        let outcome = self
            .blocking(move |store| filter::apply(store, &spec))
            .await?;
        Ok(NlResponse {
            count: outcome.records.len(),
            data: outcome.records,
            interpreted_query: interpreted,
        })
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/healthz", get(healthz))
            .route("/strings", get(list_strings::<S>).post(create_string::<S>))
            .route(
                "/strings/filter-by-natural-language",
                get(filter_by_natural_language::<S>),
            )
            .route(
                "/strings/:value",
                get(get_string::<S>).delete(delete_string::<S>),
            )
            .route(
                "/strings/:value/*rest",
                get(get_nested_string::<S>).delete(delete_nested_string::<S>),
            )
            .with_state(self.clone())
    }

    pub async fn run_http(&self, addr: &str) -> Result<(), ServerError> {
        let bind_addr: SocketAddr = addr
            .parse()
            .map_err(|e: std::net::AddrParseError| ServerError::Io(e.to_string()))?;
        let listener = tokio::net::TcpListener::bind(bind_addr)
            .await
            .map_err(|e| ServerError::Io(e.to_string()))?;
        let shutdown_token = CancellationToken::new();
        let server_shutdown = shutdown_token.child_token();

        info!(%addr, "http server listening");
        let server = axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                server_shutdown.cancelled().await;
            })
            .into_future();
        tokio::pin!(server);

        tokio::select! {
            res = &mut server => {
                res.map_err(|e| ServerError::Io(e.to_string()))
            }
            _ = tokio::signal::ctrl_c() => {
                info!("ctrl_c received; shutting down http server");
                shutdown_token.cancel();
                server.as_mut().await.map_err(|e| ServerError::Io(e.to_string()))
            }
        }
    }
}

/// Maps core errors and body rejections onto HTTP statuses with a
/// `{"detail": ...}` body.
pub enum ApiError {
    Core(CoreError),
    Body(JsonRejection),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Body(rejection)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        let err = match self {
            Self::Core(err) => err,
            Self::Body(rejection) => return rejection.status(),
        };
        match err {
            CoreError::Validation(ValidationError::NonStringValue) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            CoreError::Validation(_) => StatusCode::BAD_REQUEST,
            CoreError::DuplicateRecord(_) => StatusCode::CONFLICT,
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::EmptyQuery | CoreError::UnparseableQuery(_) => StatusCode::BAD_REQUEST,
            CoreError::ConflictingFilters { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            CoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        let err = match self {
            Self::Core(err) => err,
            Self::Body(rejection) => return rejection.body_text(),
        };
        match err {
            CoreError::Validation(v) => v.to_string(),
            CoreError::DuplicateRecord(_) => "String already exists".to_string(),
            CoreError::NotFound(_) => "Not found".to_string(),
            CoreError::EmptyQuery => "empty query".to_string(),
            CoreError::UnparseableQuery(_) => "unable to parse natural language query".to_string(),
            CoreError::ConflictingFilters { .. } => "Conflicting filters in parsed query".to_string(),
            CoreError::Storage(_) => "internal error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Core(err) if !err.is_expected() => error!(error = %err, "request failed"),
            Self::Core(err) => debug!(status = status.as_u16(), error = %err, "request rejected"),
            Self::Body(rejection) => {
                debug!(status = status.as_u16(), error = %rejection, "request body rejected")
            }
        }
        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct NlParams {
    query: Option<String>,
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({"ok": true}))
}

async fn create_string<S>(
    State(server): State<Server<S>>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<(StatusCode, Json<AnalyzedRecord>), ApiError>
where
    S: Storage + Send + Sync + 'static,
{
    let Json(body) = body?;
    let value = value_from_json(&body).map_err(CoreError::from)?;
    let record = server.create(value).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn list_strings<S>(
    State(server): State<Server<S>>,
    Query(params): Query<FilterParams>,
) -> Result<Json<ListResponse>, ApiError>
where
    S: Storage + Send + Sync + 'static,
{
    let spec = params.parse().map_err(CoreError::from)?;
    Ok(Json(server.list(spec).await?))
}

async fn get_string<S>(
    State(server): State<Server<S>>,
    Path(value): Path<String>,
) -> Result<Json<AnalyzedRecord>, ApiError>
where
    S: Storage + Send + Sync + 'static,
{
    Ok(Json(server.get(value).await?))
}

/// Values containing `/` arrive split across the wildcard.
async fn get_nested_string<S>(
    State(server): State<Server<S>>,
    Path((head, rest)): Path<(String, String)>,
) -> Result<Json<AnalyzedRecord>, ApiError>
where
    S: Storage + Send + Sync + 'static,
{
    Ok(Json(server.get(format!("{head}/{rest}")).await?))
}

async fn delete_nested_string<S>(
    State(server): State<Server<S>>,
    Path((head, rest)): Path<(String, String)>,
) -> Result<StatusCode, ApiError>
where
    S: Storage + Send + Sync + 'static,
{
    server.delete(format!("{head}/{rest}")).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_string<S>(
    State(server): State<Server<S>>,
    Path(value): Path<String>,
) -> Result<StatusCode, ApiError>
where
    S: Storage + Send + Sync + 'static,
{
    server.delete(value).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn filter_by_natural_language<S>(
    State(server): State<Server<S>>,
    Query(params): Query<NlParams>,
) -> Response
where
    S: Storage + Send + Sync + 'static,
{
    let Some(query) = params.query.filter(|q| !q.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "query parameter is required"})),
        )
            .into_response();
    };
    match server.filter_by_natural_language(query).await {
        Ok(resp) => Json(resp).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}
