use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use serde_json::{Value, json};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;
use weather_proxy_core::{
    ApiConfig, Config, ParamValue, Params, PlaceId, PlaceStore, Weather, WeatherApiClient,
    WeatherError,
};

#[derive(Clone)]
pub struct AppState {
    api: Arc<ApiConfig>,
    http: reqwest::Client,
    store: Arc<Mutex<PlaceStore>>,
}

impl AppState {
    pub fn new(api: ApiConfig) -> Self {
        Self {
            api: Arc::new(api),
            http: reqwest::Client::new(),
            store: Arc::new(Mutex::new(PlaceStore::new())),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/weather", get(weather))
        .route("/places", get(places))
        .with_state(state)
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    if config.require_token().is_err() {
        tracing::warn!("no API token configured; requests must carry their own `key` parameter");
    }

    let addr = config.server.bind.clone();
    let app = router(AppState::new(config.api));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://{addr}");

    axum::serve(listener, app).await.context("Web server stopped unexpectedly")
}

/// Error body returned to HTTP callers.
struct ApiError(WeatherError);

impl From<WeatherError> for ApiError {
    fn from(err: WeatherError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            WeatherError::InvalidState(_) | WeatherError::Validation(_) => StatusCode::BAD_REQUEST,
            WeatherError::Transport(_) | WeatherError::Decode(_) => StatusCode::BAD_GATEWAY,
            WeatherError::NotFound(_) => StatusCode::NOT_FOUND,
            WeatherError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::warn!(%status, error = %self.0, "request failed");

        (status, Json(json!({ "error": self.0.user_message() }))).into_response()
    }
}

async fn weather(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    if query.is_empty() {
        return Ok(Json(json!({
            "message": "Welcome to the weather proxy!",
            "path": "/weather",
        })));
    }

    let params: Params = query
        .iter()
        .map(|(name, value)| {
            let value = value.parse::<ParamValue>().unwrap_or_else(|never| match never {});
            (name.as_str(), value)
        })
        .collect();

    let mut client = WeatherApiClient::with_http_client(
        state.api.token.clone().unwrap_or_default(),
        &state.api,
        state.http.clone(),
    );
    client.set_params(params);

    let response = client.send().await?;

    match state.store.lock().await.record_response(&response) {
        Ok(Some(place)) => tracing::debug!(%place, "recorded weather"),
        Ok(None) => {}
        Err(err) => tracing::warn!(error = %err, "could not record weather"),
    }

    Ok(Json(Value::Object(response)))
}

#[derive(Debug, Serialize)]
struct PlaceView {
    id: PlaceId,
    name: String,
    country: String,
    weather: Option<Weather>,
}

async fn places(State(state): State<AppState>) -> Result<Json<Vec<PlaceView>>, ApiError> {
    let store = state.store.lock().await;

    let views = store
        .places()
        .map(|p| {
            Ok(PlaceView {
                id: p.id(),
                name: p.name().to_string(),
                country: p.country().to_string(),
                weather: store.weather_of(p.id())?.cloned(),
            })
        })
        .collect::<Result<Vec<_>, WeatherError>>()?;

    Ok(Json(views))
}
