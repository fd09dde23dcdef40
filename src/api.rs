//! REST API for the pallet layout service.
//!
//! Provides HTTP endpoints for communication with the frontend.
//! Uses Axum as the web framework and supports CORS.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::{StatusCode, Uri, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use std::sync::OnceLock;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::config::{ApiConfig, CalculatorConfig};
use crate::layout::{
    LayoutPlan, PlacementSummary, Strategy, compute_layout, compute_layout_with_progress,
};
use crate::model::{ItemSpec, PalletSpec, ValidationError};

#[derive(Clone)]
struct ApiState {
    calculator_config: CalculatorConfig,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

// SRI hashes verified against https://unpkg.com/swagger-ui-dist@5.17.14/ on 2025-10-29.
const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>pack-it-flat API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-standalone-preset.js"
            integrity="sha384-2YH8WDRaj7V2OqU/trsmzSagmk/E2SutiCsGkdgoQwC9pNUJV1u/141DHB6jgs8t"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                const ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                    presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
                    layout: "StandaloneLayout",
                });
                window.ui = ui;
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Embedded Web Assets (HTML, CSS, JS)
#[derive(RustEmbed)]
#[folder = "web/"]
struct WebAssets;

/// Request structure for the layout endpoints.
///
/// `items` carries the rows of the input table; row problems are reported
/// per row in the response and never reject the whole request.
#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "pallet": { "width": 1200.0, "depth": 1000.0 },
        "items": [
            {
                "model": "BCI65",
                "width": 300.0,
                "depth": 180.0,
                "height": 200.0,
                "weight": 20.0,
                "quantity": 12,
                "allow_rotation": false
            }
        ],
        "strategy": "shelf",
        "allow_rotations": null
    })
)]
pub struct LayoutRequest {
    pub pallet: PalletSpec,
    pub items: Vec<ItemSpec>,
    pub strategy: Strategy,
    #[serde(default)]
    #[schema(nullable = true)]
    pub allow_rotations: Option<bool>,
}

#[derive(Debug)]
struct ValidatedLayoutRequest {
    pallet: PalletSpec,
    items: Vec<ItemSpec>,
    strategy: Strategy,
    allow_rotations: Option<bool>,
}

impl ValidatedLayoutRequest {
    fn item_count(&self) -> usize {
        self.items.len()
    }

    fn into_parts(self) -> (PalletSpec, Vec<ItemSpec>, Strategy, Option<bool>) {
        (self.pallet, self.items, self.strategy, self.allow_rotations)
    }
}

#[derive(Debug)]
enum LayoutRequestValidationError {
    InvalidPallet(ValidationError),
}

impl LayoutRequest {
    fn into_validated(self) -> Result<ValidatedLayoutRequest, LayoutRequestValidationError> {
        self.pallet
            .validate()
            .map_err(LayoutRequestValidationError::InvalidPallet)?;

        Ok(ValidatedLayoutRequest {
            pallet: self.pallet,
            items: self.items,
            strategy: self.strategy,
            allow_rotations: self.allow_rotations,
        })
    }
}

/// Response structure with all computed pallet layers.
///
/// # Fields
/// * `layers` - Computed layers with placed units
/// * `summary` - Requested-vs-placed accounting per accepted item row
/// * `rejected` - Input rows that failed validation
/// * `warnings` - Non-fatal findings such as partial placements
#[derive(Serialize, ToSchema)]
pub struct LayoutResponse {
    pub layers: Vec<LayerResponse>,
    pub summary: Vec<PlacementSummary>,
    pub rejected: Vec<RejectedRowResponse>,
    pub warnings: Vec<WarningResponse>,
    pub is_complete: bool,
    pub total_weight: f64,
}

/// Single pallet layer with placements and centroid data.
///
/// # Fields
/// * `id` - Layer number (1-based)
/// * `placed` - List of placed units with positions
/// * `centroid` - Weight centroid, omitted at zero placed weight
/// * `centroid_offset` - Absolute centroid offset from the pallet center per axis
#[derive(Serialize, ToSchema)]
pub struct LayerResponse {
    pub id: usize,
    pub pallet: PalletSpec,
    pub placed: Vec<PlacedResponse>,
    pub total_weight: f64,
    #[schema(value_type = Option<[f64; 2]>)]
    pub centroid: Option<(f64, f64)>,
    #[schema(value_type = Option<[f64; 2]>)]
    pub centroid_offset: Option<(f64, f64)>,
}

/// Single placed unit in the response.
///
/// # Fields
/// * `model` - Model name of the originating row
/// * `pos` - Lower-left corner (x, y) on the pallet
/// * `size` - Effective footprint actually used
/// * `rotated` - Whether the 90° orientation was applied
#[derive(Serialize, ToSchema)]
pub struct PlacedResponse {
    pub model: String,
    #[schema(value_type = [f64; 2], example = json!([150.0, 140.0]))]
    pub pos: (f64, f64),
    #[schema(value_type = [f64; 2], example = json!([300.0, 180.0]))]
    pub size: (f64, f64),
    pub rotated: bool,
    pub weight: f64,
}

/// Input row that failed validation.
#[derive(Serialize, ToSchema)]
pub struct RejectedRowResponse {
    pub row: usize,
    pub model: String,
    pub reason_code: String,
    pub reason: String,
}

/// Non-fatal finding surfaced alongside the layout.
#[derive(Serialize, ToSchema)]
pub struct WarningResponse {
    pub code: String,
    pub severity: String,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

fn pallet_config_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid pallet configuration",
        details,
    )
}

fn layout_error_response(err: crate::layout::LayoutError) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Layout computation failed",
        err.to_string(),
    )
}

fn parse_layout_request(
    payload: Result<Json<LayoutRequest>, JsonRejection>,
) -> Result<ValidatedLayoutRequest, Response> {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(err) => return Err(json_deserialize_error(err)),
    };

    match payload.into_validated() {
        Ok(validated) => Ok(validated),
        Err(LayoutRequestValidationError::InvalidPallet(err)) => {
            Err(pallet_config_error(err.to_string()))
        }
    }
}

impl LayoutResponse {
    /// Creates a LayoutResponse from a LayoutPlan.
    pub fn from_plan(plan: LayoutPlan) -> Self {
        let is_complete = plan.is_complete();
        let total_weight = plan.total_placed_weight();
        let LayoutPlan {
            layers,
            summary,
            rejected,
            warnings,
        } = plan;

        Self {
            layers: layers
                .into_iter()
                .enumerate()
                .map(|(i, layer)| {
                    let layer_weight = layer.total_weight();
                    let centroid = layer.centroid();
                    let centroid_offset = layer.centroid_offset();
                    LayerResponse {
                        id: i + 1,
                        pallet: layer.pallet,
                        placed: layer
                            .placed
                            .into_iter()
                            .map(|p| PlacedResponse {
                                model: p.model,
                                pos: p.position,
                                size: p.size,
                                rotated: p.rotated,
                                weight: p.weight,
                            })
                            .collect(),
                        total_weight: layer_weight,
                        centroid,
                        centroid_offset,
                    }
                })
                .collect(),
            summary,
            rejected: rejected
                .into_iter()
                .map(|entry| RejectedRowResponse {
                    row: entry.row,
                    model: entry.model,
                    reason_code: entry.reason.code().to_string(),
                    reason: entry.reason.to_string(),
                })
                .collect(),
            warnings: warnings
                .into_iter()
                .map(|warning| WarningResponse {
                    code: warning.code().to_string(),
                    severity: warning.severity().as_str().to_string(),
                    message: warning.to_string(),
                })
                .collect(),
            is_complete,
            total_weight,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_layout, handle_layout_stream),
    components(
        schemas(
            LayoutRequest,
            LayoutResponse,
            LayerResponse,
            PlacedResponse,
            RejectedRowResponse,
            WarningResponse,
            ErrorResponse,
            PalletSpec,
            ItemSpec,
            PlacementSummary,
            Strategy
        )
    ),
    tags((name = "layout", description = "Endpoints for layer layout computation"))
)]
struct ApiDoc;

/// Starts the API server.
///
/// Configures CORS for cross-origin requests from the frontend.
/// Blocks until the server is terminated.
pub async fn start_api_server(config: ApiConfig, calculator_config: CalculatorConfig) {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let state = ApiState { calculator_config };

    let app = Router::new()
        // API endpoints
        .route("/layout", post(handle_layout))
        .route("/layout_stream", post(handle_layout_stream))
        // API documentation
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        // Web-UI (embedded)
        .route("/", get(serve_index))
        .route("/{*path}", get(serve_static))
        .layer(cors)
        .with_state(state);

    let addr = config.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            panic!("❌ Could not bind API server to {}: {}", addr, err);
        }
    };

    let display_host = config.display_host().to_string();
    println!(
        "🚀 Server running on http://{}:{}",
        display_host,
        config.port()
    );
    if config.binds_to_all_interfaces() && config.uses_default_host() {
        println!("💡 Local access: http://localhost:{}", config.port());
    }
    println!("📦 API Endpoints:");
    println!("   - POST /layout");
    println!("   - POST /layout_stream");
    println!("📑 Documentation:");
    println!("   - GET /docs");
    println!("   - GET /docs/openapi.json");
    println!("🌐 Web-UI: http://{}:{}", display_host, config.port());

    if let Err(err) = axum::serve(listener, app).await {
        eprintln!("❌ API server terminated with an error: {err}");
    }
}

/// Handler for POST /layout endpoint.
///
/// Takes a pallet footprint and a table of item rows and computes the
/// 1-tier loading pattern for the selected strategy.
///
/// # Parameters
/// * `payload` - JSON payload with pallet, items, and strategy
///
/// # Returns
/// JSON response with layers, placements, accounting, and warnings
#[utoipa::path(
    post,
    path = "/layout",
    request_body = LayoutRequest,
    responses(
        (status = 200, description = "Successfully computed layout", body = LayoutResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request, invalid pallet, or infeasible grid layout",
            body = ErrorResponse
        )
    ),
    tag = "layout"
)]
async fn handle_layout(
    State(state): State<ApiState>,
    payload: Result<Json<LayoutRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match parse_layout_request(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let item_count = request.item_count();
    let (pallet, items, strategy, allow_rotations_override) = request.into_parts();

    println!(
        "📥 New layout request: {} item rows, strategy {:?}",
        item_count, strategy
    );
    let mut layout_config = state.calculator_config.layout_config();
    if let Some(allow_rotations) = allow_rotations_override {
        layout_config.allow_rotation_override = Some(allow_rotations);
    }

    let plan = match compute_layout(&pallet, &items, strategy, layout_config) {
        Ok(plan) => plan,
        Err(err) => return layout_error_response(err),
    };
    println!(
        "📦 Result: {} layers, {} of {} units placed",
        plan.layer_count(),
        plan.placed_units(),
        plan.requested_units()
    );

    let response = LayoutResponse::from_plan(plan);
    (StatusCode::OK, Json(response)).into_response()
}

/// Handler for POST /layout_stream endpoint (SSE).
///
/// Streams layout events in real-time as Server-Sent Events
/// (text/event-stream). The frontend can visualize placements live
/// without waiting for the complete result.
#[utoipa::path(
    post,
    path = "/layout_stream",
    request_body = LayoutRequest,
    responses(
        (
            status = 200,
            description = "Streams layout events in real-time",
            content_type = "text/event-stream",
            body = String
        ),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request or pallet configuration",
            body = ErrorResponse
        )
    ),
    tag = "layout"
)]
async fn handle_layout_stream(
    State(state): State<ApiState>,
    payload: Result<Json<LayoutRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match parse_layout_request(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let (pallet, items, strategy, allow_rotations_override) = request.into_parts();

    let (tx, rx) = mpsc::channel::<String>(32);

    let mut layout_config = state.calculator_config.layout_config();
    if let Some(allow_rotations) = allow_rotations_override {
        layout_config.allow_rotation_override = Some(allow_rotations);
    }

    tokio::task::spawn_blocking(move || {
        let result =
            compute_layout_with_progress(&pallet, &items, strategy, layout_config, |evt| {
                if let Ok(json) = serde_json::to_string(evt) {
                    if tx.blocking_send(json).is_err() {
                        // Receiver has closed the stream; remaining events are discarded.
                        return;
                    }
                }
            });
        if let Err(err) = result {
            let event = json!({
                "type": "Error",
                "code": err.code(),
                "message": err.to_string(),
            });
            let _ = tx.blocking_send(event.to_string());
        }
    });

    let stream = ReceiverStream::new(rx)
        .map(|msg| Ok::<_, std::convert::Infallible>(Event::default().data(msg)));
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(std::time::Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

/// Serves the index.html main page
async fn serve_index() -> Response {
    match WebAssets::get("index.html") {
        Some(content) => Html(content.data).into_response(),
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}

/// Serves static assets (JS, CSS, etc.)
async fn serve_static(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');

    match WebAssets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.as_ref())], content.data).into_response()
        }
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}

async fn serve_openapi_json(State(_state): State<ApiState>) -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui(State(_state): State<ApiState>) -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
