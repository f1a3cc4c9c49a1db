use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, Query, State, multipart::Field, rejection::JsonRejection,
    },
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::delivery::DeliveryUpdater;
use crate::error::DeliveryError;
use crate::gateway::google::{DriveClient, SheetsClient};
use crate::gateway::{FileStore, SheetGateway};
use crate::layout::SheetLayout;
use crate::model::CustomerRecord;
use crate::proof::{DEFAULT_VIDEO_MIME, ProofUploader};
use crate::resolver::CustomerSheet;
use crate::video::VideoLinkUpdater;

pub struct AppState {
    customers: CustomerSheet,
    deliveries: DeliveryUpdater,
    proofs: ProofUploader,
}

impl AppState {
    /// Wire every component to the same gateways and layout
    pub fn new(
        sheet: Arc<dyn SheetGateway>,
        store: Arc<dyn FileStore>,
        layout: SheetLayout,
        upload_folder: Option<String>,
    ) -> Self {
        let layout = Arc::new(layout);
        let links = VideoLinkUpdater::new(sheet.clone(), layout.clone());
        AppState {
            customers: CustomerSheet::new(sheet.clone(), layout.clone()),
            deliveries: DeliveryUpdater::new(sheet, layout),
            proofs: ProofUploader::new(store, links).with_folder(upload_folder),
        }
    }
}

#[derive(Deserialize)]
struct DetailsQuery {
    cid: Option<String>,
}

#[derive(Deserialize)]
struct ConfirmDelivery {
    cid: Option<String>,
    received: Option<HashMap<String, u32>>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
}

fn error_json(status: StatusCode, message: &str, correlation_id: Option<String>) -> Response {
    let body = ErrorResponse {
        error: message.to_string(),
        correlation_id,
    };
    (status, Json(body)).into_response()
}

fn bad_request(message: &str) -> Response {
    error_json(StatusCode::BAD_REQUEST, message, None)
}

impl IntoResponse for DeliveryError {
    fn into_response(self) -> Response {
        match &self {
            DeliveryError::Validation(message) => bad_request(message),
            DeliveryError::NotFound(_) => {
                error_json(StatusCode::NOT_FOUND, &self.to_string(), None)
            }
            other => {
                let correlation_id = Uuid::new_v4().to_string();
                error!("[{}] {}", correlation_id, other);
                let (status, message) = match other {
                    DeliveryError::Gateway(_) => {
                        (StatusCode::BAD_GATEWAY, "Upstream service request failed")
                    }
                    DeliveryError::Configuration(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "Spreadsheet layout is not as expected")
                    }
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
                };
                error_json(status, message, Some(correlation_id))
            }
        }
    }
}

/// Routes at the root and again under `/api`, where the web client calls them
pub fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    let routes = Router::new()
        .route("/customer-details/", get(customer_details))
        .route("/confirm-delivery/", post(confirm_delivery))
        .route(
            "/upload-proof-video/",
            post(upload_proof_video).layer(DefaultBodyLimit::max(max_upload_bytes)),
        );

    Router::new()
        .merge(routes.clone())
        .nest("/api", routes)
        .with_state(state)
}

/// Debug mode mirrors any origin; otherwise only the configured origins pass
pub fn cors_layer(
    debug: bool,
    allowed_origins: &[String],
) -> Result<CorsLayer, header::InvalidHeaderValue> {
    if debug {
        return Ok(CorsLayer::very_permissive());
    }
    if allowed_origins.is_empty() {
        warn!("No CORS origins configured; cross-origin requests will be refused");
    }
    let origins = allowed_origins
        .iter()
        .map(|o| HeaderValue::from_str(o))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true))
}

pub async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let sheets = SheetsClient::new(
        &config.spreadsheet_id,
        &config.sheet_name,
        &config.sheets_token,
    )
    .with_retry(config.retry.clone());
    let drive =
        DriveClient::new(&config.drive_token, &config.share_host).with_retry(config.retry.clone());

    // Setup app state
    let app_state = Arc::new(AppState::new(
        Arc::new(sheets),
        Arc::new(drive),
        config.layout.clone(),
        config.drive_folder.clone(),
    ));

    let app = router(app_state, config.max_upload_bytes)
        .layer(cors_layer(config.debug, &config.allowed_origins)?);

    // Start server
    let listener = TcpListener::bind(config.bind_addr).await?;
    info!("Listening on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn customer_details(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DetailsQuery>,
) -> Response {
    let Some(cid) = params.cid.filter(|c| !c.trim().is_empty()) else {
        return bad_request("CID not provided");
    };
    info!("Fetching details for CID {}", cid.trim());

    match state.customers.resolve(&cid).await {
        Ok(Some(record)) => Json(record).into_response(),
        // The client always gets a record; unknown CIDs come back as placeholders
        Ok(None) => Json(CustomerRecord::unknown(cid.trim())).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn confirm_delivery(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ConfirmDelivery>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return bad_request(&format!("Invalid request body: {}", rejection.body_text()));
        }
    };
    let cid = payload.cid.filter(|c| !c.trim().is_empty());
    let (Some(cid), Some(received)) = (cid, payload.received) else {
        return bad_request("cid and received are required");
    };

    match state.deliveries.update(&cid, &received).await {
        Ok(()) => Json(json!({ "status": "Confirmation submitted successfully" })).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Stream one multipart field into a temporary file that is removed on drop.
/// Yields `None` for an empty part.
async fn buffer_to_temp(mut field: Field<'_>) -> Result<Option<NamedTempFile>, Response> {
    let tmp = tempfile::Builder::new()
        .prefix("proof-")
        .suffix(".mp4")
        .tempfile()
        .map_err(|e| DeliveryError::Io(e).into_response())?;
    let mut file = tokio::fs::File::from_std(
        tmp.reopen()
            .map_err(|e| DeliveryError::Io(e).into_response())?,
    );

    let mut written = 0usize;
    loop {
        let chunk = match field.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => return Err(error_json(e.status(), &e.body_text(), None)),
        };
        file.write_all(&chunk)
            .await
            .map_err(|e| DeliveryError::Io(e).into_response())?;
        written += chunk.len();
    }
    file.flush()
        .await
        .map_err(|e| DeliveryError::Io(e).into_response())?;

    Ok((written > 0).then_some(tmp))
}

async fn upload_proof_video(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Response {
    let mut cid: Option<String> = None;
    let mut video: Option<(NamedTempFile, String)> = None;

    // Process the multipart form data
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return error_json(e.status(), &e.body_text(), None),
        };
        let field_name = field.name().unwrap_or("unknown").to_string();

        match field_name.as_str() {
            "cid" => match field.text().await {
                Ok(text) => cid = Some(text),
                Err(e) => return error_json(e.status(), &e.body_text(), None),
            },
            "file" | "video" => {
                let mime = field
                    .content_type()
                    .filter(|t| !t.is_empty() && *t != "application/octet-stream")
                    .unwrap_or(DEFAULT_VIDEO_MIME)
                    .to_string();
                match buffer_to_temp(field).await {
                    Ok(Some(tmp)) => video = Some((tmp, mime)),
                    Ok(None) => {}
                    Err(response) => return response,
                }
            }
            _ => {}
        }
    }

    // Any early return drops `video`, which deletes the temporary file
    let cid = cid.filter(|c| !c.trim().is_empty());
    let (Some(cid), Some((tmp, mime))) = (cid, video) else {
        return bad_request("CID and video file are required");
    };

    let result = state.proofs.publish(&cid, tmp.path(), &mime).await;
    if let Err(e) = tmp.close() {
        warn!("Could not remove temporary upload: {}", e);
    }

    match result {
        Ok(url) => Json(json!({ "success": true, "video_url": url })).into_response(),
        Err(e) => e.into_response(),
    }
}
