use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::Json;
use deed_ledger::{Deadline, Ledger};
use deed_types::{Action, ChainKey, LedgerRecord, RecordFields};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ServerError, ServerResult};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(ledger: Arc<Ledger>, request_timeout: Duration) -> Self {
        Self {
            ledger,
            request_timeout,
        }
    }

    fn deadline(&self) -> Deadline {
        Deadline::after(self.request_timeout)
    }
}

/// Body of `POST /add_entry`. Missing keys read as empty and fail validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewEntry {
    pub survey_number: String,
    pub property_number: String,
    pub owner_id: String,
    pub land_type: String,
    pub action: String,
    pub details: String,
}

impl TryFrom<NewEntry> for RecordFields {
    type Error = ServerError;

    fn try_from(entry: NewEntry) -> ServerResult<Self> {
        let action: Action = entry
            .action
            .parse()
            .map_err(|e: deed_types::TypeError| ServerError::InvalidInput(e.to_string()))?;
        Ok(RecordFields {
            survey_number: entry.survey_number,
            property_number: entry.property_number,
            owner_id: entry.owner_id,
            land_type: entry.land_type,
            action,
            details: entry.details,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct AddEntryResponse {
    pub status: &'static str,
    pub entry: LedgerRecord,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub land_id: String,
    pub valid: bool,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_invalid_index: Option<usize>,
}

pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn add_entry_handler(
    State(state): State<AppState>,
    body: Result<Json<NewEntry>, JsonRejection>,
) -> ServerResult<Json<AddEntryResponse>> {
    let Json(entry) = body.map_err(|_| ServerError::InvalidInput("Invalid input".into()))?;
    let fields = RecordFields::try_from(entry)?;
    let record = state.ledger.append(fields, state.deadline()).await?;
    tracing::info!(
        record_id = %record.id,
        chain_key = %record.property_number,
        action = %record.action,
        "entry added"
    );
    Ok(Json(AddEntryResponse {
        status: "success",
        entry: record,
    }))
}

pub async fn verify_handler(
    State(state): State<AppState>,
    Path(land_id): Path<String>,
) -> ServerResult<Json<VerifyResponse>> {
    let key = chain_key(&land_id)?;
    let result = state.ledger.verify(&key, state.deadline()).await?;
    Ok(Json(VerifyResponse {
        land_id,
        valid: result.valid,
        count: result.count,
        first_invalid_index: result.first_invalid_index,
    }))
}

pub async fn property_history_handler(
    State(state): State<AppState>,
    Path(property_number): Path<String>,
) -> ServerResult<Json<Vec<LedgerRecord>>> {
    let key = chain_key(&property_number)?;
    let history = state.ledger.property_history(&key, state.deadline()).await?;
    if history.is_empty() {
        return Err(ServerError::NotFound("Property"));
    }
    Ok(Json(history))
}

pub async fn survey_history_handler(
    State(state): State<AppState>,
    Path(survey_number): Path<String>,
) -> ServerResult<Json<Vec<LedgerRecord>>> {
    let history = state.ledger.survey_history(&survey_number, state.deadline()).await?;
    Ok(Json(history))
}

fn chain_key(raw: &str) -> ServerResult<ChainKey> {
    ChainKey::new(raw).map_err(|e| ServerError::InvalidInput(e.to_string()))
}
