//! Simulated data endpoints.

use axum::{Extension, Json, body::Bytes, extract::State};
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracegen_trace::attr;
use tracing::info;

use super::unix_timestamp;
use crate::middleware::RequestSpan;
use crate::state::AppState;

const VALIDATION_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Serialize)]
pub struct DataResponse {
    pub id: i64,
    pub value: f64,
    pub timestamp: f64,
}

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub processed: bool,
    pub input: Value,
    pub result: i64,
    pub processing_time: f64,
}

pub async fn get_data(
    State(state): State<AppState>,
    Extension(RequestSpan(parent)): Extension<RequestSpan>,
) -> Json<DataResponse> {
    info!("Data endpoint called");

    let span = state.telemetry.start_span("get-data", &parent);
    span.set_attribute(attr::ENDPOINT, "/api/data");

    let processing_time = state.random.float_in(0.1, 0.5);
    tokio::time::sleep(Duration::from_secs_f64(processing_time)).await;
    span.set_attribute(attr::PROCESSING_TIME_SECONDS, processing_time);

    let data = DataResponse {
        id: state.random.int_in(1, 1000),
        value: state.random.float_in(0.0, 100.0),
        timestamp: unix_timestamp(),
    };

    info!(id = data.id, value = data.value, "Generated data");

    Json(data)
}

/// Accepts any body of any size; absent, malformed or falsy JSON input
/// becomes `{}`.
pub async fn process_data(
    State(state): State<AppState>,
    Extension(RequestSpan(parent)): Extension<RequestSpan>,
    body: Bytes,
) -> Json<ProcessResponse> {
    info!("Process endpoint called");

    let span = state.telemetry.start_span("process-data", &parent);
    span.set_attribute(attr::ENDPOINT, "/api/process");
    span.set_attribute(attr::METHOD, "POST");

    let input = parse_input(&body);

    {
        let validate = span.child("validate-input");
        let size = input_size(&input);
        validate.set_attribute(attr::INPUT_SIZE, size);
        info!(input_size = size, "Validating input");
        tokio::time::sleep(VALIDATION_DELAY).await;
    }

    let response = {
        let transform = span.child("transform-data");
        let processing_time = state.random.float_in(0.2, 0.7);
        tokio::time::sleep(Duration::from_secs_f64(processing_time)).await;
        transform.set_attribute(attr::TRANSFORM_TIME_SECONDS, processing_time);

        ProcessResponse {
            processed: true,
            input,
            result: state.random.int_in(100, 999),
            processing_time,
        }
    };

    info!(
        result = response.result,
        processing_time = response.processing_time,
        "Processing completed"
    );

    Json(response)
}

/// Falsy JSON (`null`, `false`, `0`, `""`, `[]`, `{}`) and unparseable
/// bodies all become an empty object; anything else is echoed unchanged.
pub fn parse_input(body: &[u8]) -> Value {
    match serde_json::from_slice::<Value>(body) {
        Ok(value) if !is_falsy(&value) => value,
        _ => Value::Object(Map::new()),
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

/// Byte length of the compact JSON rendering.
fn input_size(input: &Value) -> i64 {
    i64::try_from(input.to_string().len()).unwrap_or(i64::MAX)
}
