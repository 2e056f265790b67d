//! Sequential multi-step operation.

use axum::{Extension, Json, extract::State};
use serde::Serialize;
use std::time::Duration;
use tracegen_trace::attr;
use tracing::info;

use crate::middleware::RequestSpan;
use crate::state::AppState;

const CHAIN_STEPS: i64 = 3;

#[derive(Debug, Serialize)]
pub struct Operation {
    pub step: i64,
    pub value: i64,
}

#[derive(Debug, Serialize)]
pub struct ChainResponse {
    pub operations: Vec<Operation>,
    pub total_steps: usize,
}

pub async fn chain_operations(
    State(state): State<AppState>,
    Extension(RequestSpan(parent)): Extension<RequestSpan>,
) -> Json<ChainResponse> {
    info!("Chain operations endpoint called");

    let span = state.telemetry.start_span("chain-operations", &parent);
    span.set_attribute(attr::ENDPOINT, "/api/chain");

    let mut operations = Vec::with_capacity(CHAIN_STEPS as usize);
    for step in 1..=CHAIN_STEPS {
        let op_span = span.child(format!("operation-{}", step));
        op_span.set_attribute(attr::OPERATION_NUMBER, step);

        let delay = state.random.float_in(0.05, 0.15);
        tokio::time::sleep(Duration::from_secs_f64(delay)).await;

        let operation = Operation {
            step,
            value: state.random.int_in(1, 100),
        };
        info!(step = operation.step, value = operation.value, "Operation completed");
        operations.push(operation);
    }

    Json(ChainResponse {
        total_steps: operations.len(),
        operations,
    })
}
