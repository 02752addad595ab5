use crate::error::ReconcileError;
use crate::models::{
    AgingSummary, FinancialDocument, GoodsReceipt, PurchaseOrder, SummaryOrder, SupplierInvoice,
    ThreeWayMatch,
};
use crate::service::{aging, export, matcher, MatchApprovalWorkflow};
use axum::{
    extract::{Json, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared state for the match routes
#[derive(Clone)]
pub struct MatchingState {
    pub workflow: Arc<MatchApprovalWorkflow>,
    pub default_tolerance: BigDecimal,
}

/// Request body: documents to age
#[derive(Debug, Deserialize)]
pub struct AgingRequest {
    pub documents: Vec<FinancialDocument>,
    pub as_of: NaiveDate,
    #[serde(default)]
    pub order: Option<SummaryOrder>,
}

#[derive(Debug, Serialize)]
pub struct AgingResponse {
    pub success: bool,
    pub message: String,
    pub summaries: Option<Vec<AgingSummary>>,
}

/// Request body: documents for one three-way evaluation
#[derive(Debug, Deserialize)]
pub struct EvaluateMatchRequest {
    pub purchase_order: PurchaseOrder,
    pub goods_receipt: Option<GoodsReceipt>,
    pub supplier_invoice: Option<SupplierInvoice>,
    pub tolerance_pct: Option<BigDecimal>,
}

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub comments: Option<String>,
    #[serde(default)]
    pub override_variance: bool,
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub comments: String,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub success: bool,
    pub message: String,
    pub result: Option<ThreeWayMatch>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
}

fn error_response(err: ReconcileError) -> Response {
    let status = match &err {
        ReconcileError::Validation(_) | ReconcileError::InvalidReference(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ReconcileError::PolicyViolation(_) | ReconcileError::InvalidState(_) => {
            StatusCode::CONFLICT
        }
        ReconcileError::NotFound(_) => StatusCode::NOT_FOUND,
        ReconcileError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = ErrorBody {
        success: false,
        message: err.to_string(),
    };
    (status, Json(body)).into_response()
}

/// Health check
pub async fn health_check() -> &'static str {
    "OK"
}

/// Aging computation endpoint
pub async fn compute_aging(Json(req): Json<AgingRequest>) -> Response {
    match aging::compute_aging(&req.documents, req.as_of) {
        Ok(mut summaries) => {
            if let Some(order) = req.order {
                aging::sort_summaries(&mut summaries, order);
            }
            tracing::info!(
                "aged {} documents into {} party summaries",
                req.documents.len(),
                summaries.len()
            );
            let response = AgingResponse {
                success: true,
                message: format!("Computed aging for {} parties", summaries.len()),
                summaries: Some(summaries),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// Aging computation with CSV output
pub async fn export_aging(Json(req): Json<AgingRequest>) -> Response {
    let result = aging::compute_aging(&req.documents, req.as_of).and_then(|mut summaries| {
        if let Some(order) = req.order {
            aging::sort_summaries(&mut summaries, order);
        }
        let mut buf = Vec::new();
        export::write_aging_csv(&summaries, &mut buf)?;
        Ok(buf)
    });
    match result {
        Ok(buf) => ([(header::CONTENT_TYPE, "text/csv")], buf).into_response(),
        Err(e) => error_response(e),
    }
}

/// Evaluate a three-way match and register it with the approval workflow
pub async fn evaluate_match(
    State(state): State<MatchingState>,
    Json(req): Json<EvaluateMatchRequest>,
) -> Response {
    let tolerance = req
        .tolerance_pct
        .unwrap_or_else(|| state.default_tolerance.clone());

    let evaluated = matcher::evaluate_match(
        &req.purchase_order,
        req.goods_receipt.as_ref(),
        req.supplier_invoice.as_ref(),
        &tolerance,
    )
    .and_then(|m| {
        state.workflow.register(m.clone())?;
        Ok(m)
    });

    match evaluated {
        Ok(m) => {
            tracing::info!("match {} evaluated as {:?}", m.id, m.status);
            let response = MatchResponse {
                success: true,
                message: format!("Match {} evaluated as {:?}", m.id, m.status),
                result: Some(m),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// Fetch a registered match
pub async fn get_match(
    State(state): State<MatchingState>,
    Path(match_id): Path<String>,
) -> Response {
    match state.workflow.get(&match_id) {
        Ok(m) => {
            let response = MatchResponse {
                success: true,
                message: format!("Match {}", m.id),
                result: Some(m),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// Approve a match
pub async fn approve_match(
    State(state): State<MatchingState>,
    Path(match_id): Path<String>,
    Json(req): Json<ApproveRequest>,
) -> Response {
    match state
        .workflow
        .approve(&match_id, req.comments, req.override_variance)
    {
        Ok(m) => {
            tracing::info!("match {} approved, payment eligible", m.id);
            let response = MatchResponse {
                success: true,
                message: format!("Match {} approved", m.id),
                result: Some(m),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            tracing::warn!("approve {} refused: {}", match_id, e);
            error_response(e)
        }
    }
}

/// Reject a match
pub async fn reject_match(
    State(state): State<MatchingState>,
    Path(match_id): Path<String>,
    Json(req): Json<RejectRequest>,
) -> Response {
    match state.workflow.reject(&match_id, &req.comments) {
        Ok(m) => {
            tracing::info!("match {} rejected", m.id);
            let response = MatchResponse {
                success: true,
                message: format!("Match {} rejected", m.id),
                result: Some(m),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            tracing::warn!("reject {} refused: {}", match_id, e);
            error_response(e)
        }
    }
}
