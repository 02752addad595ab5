use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Overall match classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    PartialMatch,
    FullMatch,
    Discrepancy,
}

/// Per-line classification against the variance tolerance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStatus {
    Matched,
    Discrepancy,
}

/// One reconciled line: ordered vs received vs invoiced.
/// Received/invoiced sides are absent when the corresponding document
/// carries no line for this description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchLine {
    pub description: String,
    pub ordered_qty: BigDecimal,
    pub unit_price: BigDecimal,
    pub received_qty: Option<BigDecimal>,
    pub invoiced_qty: Option<BigDecimal>,
    pub invoice_price: Option<BigDecimal>,
    pub quantity_variance: BigDecimal,
    pub price_variance: BigDecimal,
    pub variance_amount: BigDecimal,
    pub status: LineStatus,
}

/// Terminal decision recorded by the approval workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalDecision {
    pub approved: bool,
    pub comments: Option<String>,
    pub override_variance: bool,
    pub decided_at: DateTime<Utc>,
}

/// Reconciliation of a purchase order against its goods receipt and
/// supplier invoice. Holds IDs only for the three documents; the line
/// collection is exclusively owned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreeWayMatch {
    pub id: String,
    pub purchase_order_id: String,
    pub goods_receipt_id: Option<String>,
    pub supplier_invoice_id: Option<String>,
    pub status: MatchStatus,
    pub total_variance: BigDecimal,
    pub quantity_variance: BigDecimal,
    pub price_variance: BigDecimal,
    pub lines: Vec<MatchLine>,
    pub approval: Option<ApprovalDecision>,
    pub payment_eligible: bool,
    pub evaluated_at: DateTime<Utc>,
}

impl ThreeWayMatch {
    /// A match with a recorded decision accepts no further transitions
    pub fn is_terminal(&self) -> bool {
        self.approval.is_some()
    }
}
