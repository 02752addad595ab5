use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ReconcileError, Result};

/// Receivable invoice vs payable bill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Invoice,
    Bill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
}

/// Open receivable/payable document as delivered by the API layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialDocument {
    pub id: String,
    pub party_id: String, // customer or supplier reference
    pub kind: DocumentKind,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub total: BigDecimal,
    pub status: DocumentStatus,
}

impl FinancialDocument {
    pub fn is_open(&self) -> bool {
        self.status != DocumentStatus::Paid
    }

    /// Invariants: total >= 0, due date never precedes issue date
    pub fn validate(&self) -> Result<()> {
        if self.total < BigDecimal::zero() {
            return Err(ReconcileError::Validation(format!(
                "document {} has a negative total",
                self.id
            )));
        }
        if let Some(due) = self.due_date {
            if due < self.issue_date {
                return Err(ReconcileError::Validation(format!(
                    "document {} due date precedes its issue date",
                    self.id
                )));
            }
        }
        Ok(())
    }
}
