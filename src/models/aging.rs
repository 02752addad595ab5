use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Aging bucket by days past due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgingBucket {
    Current,
    Days0To30,
    Days31To60,
    Days61To90,
    Days90Plus,
}

impl AgingBucket {
    /// Classify by `as_of - due_date` in whole days; zero and negative mean
    /// the document is not yet due.
    pub fn for_days_overdue(days: i64) -> Self {
        match days {
            d if d <= 0 => Self::Current,
            1..=30 => Self::Days0To30,
            31..=60 => Self::Days31To60,
            61..=90 => Self::Days61To90,
            _ => Self::Days90Plus,
        }
    }
}

/// Per-party aggregation of open document amounts by bucket.
/// Bucket amounts always sum to `total`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgingSummary {
    pub party_id: String,
    pub current: BigDecimal,
    pub days_0_30: BigDecimal,
    pub days_31_60: BigDecimal,
    pub days_61_90: BigDecimal,
    pub days_90_plus: BigDecimal,
    pub total: BigDecimal,
    pub oldest_document_date: NaiveDate,
    pub average_days_outstanding: i64,
    pub document_count: usize,
}

impl AgingSummary {
    pub fn bucket_amount(&self, bucket: AgingBucket) -> &BigDecimal {
        match bucket {
            AgingBucket::Current => &self.current,
            AgingBucket::Days0To30 => &self.days_0_30,
            AgingBucket::Days31To60 => &self.days_31_60,
            AgingBucket::Days61To90 => &self.days_61_90,
            AgingBucket::Days90Plus => &self.days_90_plus,
        }
    }
}

/// Display ordering for summaries; sorting is a presentation concern,
/// not part of the computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryOrder {
    TotalDesc,
    OldestFirst,
    PartyAsc,
}
