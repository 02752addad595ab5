use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use indexmap::IndexMap;

use crate::error::{ReconcileError, Result};
use crate::models::{money, AgingBucket, AgingSummary, DocumentStatus, FinancialDocument, SummaryOrder};

struct PartyAcc {
    current: BigDecimal,
    days_0_30: BigDecimal,
    days_31_60: BigDecimal,
    days_61_90: BigDecimal,
    days_90_plus: BigDecimal,
    total: BigDecimal,
    oldest: NaiveDate,
    overdue_days_sum: i64,
    count: usize,
}

impl PartyAcc {
    fn new(oldest: NaiveDate) -> Self {
        Self {
            current: BigDecimal::zero(),
            days_0_30: BigDecimal::zero(),
            days_31_60: BigDecimal::zero(),
            days_61_90: BigDecimal::zero(),
            days_90_plus: BigDecimal::zero(),
            total: BigDecimal::zero(),
            oldest,
            overdue_days_sum: 0,
            count: 0,
        }
    }

    fn bucket_mut(&mut self, bucket: AgingBucket) -> &mut BigDecimal {
        match bucket {
            AgingBucket::Current => &mut self.current,
            AgingBucket::Days0To30 => &mut self.days_0_30,
            AgingBucket::Days31To60 => &mut self.days_31_60,
            AgingBucket::Days61To90 => &mut self.days_61_90,
            AgingBucket::Days90Plus => &mut self.days_90_plus,
        }
    }
}

/// Bucket every open document by days past due and aggregate per party.
///
/// Paid documents are skipped entirely. Parties end up in first-seen
/// document order; see [`sort_summaries`] for display ordering. Pure over
/// its inputs: identical `(documents, as_of)` always produces identical
/// summaries.
pub fn compute_aging(
    documents: &[FinancialDocument],
    as_of: NaiveDate,
) -> Result<Vec<AgingSummary>> {
    let mut groups: IndexMap<String, PartyAcc> = IndexMap::new();

    for doc in documents {
        if doc.status == DocumentStatus::Paid {
            continue;
        }
        doc.validate()?;
        let due = doc.due_date.ok_or_else(|| {
            ReconcileError::Validation(format!("open document {} has no due date", doc.id))
        })?;

        let days_overdue = (as_of - due).num_days();
        let bucket = AgingBucket::for_days_overdue(days_overdue);

        let acc = groups
            .entry(doc.party_id.clone())
            .or_insert_with(|| PartyAcc::new(doc.issue_date));
        *acc.bucket_mut(bucket) += &doc.total;
        acc.total += &doc.total;
        if doc.issue_date < acc.oldest {
            acc.oldest = doc.issue_date;
        }
        // not-yet-due documents count as zero days outstanding
        acc.overdue_days_sum += days_overdue.max(0);
        acc.count += 1;
    }

    let summaries = groups
        .into_iter()
        .map(|(party_id, acc)| {
            let average = (acc.overdue_days_sum as f64 / acc.count as f64).round() as i64;
            AgingSummary {
                party_id,
                current: money(&acc.current),
                days_0_30: money(&acc.days_0_30),
                days_31_60: money(&acc.days_31_60),
                days_61_90: money(&acc.days_61_90),
                days_90_plus: money(&acc.days_90_plus),
                total: money(&acc.total),
                oldest_document_date: acc.oldest,
                average_days_outstanding: average,
                document_count: acc.count,
            }
        })
        .collect();

    Ok(summaries)
}

/// Apply the caller-requested display ordering
pub fn sort_summaries(summaries: &mut [AgingSummary], order: SummaryOrder) {
    match order {
        SummaryOrder::TotalDesc => summaries.sort_by(|a, b| b.total.cmp(&a.total)),
        SummaryOrder::OldestFirst => {
            summaries.sort_by(|a, b| a.oldest_document_date.cmp(&b.oldest_document_date))
        }
        SummaryOrder::PartyAsc => summaries.sort_by(|a, b| a.party_id.cmp(&b.party_id)),
    }
}

/// Share of `total` held by one bucket, in percent at one decimal place.
/// An empty total yields 0 rather than dividing by zero.
pub fn pct(bucket_amount: &BigDecimal, total: &BigDecimal) -> BigDecimal {
    if total.is_zero() {
        return BigDecimal::zero().with_scale(1);
    }
    let hundred = BigDecimal::from(100);
    ((bucket_amount * &hundred) / total).round(1).with_scale(1)
}
