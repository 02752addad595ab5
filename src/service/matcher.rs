use bigdecimal::{BigDecimal, Zero};
use chrono::Utc;
use indexmap::map::Entry;
use indexmap::IndexMap;

use crate::error::{ReconcileError, Result};
use crate::models::{
    money, GoodsReceipt, LineStatus, MatchLine, MatchStatus, PurchaseOrder, SupplierInvoice,
    ThreeWayMatch,
};

/// Ordered/received/invoiced sides of one description key, prior to
/// variance computation
struct JoinedLine {
    ordered_qty: BigDecimal,
    unit_price: BigDecimal,
    received_qty: Option<BigDecimal>,
    invoiced_qty: Option<BigDecimal>,
    invoice_price: Option<BigDecimal>,
}

impl JoinedLine {
    fn unordered() -> Self {
        Self {
            ordered_qty: BigDecimal::zero(),
            unit_price: BigDecimal::zero(),
            received_qty: None,
            invoiced_qty: None,
            invoice_price: None,
        }
    }
}

/// Compare a purchase order against its goods receipt and supplier invoice
/// and classify the match.
///
/// Pure over its arguments: the same `(po, receipt, invoice, tolerance)`
/// always yields the same status and variances. Lines are joined by
/// description in purchase-order order; receipt-only or invoice-only
/// descriptions are appended after and evaluated against an ordered
/// quantity of zero. A purchase order or invoice listing one description
/// more than once is malformed input; split receipt deliveries for one
/// description sum their quantities.
pub fn evaluate_match(
    po: &PurchaseOrder,
    receipt: Option<&GoodsReceipt>,
    invoice: Option<&SupplierInvoice>,
    tolerance_pct: &BigDecimal,
) -> Result<ThreeWayMatch> {
    if *tolerance_pct < BigDecimal::zero() {
        return Err(ReconcileError::Validation(format!(
            "tolerance must not be negative, got {}",
            tolerance_pct
        )));
    }
    if let Some(r) = receipt {
        if r.purchase_order_id != po.id {
            return Err(ReconcileError::InvalidReference(format!(
                "goods receipt {} references purchase order {}, expected {}",
                r.id, r.purchase_order_id, po.id
            )));
        }
    }
    if let Some(inv) = invoice {
        if inv.purchase_order_id != po.id {
            return Err(ReconcileError::InvalidReference(format!(
                "supplier invoice {} references purchase order {}, expected {}",
                inv.id, inv.purchase_order_id, po.id
            )));
        }
    }

    // join by description key, purchase-order lines first
    let mut joined: IndexMap<String, JoinedLine> = IndexMap::new();
    for line in &po.lines {
        match joined.entry(line.description.clone()) {
            Entry::Occupied(_) => {
                return Err(ReconcileError::Validation(format!(
                    "purchase order {} lists {} more than once",
                    po.id, line.description
                )));
            }
            Entry::Vacant(entry) => {
                entry.insert(JoinedLine {
                    ordered_qty: line.ordered_qty.clone(),
                    unit_price: line.unit_price.clone(),
                    received_qty: None,
                    invoiced_qty: None,
                    invoice_price: None,
                });
            }
        }
    }
    if let Some(r) = receipt {
        for line in &r.lines {
            let entry = joined
                .entry(line.description.clone())
                .or_insert_with(JoinedLine::unordered);
            *entry.received_qty.get_or_insert_with(BigDecimal::zero) += &line.received_qty;
        }
    }
    if let Some(inv) = invoice {
        for line in &inv.lines {
            let entry = joined
                .entry(line.description.clone())
                .or_insert_with(JoinedLine::unordered);
            if entry.invoice_price.is_some() {
                return Err(ReconcileError::Validation(format!(
                    "supplier invoice {} lists {} more than once",
                    inv.id, line.description
                )));
            }
            entry.invoiced_qty = Some(line.invoiced_qty.clone());
            entry.invoice_price = Some(line.invoice_price.clone());
        }
    }

    let tolerance_ratio = tolerance_pct / &BigDecimal::from(100);
    let mut lines: Vec<MatchLine> = Vec::with_capacity(joined.len());
    let mut total_variance = BigDecimal::zero();
    let mut quantity_variance = BigDecimal::zero();
    let mut price_variance = BigDecimal::zero();
    let mut all_matched = true;

    for (description, j) in joined {
        // a present document with no line for this key counts as zero
        let received_eff = match (receipt, &j.received_qty) {
            (Some(_), Some(q)) => Some(q.clone()),
            (Some(_), None) => Some(BigDecimal::zero()),
            (None, _) => None,
        };
        let invoiced_eff = match (invoice, &j.invoiced_qty) {
            (Some(_), Some(q)) => Some(q.clone()),
            (Some(_), None) => Some(BigDecimal::zero()),
            (None, _) => None,
        };

        let line_qty_variance = match (&received_eff, &invoiced_eff) {
            (Some(recv), _) => recv - &j.ordered_qty,
            (None, Some(invd)) => invd - &j.ordered_qty,
            (None, None) => BigDecimal::zero(),
        };
        let line_price_variance = match &j.invoice_price {
            Some(price) => price - &j.unit_price,
            None => BigDecimal::zero(),
        };

        let ordered_amount = &j.ordered_qty * &j.unit_price;
        let actual_amount = if invoice.is_some() {
            let qty = invoiced_eff.clone().unwrap_or_else(BigDecimal::zero);
            let price = j.invoice_price.clone().unwrap_or_else(BigDecimal::zero);
            &qty * &price
        } else if receipt.is_some() {
            let qty = received_eff.clone().unwrap_or_else(BigDecimal::zero);
            &qty * &j.unit_price
        } else {
            // nothing received or invoiced yet: carry the ordered value
            ordered_amount.clone()
        };
        let line_variance_amount = &actual_amount - &ordered_amount;

        let status = if ordered_amount.is_zero() {
            // nothing ordered: every present side must agree exactly
            if line_qty_variance.is_zero()
                && line_price_variance.is_zero()
                && line_variance_amount.is_zero()
            {
                LineStatus::Matched
            } else {
                LineStatus::Discrepancy
            }
        } else {
            let ratio = line_variance_amount.abs() / ordered_amount.abs();
            if ratio <= tolerance_ratio {
                LineStatus::Matched
            } else {
                LineStatus::Discrepancy
            }
        };
        if status == LineStatus::Discrepancy {
            all_matched = false;
        }

        total_variance += &line_variance_amount;
        quantity_variance += &line_qty_variance;
        price_variance += &line_price_variance;

        lines.push(MatchLine {
            description,
            ordered_qty: j.ordered_qty,
            unit_price: money(&j.unit_price),
            received_qty: received_eff,
            invoiced_qty: invoiced_eff,
            invoice_price: j.invoice_price.as_ref().map(money),
            quantity_variance: line_qty_variance,
            price_variance: money(&line_price_variance),
            variance_amount: money(&line_variance_amount),
            status,
        });
    }

    let status = match (receipt.is_some(), invoice.is_some()) {
        (false, false) => MatchStatus::Pending,
        (true, true) => {
            if all_matched {
                MatchStatus::FullMatch
            } else {
                MatchStatus::Discrepancy
            }
        }
        // only one side arrived so far; line discrepancies keep it partial
        _ => MatchStatus::PartialMatch,
    };

    Ok(ThreeWayMatch {
        id: format!("match-{}", po.id),
        purchase_order_id: po.id.clone(),
        goods_receipt_id: receipt.map(|r| r.id.clone()),
        supplier_invoice_id: invoice.map(|i| i.id.clone()),
        status,
        total_variance: money(&total_variance),
        quantity_variance,
        price_variance: money(&price_variance),
        lines,
        approval: None,
        payment_eligible: false,
        evaluated_at: Utc::now(),
    })
}
