pub mod aging;
pub mod document;
pub mod matching;
pub mod purchase;

pub use aging::{AgingBucket, AgingSummary, SummaryOrder};
pub use document::{DocumentKind, DocumentStatus, FinancialDocument};
pub use matching::{ApprovalDecision, LineStatus, MatchLine, MatchStatus, ThreeWayMatch};
pub use purchase::{
    GoodsReceipt, GoodsReceiptLine, PurchaseOrder, PurchaseOrderLine, SupplierInvoice,
    SupplierInvoiceLine,
};

use bigdecimal::BigDecimal;

/// Fixed 2-decimal representation for emitted monetary values
pub fn money(value: &BigDecimal) -> BigDecimal {
    value.round(2).with_scale(2)
}
