use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Confirmed purchase order with its ordered lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: String,
    pub supplier_id: String,
    pub lines: Vec<PurchaseOrderLine>,
    pub total: BigDecimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrderLine {
    pub description: String,
    pub ordered_qty: BigDecimal,
    pub unit_price: BigDecimal,
}

/// Posted goods receipt; immutable once created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoodsReceipt {
    pub id: String,
    pub purchase_order_id: String,
    pub received_date: NaiveDate,
    pub received_by: String,
    pub lines: Vec<GoodsReceiptLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoodsReceiptLine {
    pub description: String,
    pub received_qty: BigDecimal,
}

/// Supplier invoice billed against a purchase order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierInvoice {
    pub id: String,
    pub purchase_order_id: String,
    pub lines: Vec<SupplierInvoiceLine>,
    pub total: BigDecimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierInvoiceLine {
    pub description: String,
    pub invoiced_qty: BigDecimal,
    pub invoice_price: BigDecimal,
}
