//! Document type codes.
//!
//! # Invariants
//! - The code set is closed; storage and settings only ever hold codes
//!   produced by `DocumentType::as_str`.
//! - Codes are stable kebab-case strings and must never be renamed, since
//!   counter rows are keyed by them.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Kind of business document that receives a reference number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentType {
    Quote,
    PurchaseOrder,
    DeliveryNote,
    Invoice,
    CreditNote,
    CashReceipt,
    ReceivingNote,
    SupplierInvoice,
    SupplierCreditNote,
    PurchaseOrderFollowup,
}

const ALL_DOCUMENT_TYPES: &[DocumentType] = &[
    DocumentType::Quote,
    DocumentType::PurchaseOrder,
    DocumentType::DeliveryNote,
    DocumentType::Invoice,
    DocumentType::CreditNote,
    DocumentType::CashReceipt,
    DocumentType::ReceivingNote,
    DocumentType::SupplierInvoice,
    DocumentType::SupplierCreditNote,
    DocumentType::PurchaseOrderFollowup,
];

impl DocumentType {
    /// Every supported document type, in declaration order.
    pub fn all() -> &'static [DocumentType] {
        ALL_DOCUMENT_TYPES
    }

    /// Stable code used in storage keys, settings and the CLI.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::PurchaseOrder => "purchase-order",
            Self::DeliveryNote => "delivery-note",
            Self::Invoice => "invoice",
            Self::CreditNote => "credit-note",
            Self::CashReceipt => "cash-receipt",
            Self::ReceivingNote => "receiving-note",
            Self::SupplierInvoice => "supplier-invoice",
            Self::SupplierCreditNote => "supplier-credit-note",
            Self::PurchaseOrderFollowup => "purchase-order-followup",
        }
    }
}

impl Display for DocumentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a code is not one of the supported document types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDocumentType(pub String);

impl Display for UnknownDocumentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown document type `{}`", self.0)
    }
}

impl Error for UnknownDocumentType {}

impl FromStr for DocumentType {
    type Err = UnknownDocumentType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        ALL_DOCUMENT_TYPES
            .iter()
            .copied()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| UnknownDocumentType(normalized.to_string()))
    }
}
