//! Structured invoice data: loading, status labeling and intent filtering

mod intent;
mod status;
mod table;

pub use intent::QueryIntent;
pub use status::{label_status, parse_date, InvoiceStatus, UPCOMING_WINDOW_DAYS};
pub use table::{
    DueInvoice, InvoiceRecord, InvoiceRow, InvoiceTable, LabeledInvoices, LabeledRow, STATUS_COLUMN,
};
