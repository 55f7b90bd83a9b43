//! AR/AP invoice tables loaded from CSV

use chrono::NaiveDate;
use std::path::Path;

use crate::error::{Error, Result};

use super::intent::QueryIntent;
use super::status::{label_status, parse_date, InvoiceStatus};

const COUNTERPARTY_COLUMNS: &[&str] = &["Customer Name", "Supplier Name", "Vendor Name"];
const INVOICE_NUMBER_COLUMNS: &[&str] = &["Invoice No.", "Invoice Number", "Invoice No"];
const DESCRIPTION_COLUMN: &str = "Service Description";
const AMOUNT_COLUMN: &str = "Amount (AED)";
const INVOICE_DATE_COLUMN: &str = "Invoice Date";
const DUE_DATE_COLUMN: &str = "Due Date";
const PAYMENT_STATUS_COLUMN: &str = "Payment Status";
const PAID_DATE_COLUMN: &str = "Paid Date";

/// Name of the derived column appended on serialization
pub const STATUS_COLUMN: &str = "Status";

/// Typed view of one invoice row
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceRecord {
    /// Customer (AR) or supplier (AP)
    pub counterparty: String,
    pub invoice_number: String,
    pub description: String,
    /// Amount in AED; unparseable amounts read as zero
    pub amount: f64,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    /// Free text, compared case-insensitively
    pub payment_status: String,
    pub paid_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
struct Columns {
    counterparty: Option<usize>,
    invoice_number: Option<usize>,
    description: Option<usize>,
    amount: Option<usize>,
    invoice_date: Option<usize>,
    due_date: usize,
    payment_status: usize,
    paid_date: Option<usize>,
}

impl Columns {
    fn resolve(filename: &str, headers: &[String]) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        let find_any = |names: &[&str]| names.iter().find_map(|n| find(n));
        let require = |name: &str| {
            find(name).ok_or_else(|| Error::parse(filename, format!("missing column '{}'", name)))
        };

        Ok(Self {
            counterparty: find_any(COUNTERPARTY_COLUMNS),
            invoice_number: find_any(INVOICE_NUMBER_COLUMNS),
            description: find(DESCRIPTION_COLUMN),
            amount: find(AMOUNT_COLUMN),
            invoice_date: find(INVOICE_DATE_COLUMN),
            due_date: require(DUE_DATE_COLUMN)?,
            payment_status: require(PAYMENT_STATUS_COLUMN)?,
            paid_date: find(PAID_DATE_COLUMN),
        })
    }

    fn record(&self, fields: &[String]) -> InvoiceRecord {
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| fields.get(i))
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        };
        let date = |idx: Option<usize>| parse_date(&cell(idx));

        InvoiceRecord {
            counterparty: cell(self.counterparty),
            invoice_number: cell(self.invoice_number),
            description: cell(self.description),
            amount: cell(self.amount).replace(',', "").parse().unwrap_or(0.0),
            invoice_date: date(self.invoice_date),
            due_date: date(Some(self.due_date)),
            payment_status: cell(Some(self.payment_status)),
            paid_date: date(self.paid_date),
        }
    }
}

/// One CSV row: raw cells for serialization plus the typed record
#[derive(Debug, Clone)]
pub struct InvoiceRow {
    pub fields: Vec<String>,
    pub record: InvoiceRecord,
}

/// A raw invoice table as loaded from disk
#[derive(Debug, Clone)]
pub struct InvoiceTable {
    headers: Vec<String>,
    rows: Vec<InvoiceRow>,
}

impl InvoiceTable {
    /// Load a CSV file; a missing file is an error
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_bytes(&name, &data)
    }

    /// Parse CSV bytes; header names are trimmed
    pub fn from_bytes(filename: &str, data: &[u8]) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(data);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| Error::parse(filename, format!("Invalid CSV header: {}", e)))?
            .iter()
            .map(str::to_string)
            .collect();
        let columns = Columns::resolve(filename, &headers)?;

        let mut rows = Vec::new();
        for result in reader.records() {
            let fields: Vec<String> = result?.iter().map(str::to_string).collect();
            let record = columns.record(&fields);
            rows.push(InvoiceRow { fields, record });
        }

        tracing::debug!("Loaded {} invoices from {}", rows.len(), filename);
        Ok(Self { headers, rows })
    }

    /// Column names in file order
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Rows in file order
    pub fn rows(&self) -> &[InvoiceRow] {
        &self.rows
    }

    /// Attach a status to every row relative to `today`
    pub fn label(&self, today: NaiveDate) -> LabeledInvoices {
        let rows = self
            .rows
            .iter()
            .map(|row| LabeledRow {
                status: label_status(row.record.due_date, &row.record.payment_status, today),
                row: row.clone(),
            })
            .collect();

        LabeledInvoices {
            headers: self.headers.clone(),
            rows,
        }
    }
}

/// A row with its derived status
#[derive(Debug, Clone)]
pub struct LabeledRow {
    pub row: InvoiceRow,
    pub status: InvoiceStatus,
}

/// An unpaid invoice falling due soon
#[derive(Debug, Clone, PartialEq)]
pub struct DueInvoice {
    pub record: InvoiceRecord,
    /// Days from today until the due date
    pub days_remaining: i64,
}

/// Invoices labeled for one particular day
#[derive(Debug, Clone)]
pub struct LabeledInvoices {
    headers: Vec<String>,
    rows: Vec<LabeledRow>,
}

impl LabeledInvoices {
    /// Labeled rows in file order
    pub fn rows(&self) -> &[LabeledRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Only the rows with the given status
    pub fn with_status(&self, status: InvoiceStatus) -> Self {
        Self {
            headers: self.headers.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| r.status == status)
                .cloned()
                .collect(),
        }
    }

    /// Rows relevant to the intent; general questions keep the whole table
    pub fn filter_by_intent(&self, intent: QueryIntent) -> Self {
        match intent.status() {
            Some(status) => self.with_status(status),
            None => self.clone(),
        }
    }

    /// Render as CSV text with the status appended as the last column
    pub fn to_csv_string(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        let mut header = self.headers.clone();
        header.push(STATUS_COLUMN.to_string());
        writer.write_record(&header)?;

        for labeled in &self.rows {
            let mut record = labeled.row.fields.clone();
            record.resize(self.headers.len(), String::new());
            record.push(labeled.status.to_string());
            writer.write_record(&record)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| Error::internal(format!("CSV buffer flush failed: {}", e)))?;
        String::from_utf8(bytes).map_err(|e| Error::internal(format!("CSV output is not UTF-8: {}", e)))
    }

    /// Unpaid invoices due after today and within `days`, earliest first, at most `limit`
    pub fn due_within(&self, today: NaiveDate, days: i64, limit: usize) -> Vec<DueInvoice> {
        let horizon = today + chrono::Duration::days(days);

        let mut due: Vec<DueInvoice> = self
            .rows
            .iter()
            .map(|r| &r.row.record)
            .filter(|rec| rec.payment_status.eq_ignore_ascii_case("not paid"))
            .filter_map(|rec| {
                let due_date = rec.due_date?;
                (due_date > today && due_date <= horizon).then(|| DueInvoice {
                    record: rec.clone(),
                    days_remaining: (due_date - today).num_days(),
                })
            })
            .collect();

        due.sort_by_key(|d| d.record.due_date);
        due.truncate(limit);
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AR_CSV: &str = "\
Customer Name ,Invoice No.,Service Description,Amount (AED),Invoice Date,Due Date,Payment Status,Paid Date
Acme,INV-1,Audit,\"1,200\",2024-05-01,2024-06-10,Not Paid,
Globex,INV-2,Consulting,300,2024-05-20,2024-06-20,not paid,
Initech,INV-3,Licenses,450,2024-05-01,2024-06-10,Paid,2024-06-09
Umbrella,INV-4,Support,90,2024-06-01,2024-07-01,not paid,
Hooli,INV-5,Training,75,2024-06-01,TBD,not paid,
";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn labeled() -> LabeledInvoices {
        InvoiceTable::from_bytes("AR_Invoice.csv", AR_CSV.as_bytes())
            .unwrap()
            .label(today())
    }

    #[test]
    fn test_typed_records() {
        let table = InvoiceTable::from_bytes("AR_Invoice.csv", AR_CSV.as_bytes()).unwrap();
        assert_eq!(table.headers()[0], "Customer Name");
        let first = &table.rows()[0].record;
        assert_eq!(first.counterparty, "Acme");
        assert_eq!(first.invoice_number, "INV-1");
        assert_eq!(first.amount, 1200.0);
        assert_eq!(first.due_date, NaiveDate::from_ymd_opt(2024, 6, 10));
        assert_eq!(table.rows()[2].record.paid_date, NaiveDate::from_ymd_opt(2024, 6, 9));
    }

    #[test]
    fn test_labels() {
        let statuses: Vec<InvoiceStatus> = labeled().rows().iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                InvoiceStatus::Overdue,
                InvoiceStatus::Upcoming,
                InvoiceStatus::Paid,
                InvoiceStatus::Future,
                InvoiceStatus::Unknown,
            ]
        );
    }

    #[test]
    fn test_overdue_filter_is_strict_subset() {
        let all = labeled();
        let overdue = all.filter_by_intent(QueryIntent::Overdue);
        assert_eq!(overdue.len(), 1);
        assert!(overdue.len() < all.len());
        assert!(overdue.rows().iter().all(|r| r.status == InvoiceStatus::Overdue));

        let general = all.filter_by_intent(QueryIntent::General);
        assert_eq!(general.len(), all.len());
    }

    #[test]
    fn test_csv_serialization_appends_status() {
        let csv = labeled().with_status(InvoiceStatus::Overdue).to_csv_string().unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "Customer Name,Invoice No.,Service Description,Amount (AED),Invoice Date,Due Date,Payment Status,Paid Date,Status"
        );
        assert_eq!(lines[1], "Acme,INV-1,Audit,\"1,200\",2024-05-01,2024-06-10,Not Paid,,Overdue");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_due_within() {
        let due = labeled().due_within(today(), 15, 8);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].record.counterparty, "Globex");
        assert_eq!(due[0].days_remaining, 5);

        let wider = labeled().due_within(today(), 30, 8);
        assert_eq!(wider.len(), 2);
        assert_eq!(wider[1].record.counterparty, "Umbrella");
        assert_eq!(labeled().due_within(today(), 30, 1).len(), 1);
    }

    #[test]
    fn test_missing_required_column() {
        let result = InvoiceTable::from_bytes("bad.csv", b"Customer Name,Amount (AED)\nAcme,1\n");
        assert!(matches!(result, Err(Error::Parse { .. })));
    }
}
