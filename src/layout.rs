//! Where things live in the shared worksheet.
//!
//! The worksheet has no schema: a single header row names the columns, and
//! customer rows start a couple of rows below it. Three column spans matter:
//! the primary block (one row per request), and the "sent" and "received"
//! quantity blocks, which share the primary block's rows.

use crate::a1::{A1Range, InvalidRange};
use crate::error::{DeliveryError, Result};
use std::str::FromStr;

/// An inclusive span of 1-based columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpan {
    pub first: u32,
    pub last: u32,
}

impl ColumnSpan {
    pub fn new(first: u32, last: u32) -> Self {
        ColumnSpan { first, last }
    }

    pub fn width(&self) -> u32 {
        self.last.saturating_sub(self.first) + 1
    }

    /// The span on a single row
    pub fn on_row(&self, row: u32) -> A1Range {
        A1Range::row(row, self.first, self.last)
    }

    /// The span from `row` down to the last populated row
    pub fn from_row(&self, row: u32) -> A1Range {
        A1Range::new(self.first, Some(row), self.last, None)
    }

    /// The first `len` columns of the span on a single row
    pub fn prefix_on_row(&self, row: u32, len: u32) -> A1Range {
        A1Range::row(row, self.first, self.first + len.max(1) - 1)
    }
}

impl FromStr for ColumnSpan {
    type Err = InvalidRange;

    /// Accepts `W:AV` or a bare column such as `W`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let range: A1Range = s.parse()?;
        if range.start_row.is_some() || range.end_row.is_some() {
            return Err(InvalidRange(s.to_string()));
        }
        Ok(ColumnSpan::new(range.start_col, range.end_col))
    }
}

/// Header text expected in the header row for each field the service reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderNames {
    pub request_id: String,
    pub name: String,
    pub project: String,
    pub address: String,
    pub video_link: String,
}

impl Default for HeaderNames {
    fn default() -> Self {
        HeaderNames {
            request_id: "Request ID".to_string(),
            name: "C/nee Name".to_string(),
            project: "Project Name".to_string(),
            address: "Shipping Address".to_string(),
            video_link: "Video Link".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLayout {
    pub header_row: u32,
    pub first_data_row: u32,
    pub primary: ColumnSpan,
    pub sent: ColumnSpan,
    pub received: ColumnSpan,
    pub headers: HeaderNames,
    /// Columns inside the quantity blocks that are not products
    pub excluded_items: Vec<String>,
}

impl Default for SheetLayout {
    fn default() -> Self {
        SheetLayout {
            header_row: 3,
            first_data_row: 5,
            primary: ColumnSpan::new(2, 157),   // B:FA
            sent: ColumnSpan::new(23, 48),      // W:AV
            received: ColumnSpan::new(54, 79),  // BB:CA
            headers: HeaderNames::default(),
            excluded_items: ["Pincode", "C/nee Number", "C/nee No", "Vendor No"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl SheetLayout {
    pub fn validate(&self) -> Result<()> {
        if self.first_data_row <= self.header_row {
            return Err(DeliveryError::Configuration(format!(
                "first data row {} must be below header row {}",
                self.first_data_row, self.header_row
            )));
        }
        for (label, span) in [
            ("primary", self.primary),
            ("sent", self.sent),
            ("received", self.received),
        ] {
            if span.first == 0 || span.last < span.first {
                return Err(DeliveryError::Configuration(format!(
                    "{} column span is empty or reversed",
                    label
                )));
            }
        }
        if self.sent.width() != self.received.width() {
            return Err(DeliveryError::Configuration(format!(
                "sent block has {} columns but received block has {}",
                self.sent.width(),
                self.received.width()
            )));
        }
        Ok(())
    }

    pub fn header_range(&self) -> String {
        self.primary.on_row(self.header_row).to_string()
    }

    pub fn data_range(&self) -> String {
        self.primary.from_row(self.first_data_row).to_string()
    }

    pub fn sent_header_range(&self) -> String {
        self.sent.on_row(self.header_row).to_string()
    }

    pub fn sent_range(&self) -> String {
        self.sent.from_row(self.first_data_row).to_string()
    }

    pub fn received_header_range(&self) -> String {
        self.received.on_row(self.header_row).to_string()
    }

    pub fn received_range(&self) -> String {
        self.received.from_row(self.first_data_row).to_string()
    }

    /// Sheet row number of the `index`-th row returned by a data range read
    pub fn row_number(&self, index: usize) -> u32 {
        self.first_data_row + index as u32
    }
}
