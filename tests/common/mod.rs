#![allow(dead_code)]

use async_trait::async_trait;
use delivery_verification::GatewayError;
use delivery_verification::gateway::{MemorySheet, SheetGateway};
use delivery_verification::layout::SheetLayout;
use std::sync::Arc;

/// Column holding the "Video Link" header in the fixture (CV)
pub const VIDEO_COL: u32 = 100;

/// Worksheet in the default layout with two customers:
///
/// | row | B    | C     | D     | E      | W (Box) | X (Tape) | BB (Box) | BC (Tape) |
/// |-----|------|-------|-------|--------|---------|----------|----------|-----------|
/// | 5   | REQ1 | Alice | ProjX | 123 St | 3       | 0        | 1        | 0         |
/// | 6   | REQ2 | Bob   | ProjY |        | 0       | 5        |          |           |
pub fn fixture_sheet() -> Arc<MemorySheet> {
    let sheet = MemorySheet::new();
    sheet.put_row(
        3,
        2,
        &["Request ID", "C/nee Name", "Project Name", "Shipping Address"],
    );
    sheet.put_row(3, 23, &["Box", "Tape"]);
    sheet.put_row(3, 54, &["Box", "Tape"]);
    sheet.set(3, VIDEO_COL, "Video Link");

    sheet.put_row(5, 2, &["REQ1", "Alice", "ProjX", "123 St"]);
    sheet.put_row(5, 23, &["3", "0"]);
    sheet.put_row(5, 54, &["1", "0"]);

    sheet.put_row(6, 2, &["REQ2", "Bob", "ProjY"]);
    sheet.put_row(6, 23, &["0", "5"]);
    Arc::new(sheet)
}

pub fn layout() -> Arc<SheetLayout> {
    Arc::new(SheetLayout::default())
}

/// Gateway whose every call fails like an unavailable service
pub struct UnavailableSheet;

#[async_trait]
impl SheetGateway for UnavailableSheet {
    async fn get(&self, _range: &str) -> Result<Vec<Vec<String>>, GatewayError> {
        Err(unavailable())
    }

    async fn update(&self, _range: &str, _values: Vec<Vec<String>>) -> Result<(), GatewayError> {
        Err(unavailable())
    }
}

fn unavailable() -> GatewayError {
    GatewayError::Status {
        service: "spreadsheet service",
        status: 503,
        body: "backend unavailable".to_string(),
    }
}
