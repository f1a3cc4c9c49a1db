//! Header scan and row scan shared by the resolver and both updaters.

use crate::error::{DeliveryError, Result};
use crate::gateway::SheetGateway;
use log::debug;

/// Trim and uppercase, the form in which CIDs and header text are compared
pub fn normalize(text: &str) -> String {
    text.trim().to_uppercase()
}

/// Parse a quantity cell, reading anything that is not a plain non-negative
/// integer (blank, text, decimals, overflow) as zero.
///
/// # Examples
/// ```
/// use delivery_verification::lookup::parse_quantity;
///
/// assert_eq!(parse_quantity(Some(" 12 ")), 12);
/// assert_eq!(parse_quantity(Some("1.5")), 0);
/// assert_eq!(parse_quantity(None), 0);
/// ```
pub fn parse_quantity(cell: Option<&str>) -> u32 {
    let Some(text) = cell.map(str::trim) else {
        return 0;
    };
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return 0;
    }
    text.parse().unwrap_or(0)
}

/// Offset of `wanted` within a header row, compared after normalisation
pub fn find_column(headers: &[String], wanted: &str) -> Result<usize> {
    let wanted = normalize(wanted);
    headers
        .iter()
        .position(|h| normalize(h) == wanted)
        .ok_or_else(|| {
            DeliveryError::Configuration(format!("expected header '{}' is missing", wanted))
        })
}

/// Index of the first row whose key column equals the normalised CID
pub fn find_row(data: &[Vec<String>], key_col: usize, cid: &str) -> Option<usize> {
    data.iter()
        .position(|row| row.get(key_col).is_some_and(|key| normalize(key) == cid))
}

/// Read a single-row range, yielding an empty row when the service returns nothing
pub async fn read_row(gateway: &dyn SheetGateway, range: &str) -> Result<Vec<String>> {
    let rows = gateway.get(range).await?;
    Ok(rows.into_iter().next().unwrap_or_default())
}

/// Offset of the matched row within the data range, with the header row it
/// was matched against
pub struct RowMatch {
    pub index: usize,
    pub headers: Vec<String>,
}

/// Header scan followed by a top-to-bottom scan of the primary block.
///
/// Returns `None` when no row carries `cid`. The header row comes back with
/// the match so callers can locate further columns without another read.
pub async fn locate(
    gateway: &dyn SheetGateway,
    header_range: &str,
    data_range: &str,
    request_id_header: &str,
    cid: &str,
) -> Result<Option<RowMatch>> {
    let headers = read_row(gateway, header_range).await?;
    let key_col = find_column(&headers, request_id_header)?;
    let data = gateway.get(data_range).await?;

    match find_row(&data, key_col, cid) {
        Some(index) => {
            debug!("CID {} matched data row {}", cid, index);
            Ok(Some(RowMatch { index, headers }))
        }
        None => {
            debug!("CID {} not found among {} rows", cid, data.len());
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn quantities_default_to_zero() {
        assert_eq!(parse_quantity(Some("3")), 3);
        assert_eq!(parse_quantity(Some("")), 0);
        assert_eq!(parse_quantity(Some("n/a")), 0);
        assert_eq!(parse_quantity(Some("-2")), 0);
        assert_eq!(parse_quantity(Some("99999999999999")), 0);
    }

    #[test]
    fn header_lookup_ignores_case_and_padding() {
        let headers = row(&["  Request ID ", "c/nee name"]);
        assert_eq!(find_column(&headers, "Request ID").unwrap(), 0);
        assert_eq!(find_column(&headers, "C/nee Name").unwrap(), 1);
        assert!(matches!(
            find_column(&headers, "Project Name"),
            Err(DeliveryError::Configuration(_))
        ));
    }

    #[test]
    fn first_matching_row_wins_and_short_rows_are_skipped() {
        let data = vec![row(&[]), row(&[" req1 ", "first"]), row(&["REQ1", "second"])];
        assert_eq!(find_row(&data, 0, "REQ1"), Some(1));
        assert_eq!(find_row(&data, 0, "REQ2"), None);
        assert_eq!(find_row(&data, 3, "REQ1"), None);
    }
}
