use crate::error::{DeliveryError, Result};
use crate::gateway::SheetGateway;
use crate::layout::SheetLayout;
use crate::lookup::{self, find_column, normalize, parse_quantity, read_row};
use crate::model::{CustomerRecord, Item};
use log::{debug, info};
use std::sync::Arc;

/// Looks customers up by CID in the shared worksheet
///
/// Every call re-reads the header row and the blocks it needs; nothing is
/// cached between requests.
#[derive(Clone)]
pub struct CustomerSheet {
    gateway: Arc<dyn SheetGateway>,
    layout: Arc<SheetLayout>,
}

impl CustomerSheet {
    pub fn new(gateway: Arc<dyn SheetGateway>, layout: Arc<SheetLayout>) -> Self {
        CustomerSheet { gateway, layout }
    }

    /// Find the row for `cid` and assemble its record.
    ///
    /// The CID is trimmed and uppercased before comparison, and the first
    /// matching row wins. Returns `Ok(None)` when no row matches; errors are
    /// reserved for a broken layout or a failing gateway.
    ///
    /// # Errors
    /// * `Configuration` if a required header is absent or the quantity
    ///   blocks hold more rows than the primary block
    /// * `Gateway` if any read fails
    pub async fn resolve(&self, cid: &str) -> Result<Option<CustomerRecord>> {
        let cid = normalize(cid);
        if cid.is_empty() {
            return Ok(None);
        }
        let layout = &self.layout;
        let gateway = self.gateway.as_ref();

        let headers = read_row(gateway, &layout.header_range()).await?;
        let names = &layout.headers;
        let request_id_col = find_column(&headers, &names.request_id)?;
        let name_col = find_column(&headers, &names.name)?;
        let project_col = find_column(&headers, &names.project)?;
        let address_col = find_column(&headers, &names.address)?;

        let data = gateway.get(&layout.data_range()).await?;
        let sent = gateway.get(&layout.sent_range()).await?;
        let received = gateway.get(&layout.received_range()).await?;
        let item_names = read_row(gateway, &layout.sent_header_range()).await?;

        check_alignment(data.len(), sent.len(), received.len())?;

        let Some(index) = lookup::find_row(&data, request_id_col, &cid) else {
            info!("No matching CID found: {} ({} rows scanned)", cid, data.len());
            return Ok(None);
        };
        debug!("CID {} found on sheet row {}", cid, layout.row_number(index));

        let row = &data[index];
        let field = |col: usize, default: &str| {
            row.get(col)
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };

        let empty = Vec::new();
        let items = collect_items(
            &item_names,
            sent.get(index).unwrap_or(&empty),
            received.get(index).unwrap_or(&empty),
            &layout.excluded_items,
        );

        Ok(Some(CustomerRecord {
            name: field(name_col, "Unknown"),
            project: field(project_col, "Unknown"),
            address: field(address_col, ""),
            cid,
            items,
        }))
    }
}

/// The quantity blocks share the primary block's rows. The service drops
/// trailing empty rows, so a shorter block is fine; a longer one means the
/// ranges are not aligned.
fn check_alignment(primary: usize, sent: usize, received: usize) -> Result<()> {
    if sent > primary || received > primary {
        return Err(DeliveryError::Configuration(format!(
            "quantity blocks are not aligned with the primary block \
             ({} primary rows, {} sent, {} received)",
            primary, sent, received
        )));
    }
    Ok(())
}

/// Pair sent and received quantities column by column, keeping only lines
/// where something was sent or received
fn collect_items(
    names: &[String],
    sent: &[String],
    received: &[String],
    excluded: &[String],
) -> Vec<Item> {
    names
        .iter()
        .enumerate()
        .filter(|(_, name)| {
            let name = normalize(name);
            !excluded.iter().any(|e| normalize(e) == name)
        })
        .map(|(j, name)| Item {
            name: name.trim().to_string(),
            sent: parse_quantity(sent.get(j).map(String::as_str)),
            received: parse_quantity(received.get(j).map(String::as_str)),
        })
        .filter(|item| item.sent > 0 || item.received > 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn zero_lines_and_non_products_are_dropped() {
        let items = collect_items(
            &strings(&["Box", "Tape", "Pincode", " Cable "]),
            &strings(&["3", "0", "560001", ""]),
            &strings(&["1", "", "0", "2"]),
            &strings(&["PINCODE"]),
        );
        assert_eq!(
            items,
            vec![
                Item {
                    name: "Box".into(),
                    sent: 3,
                    received: 1
                },
                Item {
                    name: "Cable".into(),
                    sent: 0,
                    received: 2
                },
            ]
        );
    }

    #[test]
    fn longer_quantity_blocks_are_misaligned() {
        assert!(check_alignment(4, 2, 0).is_ok());
        assert!(check_alignment(4, 4, 4).is_ok());
        assert!(check_alignment(2, 3, 0).is_err());
    }
}
