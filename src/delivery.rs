use crate::error::{DeliveryError, Result};
use crate::gateway::SheetGateway;
use crate::layout::SheetLayout;
use crate::lookup::{self, normalize, read_row};
use log::{info, warn};
use std::collections::HashMap;
use std::sync::Arc;

/// Writes confirmed received quantities back to the worksheet
#[derive(Clone)]
pub struct DeliveryUpdater {
    gateway: Arc<dyn SheetGateway>,
    layout: Arc<SheetLayout>,
}

impl DeliveryUpdater {
    pub fn new(gateway: Arc<dyn SheetGateway>, layout: Arc<SheetLayout>) -> Self {
        DeliveryUpdater { gateway, layout }
    }

    /// Overwrite the received block of the row matching `cid`.
    ///
    /// Keys of `received` are matched against the received headers after
    /// trimming and uppercasing. Every received column is written in one
    /// range update: columns with no entry in `received` are set to 0, and
    /// keys that name no column are ignored. Non-product columns listed in
    /// [`SheetLayout::excluded_items`] keep their current value.
    ///
    /// Concurrent updates for the same CID are not coordinated; the last
    /// write wins.
    pub async fn update(&self, cid: &str, received: &HashMap<String, u32>) -> Result<()> {
        let cid = normalize(cid);
        if cid.is_empty() {
            return Err(DeliveryError::Validation("CID not provided".to_string()));
        }
        let layout = &self.layout;
        let gateway = self.gateway.as_ref();

        let found = lookup::locate(
            gateway,
            &layout.header_range(),
            &layout.data_range(),
            &layout.headers.request_id,
            &cid,
        )
        .await?
        .ok_or_else(|| DeliveryError::NotFound(cid.clone()))?;
        let row_number = layout.row_number(found.index);

        let headers = read_row(gateway, &layout.received_header_range()).await?;
        if headers.is_empty() {
            return Err(DeliveryError::Configuration(
                "received block has no item headers".to_string(),
            ));
        }

        let quantities: HashMap<String, u32> = received
            .iter()
            .map(|(name, qty)| (normalize(name), *qty))
            .collect();
        let known: Vec<String> = headers.iter().map(|h| normalize(h)).collect();
        let excluded: Vec<String> = layout.excluded_items.iter().map(|e| normalize(e)).collect();
        for name in quantities.keys() {
            if !known.contains(name) || excluded.contains(name) {
                warn!("Ignoring received quantity for unknown item '{}' (CID {})", name, cid);
            }
        }

        let range = layout
            .received
            .prefix_on_row(row_number, known.len() as u32)
            .to_string();
        let current = if known.iter().any(|h| excluded.contains(h)) {
            read_row(gateway, &range).await?
        } else {
            Vec::new()
        };

        let values: Vec<String> = known
            .iter()
            .enumerate()
            .map(|(j, h)| {
                if excluded.contains(h) {
                    current.get(j).cloned().unwrap_or_default()
                } else {
                    quantities.get(h).copied().unwrap_or(0).to_string()
                }
            })
            .collect();

        gateway.update(&range, vec![values]).await?;
        info!("Recorded delivery for CID {} in {}", cid, range);
        Ok(())
    }
}
