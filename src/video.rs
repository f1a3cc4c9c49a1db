use crate::error::{DeliveryError, Result};
use crate::gateway::SheetGateway;
use crate::layout::SheetLayout;
use crate::lookup::{self, find_column, normalize};
use log::info;
use std::sync::Arc;

/// Stores the proof-video link in the row matching a CID.
///
/// The target column is found by its header text, like every other column.
#[derive(Clone)]
pub struct VideoLinkUpdater {
    gateway: Arc<dyn SheetGateway>,
    layout: Arc<SheetLayout>,
}

impl VideoLinkUpdater {
    pub fn new(gateway: Arc<dyn SheetGateway>, layout: Arc<SheetLayout>) -> Self {
        VideoLinkUpdater { gateway, layout }
    }

    pub async fn update(&self, cid: &str, url: &str) -> Result<()> {
        let cid = normalize(cid);
        if cid.is_empty() {
            return Err(DeliveryError::Validation("CID not provided".to_string()));
        }
        let layout = &self.layout;

        let found = lookup::locate(
            self.gateway.as_ref(),
            &layout.header_range(),
            &layout.data_range(),
            &layout.headers.request_id,
            &cid,
        )
        .await?
        .ok_or_else(|| DeliveryError::NotFound(cid.clone()))?;

        let offset = find_column(&found.headers, &layout.headers.video_link)?;
        let row = layout.row_number(found.index);
        let col = layout.primary.first + offset as u32;

        self.gateway.update_cell(row, col, url).await?;
        info!("Stored video link for CID {} at row {}", cid, row);
        Ok(())
    }
}
