use crate::error::{DeliveryError, Result};
use crate::gateway::{FileStore, UploadMetadata};
use crate::lookup::normalize;
use crate::video::VideoLinkUpdater;
use log::info;
use std::path::Path;
use std::sync::Arc;

pub const DEFAULT_VIDEO_MIME: &str = "video/mp4";

/// Publishes proof-of-delivery videos and records their links
#[derive(Clone)]
pub struct ProofUploader {
    store: Arc<dyn FileStore>,
    links: VideoLinkUpdater,
    folder: Option<String>,
}

impl ProofUploader {
    pub fn new(store: Arc<dyn FileStore>, links: VideoLinkUpdater) -> Self {
        ProofUploader {
            store,
            links,
            folder: None,
        }
    }

    /// Upload into `folder` instead of the store's root
    pub fn with_folder(mut self, folder: Option<String>) -> Self {
        self.folder = folder;
        self
    }

    /// Upload `video`, make it publicly readable and store its shareable
    /// link in the customer's row. Returns the link.
    ///
    /// The caller owns `video` and is responsible for removing it.
    pub async fn publish(&self, cid: &str, video: &Path, mime_type: &str) -> Result<String> {
        let cid = normalize(cid);
        if cid.is_empty() {
            return Err(DeliveryError::Validation("CID not provided".to_string()));
        }

        let metadata =
            UploadMetadata::new(format!("{}_proof.mp4", cid)).in_folder(self.folder.as_deref());
        let object_id = self.store.upload(video, mime_type, &metadata).await?;
        self.store.set_public_readable(&object_id).await?;
        let url = self.store.public_url(&object_id);

        self.links.update(&cid, &url).await?;
        info!("Proof video for CID {} published at {}", cid, url);
        Ok(url)
    }
}
