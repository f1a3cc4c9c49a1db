//! Seams to the two external services.
//!
//! Components receive an `Arc<dyn SheetGateway>` / `Arc<dyn FileStore>` at
//! construction, so the HTTP clients in [`google`] and the in-memory doubles
//! in [`memory`] are interchangeable.

use crate::a1::A1Range;
use crate::error::GatewayError;
use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;

#[cfg(feature = "web")]
pub mod google;
pub mod memory;

pub use memory::{MemoryFileStore, MemorySheet, StoredObject};

/// Range-based access to the shared worksheet.
///
/// Ranges are A1 notation relative to the configured worksheet, e.g.
/// `B5:FA` or `BB12:CA12`. Reads return rows as the service does: trailing
/// empty cells and trailing empty rows are omitted.
#[async_trait]
pub trait SheetGateway: Send + Sync {
    async fn get(&self, range: &str) -> Result<Vec<Vec<String>>, GatewayError>;

    async fn update(&self, range: &str, values: Vec<Vec<String>>) -> Result<(), GatewayError>;

    async fn update_cell(&self, row: u32, col: u32, value: &str) -> Result<(), GatewayError> {
        let range = A1Range::cell(row, col).to_string();
        self.update(&range, vec![vec![value.to_string()]]).await
    }
}

/// Metadata attached to an uploaded object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadMetadata {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
}

impl UploadMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        UploadMetadata {
            name: name.into(),
            parents: Vec::new(),
        }
    }

    pub fn in_folder(mut self, folder: Option<&str>) -> Self {
        if let Some(folder) = folder {
            self.parents.push(folder.to_string());
        }
        self
    }
}

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Upload a local file and return the new object's id
    async fn upload(
        &self,
        local_path: &Path,
        mime_type: &str,
        metadata: &UploadMetadata,
    ) -> Result<String, GatewayError>;

    async fn set_public_readable(&self, object_id: &str) -> Result<(), GatewayError>;

    /// Shareable link for an object that has been made public
    fn public_url(&self, object_id: &str) -> String;
}

pub fn share_url(host: &str, object_id: &str) -> String {
    format!("https://{}/file/d/{}/view?usp=sharing", host, object_id)
}
