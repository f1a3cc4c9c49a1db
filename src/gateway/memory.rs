use super::{FileStore, SheetGateway, UploadMetadata, share_url};
use crate::a1::A1Range;
use crate::error::GatewayError;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Worksheet held in memory, keyed by (row, col), both 1-based
#[derive(Debug, Default)]
pub struct MemorySheet {
    cells: RwLock<BTreeMap<(u32, u32), String>>,
}

impl MemorySheet {
    pub fn new() -> Self {
        MemorySheet::default()
    }

    pub fn set(&self, row: u32, col: u32, value: &str) {
        let mut cells = self.cells.write().unwrap();
        if value.is_empty() {
            cells.remove(&(row, col));
        } else {
            cells.insert((row, col), value.to_string());
        }
    }

    /// Write `values` left to right starting at `first_col`
    pub fn put_row(&self, row: u32, first_col: u32, values: &[&str]) {
        for (offset, value) in values.iter().enumerate() {
            self.set(row, first_col + offset as u32, value);
        }
    }

    pub fn cell(&self, row: u32, col: u32) -> Option<String> {
        self.cells.read().unwrap().get(&(row, col)).cloned()
    }

    fn parse(range: &str) -> Result<A1Range, GatewayError> {
        range.parse().map_err(|e: crate::a1::InvalidRange| GatewayError::Status {
            service: "memory sheet",
            status: 400,
            body: e.to_string(),
        })
    }
}

#[async_trait]
impl SheetGateway for MemorySheet {
    async fn get(&self, range: &str) -> Result<Vec<Vec<String>>, GatewayError> {
        let range = Self::parse(range)?;
        let cells = self.cells.read().unwrap();

        let start_row = range.start_row.unwrap_or(1);
        let end_row = match range.end_row {
            Some(row) => row,
            None => cells
                .keys()
                .filter(|(_, col)| (range.start_col..=range.end_col).contains(col))
                .map(|(row, _)| *row)
                .max()
                .unwrap_or(0),
        };

        let mut rows = Vec::new();
        for r in start_row..=end_row {
            let mut row: Vec<String> = (range.start_col..=range.end_col)
                .map(|c| cells.get(&(r, c)).cloned().unwrap_or_default())
                .collect();
            while row.last().is_some_and(|v| v.is_empty()) {
                row.pop();
            }
            rows.push(row);
        }
        while rows.last().is_some_and(|r| r.is_empty()) {
            rows.pop();
        }
        Ok(rows)
    }

    async fn update(&self, range: &str, values: Vec<Vec<String>>) -> Result<(), GatewayError> {
        let range = Self::parse(range)?;
        let too_wide = values.iter().any(|row| row.len() as u32 > range.width());
        let too_tall = match (range.start_row, range.end_row) {
            (Some(start), Some(end)) => values.len() as u32 > end - start + 1,
            _ => false,
        };
        if too_wide || too_tall {
            return Err(GatewayError::Status {
                service: "memory sheet",
                status: 400,
                body: format!("values exceed range {}", range),
            });
        }

        let start_row = range.start_row.unwrap_or(1);
        for (i, row) in values.iter().enumerate() {
            for (j, value) in row.iter().enumerate() {
                self.set(start_row + i as u32, range.start_col + j as u32, value);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub metadata: UploadMetadata,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub public: bool,
}

/// File store held in memory
#[derive(Debug)]
pub struct MemoryFileStore {
    host: String,
    objects: Mutex<HashMap<String, StoredObject>>,
}

impl Default for MemoryFileStore {
    fn default() -> Self {
        MemoryFileStore {
            host: "drive.google.com".to_string(),
            objects: Mutex::new(HashMap::new()),
        }
    }
}

impl MemoryFileStore {
    pub fn new() -> Self {
        MemoryFileStore::default()
    }

    pub fn object(&self, id: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn upload(
        &self,
        local_path: &Path,
        mime_type: &str,
        metadata: &UploadMetadata,
    ) -> Result<String, GatewayError> {
        let bytes = std::fs::read(local_path)?;
        let id = Uuid::new_v4().simple().to_string();
        self.objects.lock().unwrap().insert(
            id.clone(),
            StoredObject {
                metadata: metadata.clone(),
                mime_type: mime_type.to_string(),
                bytes,
                public: false,
            },
        );
        Ok(id)
    }

    async fn set_public_readable(&self, object_id: &str) -> Result<(), GatewayError> {
        match self.objects.lock().unwrap().get_mut(object_id) {
            Some(object) => {
                object.public = true;
                Ok(())
            }
            None => Err(GatewayError::Status {
                service: "memory file store",
                status: 404,
                body: format!("file {} not found", object_id),
            }),
        }
    }

    fn public_url(&self, object_id: &str) -> String {
        share_url(&self.host, object_id)
    }
}
