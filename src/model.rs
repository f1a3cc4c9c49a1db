use serde::{Deserialize, Serialize};

/// One product line of a delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub sent: u32,
    pub received: u32,
}

/// Customer row assembled from the primary block and both quantity blocks.
///
/// Built fresh on every lookup; the worksheet is the only place it persists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub cid: String,
    pub name: String,
    pub project: String,
    pub address: String,
    pub items: Vec<Item>,
}

impl CustomerRecord {
    /// Placeholder returned to the web client when no row matches
    pub fn unknown(cid: &str) -> Self {
        CustomerRecord {
            cid: cid.to_string(),
            name: "Unknown".to_string(),
            project: "Unknown".to_string(),
            address: String::new(),
            items: Vec::new(),
        }
    }
}
