use super::pagination::PageInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Kind of stock movement, in the backend's wire vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryChange {
    #[serde(rename = "入庫")]
    Inbound,
    #[serde(rename = "出庫")]
    Outbound,
    #[serde(rename = "在庫調整")]
    Adjustment,
}

impl InventoryChange {
    pub const ALL: [InventoryChange; 3] = [
        InventoryChange::Inbound,
        InventoryChange::Outbound,
        InventoryChange::Adjustment,
    ];

    pub fn wire(self) -> &'static str {
        match self {
            InventoryChange::Inbound => "入庫",
            InventoryChange::Outbound => "出庫",
            InventoryChange::Adjustment => "在庫調整",
        }
    }

    /// Parse a wire value, e.g. from a filter `<select>`.
    pub fn from_wire(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|item| item.wire() == value)
    }

    pub fn label(self) -> &'static str {
        match self {
            InventoryChange::Inbound => "Inbound",
            InventoryChange::Outbound => "Outbound",
            InventoryChange::Adjustment => "Adjustment",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryHistory {
    pub id: String,
    pub product_id: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(rename = "type")]
    pub change: InventoryChange,
    pub quantity: i64,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: String,
}

impl InventoryHistory {
    pub fn created_label(&self) -> String {
        self.created_at.format("%Y-%m-%d %H:%M").to_string()
    }

    pub fn note_text(&self) -> &str {
        self.note.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryHistoryList {
    pub histories: Vec<InventoryHistory>,
    pub total: u64,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub per_page: u32,
}

fn first_page() -> u32 {
    1
}

impl InventoryHistoryList {
    pub fn page_info(&self) -> PageInfo {
        let per_page = if self.per_page == 0 {
            self.histories.len().max(1) as u32
        } else {
            self.per_page
        };
        PageInfo::new(self.page, per_page, self.total)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub change: Option<InventoryChange>,
}

/// Stock adjustment form; also the JSON body of `POST /api/inventory/update`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InventoryUpdate {
    #[validate(length(min = 1))]
    pub product_id: String,
    #[serde(rename = "type")]
    pub change: InventoryChange,
    #[validate(range(min = 1))]
    pub quantity: i64,
    #[validate(length(min = 1, max = 200))]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}
