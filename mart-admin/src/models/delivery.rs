use super::pagination::PageInfo;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// `<input type="datetime-local">` value, with or without seconds.
const LOCAL_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Delivery lifecycle state, in the backend's wire vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    #[serde(rename = "配送準備中")]
    Preparing,
    #[serde(rename = "配送中")]
    InProgress,
    #[serde(rename = "配送完了")]
    Completed,
    #[serde(rename = "配送失敗")]
    Failed,
}

impl DeliveryStatus {
    pub const ALL: [DeliveryStatus; 4] = [
        DeliveryStatus::Preparing,
        DeliveryStatus::InProgress,
        DeliveryStatus::Completed,
        DeliveryStatus::Failed,
    ];

    pub fn wire(self) -> &'static str {
        match self {
            DeliveryStatus::Preparing => "配送準備中",
            DeliveryStatus::InProgress => "配送中",
            DeliveryStatus::Completed => "配送完了",
            DeliveryStatus::Failed => "配送失敗",
        }
    }

    /// Parse a wire value, e.g. from a filter `<select>`.
    pub fn from_wire(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|item| item.wire() == value)
    }

    pub fn label(self) -> &'static str {
        match self {
            DeliveryStatus::Preparing => "Preparing",
            DeliveryStatus::InProgress => "In transit",
            DeliveryStatus::Completed => "Delivered",
            DeliveryStatus::Failed => "Failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingInfo {
    #[serde(default)]
    pub current_location: Option<Location>,
    #[serde(default)]
    pub battery_level: Option<f64>,
    #[serde(default)]
    pub speed: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub id: String,
    #[serde(default)]
    pub delivery_type: String,
    pub address: String,
    pub estimated_delivery_time: DateTime<Utc>,
    #[serde(default)]
    pub actual_delivery_time: Option<DateTime<Utc>>,
    pub status: DeliveryStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tracking_info: Option<TrackingInfo>,
}

impl Delivery {
    pub fn estimated_label(&self) -> String {
        self.estimated_delivery_time.format("%Y-%m-%d %H:%M").to_string()
    }

    pub fn actual_label(&self) -> String {
        self.actual_delivery_time
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string())
    }

    pub fn notes_text(&self) -> &str {
        self.notes.as_deref().unwrap_or_default()
    }

    pub fn location_label(&self) -> String {
        match self.tracking_info.as_ref().and_then(|t| t.current_location) {
            Some(loc) => format!("{:.5}, {:.5}", loc.latitude, loc.longitude),
            None => "-".to_string(),
        }
    }

    pub fn battery_label(&self) -> String {
        match self.tracking_info.as_ref().and_then(|t| t.battery_level) {
            Some(level) => format!("{level:.0}%"),
            None => "-".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryList {
    pub deliveries: Vec<Delivery>,
    pub total: u64,
    #[serde(default = "first_page")]
    pub page: u32,
}

fn first_page() -> u32 {
    1
}

impl DeliveryList {
    pub fn page_info(&self, per_page: u32) -> PageInfo {
        PageInfo::new(self.page, per_page, self.total)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DeliveryQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DeliveryStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryHistoryEntry {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub note: Option<String>,
}

impl DeliveryHistoryEntry {
    pub fn timestamp_label(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M").to_string()
    }

    pub fn note_text(&self) -> &str {
        self.note.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryHistory {
    #[serde(default)]
    pub history: Vec<DeliveryHistoryEntry>,
}

/// Status change form; also the JSON body of `PATCH /api/deliveries/{id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryStatusUpdate {
    pub status: DeliveryStatus,
}

/// Body of `PATCH /api/deliveries/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DeliveryStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_delivery_time: Option<DateTime<Utc>>,
}

/// Delivery edit form. Times are entered and shown in UTC.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct DeliveryEditForm {
    #[serde(default)]
    #[validate(custom(function = "validate_status"))]
    pub status: String,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub notes: String,
    #[serde(default)]
    #[validate(custom(function = "validate_delivery_time"))]
    pub actual_delivery_time: String,
}

fn validate_status(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || DeliveryStatus::from_wire(value).is_some() {
        return Ok(());
    }
    Err(ValidationError::new("unknown_status"))
}

fn validate_delivery_time(value: &str) -> Result<(), ValidationError> {
    parse_local_time(value)
        .map(|_| ())
        .map_err(|_| ValidationError::new("invalid_datetime"))
}

fn parse_local_time(value: &str) -> Result<Option<DateTime<Utc>>, chrono::ParseError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDateTime::parse_from_str(value, LOCAL_TIME_FORMATS[0])
        .or_else(|_| NaiveDateTime::parse_from_str(value, LOCAL_TIME_FORMATS[1]))
        .map(|time| Some(time.and_utc()))
}

impl From<&Delivery> for DeliveryEditForm {
    fn from(delivery: &Delivery) -> Self {
        Self {
            status: delivery.status.wire().to_string(),
            notes: delivery.notes_text().to_string(),
            actual_delivery_time: delivery
                .actual_delivery_time
                .map(|t| t.format(LOCAL_TIME_FORMATS[0]).to_string())
                .unwrap_or_default(),
        }
    }
}

impl DeliveryEditForm {
    /// Backend payload for a form that passed `validate`.
    pub fn to_update(&self) -> DeliveryUpdate {
        DeliveryUpdate {
            status: DeliveryStatus::from_wire(&self.status),
            notes: Some(self.notes.trim().to_string()),
            actual_delivery_time: parse_local_time(&self.actual_delivery_time)
                .ok()
                .flatten(),
        }
    }
}
