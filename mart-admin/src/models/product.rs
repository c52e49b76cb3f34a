use super::pagination::PageInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sku: String,
    pub price: f64,
    pub stock: i64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    pub fn price_label(&self) -> String {
        format!("¥{:.0}", self.price)
    }

    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    pub fn category_text(&self) -> &str {
        self.category.as_deref().unwrap_or_default()
    }

    pub fn updated_label(&self) -> String {
        self.updated_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductList {
    pub products: Vec<Product>,
    pub total: u64,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub per_page: u32,
}

fn first_page() -> u32 {
    1
}

impl ProductList {
    pub fn page_info(&self) -> PageInfo {
        let per_page = if self.per_page == 0 {
            self.products.len().max(1) as u32
        } else {
            self.per_page
        };
        PageInfo::new(self.page, per_page, self.total)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Product form as posted by the create and edit pages.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProductForm {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 64))]
    pub sku: String,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[validate(range(min = 0))]
    pub stock: i64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
}

/// Body of `POST /api/products` and `PATCH /api/products/{id}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    pub name: String,
    pub sku: String,
    pub price: f64,
    pub stock: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl From<ProductForm> for ProductPayload {
    fn from(form: ProductForm) -> Self {
        Self {
            name: form.name.trim().to_string(),
            sku: form.sku.trim().to_string(),
            price: form.price,
            stock: form.stock,
            status: non_empty(form.status),
            category: non_empty(form.category),
            description: non_empty(form.description),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backend_listing() {
        let list: ProductList = serde_json::from_value(serde_json::json!({
            "products": [{
                "id": "p1",
                "name": "Oat milk",
                "sku": "OAT-1",
                "price": 298.0,
                "stock": 12,
                "status": "販売中",
                "createdAt": "2030-01-02T03:04:05Z",
                "updatedAt": "2030-01-02T03:04:05Z"
            }],
            "total": 41,
            "page": 2,
            "perPage": 20
        }))
        .unwrap();

        assert_eq!(list.products[0].price_label(), "¥298");
        assert_eq!(list.products[0].updated_label(), "2030-01-02 03:04");
        let info = list.page_info();
        assert_eq!(info.total_pages(), 3);
        assert!(info.has_next());
    }

    #[test]
    fn form_blanks_are_dropped_from_payload() {
        let form = ProductForm {
            name: " Oat milk ".into(),
            sku: "OAT-1".into(),
            price: 298.0,
            stock: 3,
            status: String::new(),
            category: "Dairy".into(),
            description: "  ".into(),
        };
        assert!(form.validate().is_ok());

        let json = serde_json::to_value(ProductPayload::from(form)).unwrap();
        assert_eq!(json["name"], "Oat milk");
        assert_eq!(json["category"], "Dairy");
        assert!(json.get("status").is_none());
        assert!(json.get("description").is_none());
    }

    #[test]
    fn negative_stock_fails_validation() {
        let form = ProductForm {
            name: "x".into(),
            sku: "y".into(),
            price: 1.0,
            stock: -1,
            status: String::new(),
            category: String::new(),
            description: String::new(),
        };
        assert!(form.validate().is_err());
    }
}
