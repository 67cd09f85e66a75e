use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Dish category, joined onto every dish read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Menu item as stored by the menu service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    pub id: i64,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub description: String,
    pub category_id: i64,
    pub available_quantity: i32,
    pub category: Option<Category>,
}

/// Optional category details supplied alongside a dish payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryPayload {
    #[serde(default)]
    pub name: String,
}

/// Request model for creating or fully replacing a dish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DishRequest {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
    pub category_id: i64,
    #[serde(default)]
    pub available_quantity: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryPayload>,
}

/// Dish fields handed to the repository for insertion
#[derive(Debug, Clone, PartialEq)]
pub struct NewDish {
    pub name: String,
    pub price: Decimal,
    pub description: String,
    pub category_id: i64,
    pub category_name: String,
    pub available_quantity: i32,
}

impl DishRequest {
    /// Name used when the referenced category has to be created on the fly
    pub fn category_name(&self) -> String {
        self.category
            .as_ref()
            .map(|category| category.name.trim().to_string())
            .unwrap_or_default()
    }
}

impl From<DishRequest> for NewDish {
    fn from(request: DishRequest) -> Self {
        let category_name = request.category_name();
        Self {
            name: request.name,
            price: request.price,
            description: request.description,
            category_id: request.category_id,
            category_name,
            available_quantity: request.available_quantity,
        }
    }
}
