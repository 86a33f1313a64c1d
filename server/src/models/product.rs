//! Catalog products.

use serde::{Deserialize, Serialize};

use crate::auth::Resource;
use crate::repository::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    pub stock: u32,
}

/// Body accepted when creating or replacing a product.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    pub stock: u32,
}

impl Record for Product {
    type New = NewProduct;
    type View = Self;

    const RESOURCE: Resource = Resource::Products;

    fn from_new(new: NewProduct) -> Self {
        Self {
            id: String::new(),
            name: new.name,
            description: new.description,
            price: new.price,
            stock: new.stock,
        }
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}
