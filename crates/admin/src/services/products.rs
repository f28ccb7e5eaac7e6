//! Product entity: catalog maintenance.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;

use minimart_backend::{DataClient, Product, ProductFields};
use minimart_core::{Category, ProductId};

use super::crud::{CrudError, Entity, ValidationError};

/// Product form input.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
    pub category: String,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub featured: bool,
}

/// Blank optional text is stored as null.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl Entity for Product {
    type Id = ProductId;
    type Input = ProductInput;
    type Draft = ProductFields;
    type Fields = ProductFields;

    const LABEL: &'static str = "product";

    fn id(&self) -> ProductId {
        self.id
    }

    fn validate(input: ProductInput) -> Result<ProductFields, ValidationError> {
        let mut errors = ValidationError::default();

        let name = input.name.trim().to_owned();
        if name.is_empty() {
            errors.push("name", "Name is required");
        }
        let category = match Category::parse(&input.category) {
            Ok(category) => category.into(),
            Err(e) => {
                errors.push("category", e.to_string());
                String::new()
            }
        };
        if input.price <= Decimal::ZERO {
            errors.push("price", "Price must be greater than zero");
        }
        if input.stock < 0 {
            errors.push("stock", "Stock cannot be negative");
        }
        let image_url = non_blank(input.image_url);
        if let Some(raw) = &image_url {
            let scheme_ok = url::Url::parse(raw)
                .is_ok_and(|url| matches!(url.scheme(), "http" | "https"));
            if !scheme_ok {
                errors.push("image_url", "Image URL must be an http(s) link");
            }
        }

        errors.into_result(ProductFields {
            name,
            description: non_blank(input.description),
            price: input.price,
            image_url,
            category,
            stock: input.stock,
            featured: input.featured,
        })
    }

    async fn resolve(
        draft: ProductFields,
        _current: Option<&Self>,
        _client: &dyn DataClient,
    ) -> Result<ProductFields, CrudError> {
        Ok(draft)
    }
}
