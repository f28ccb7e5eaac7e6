//! Catalog queries.
//!
//! Listing goes to the store; search and the featured subset are pure
//! functions over an already-fetched listing.

use std::borrow::Cow;

use tracing::instrument;

use minimart_backend::{DataClient, Direction, Product, Query, RepositoryError, Table};
use minimart_core::ProductId;

/// Read access to the `products` table.
#[derive(Clone, Copy)]
pub struct Catalog<'a> {
    products: Table<'a, Product>,
}

impl<'a> Catalog<'a> {
    #[must_use]
    pub fn new(client: &'a dyn DataClient) -> Self {
        Self {
            products: Table::new(client),
        }
    }

    /// Every product, newest first.
    ///
    /// Rows that do not decode are skipped and logged.
    ///
    /// # Errors
    ///
    /// Returns the store's error.
    #[instrument(skip(self))]
    pub async fn fetch_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = self
            .products
            .select_lenient(&Query::new().order_by("created_at", Direction::Descending))
            .await?;
        tracing::debug!(count = products.len(), "Fetched catalog");
        Ok(products)
    }

    /// A single product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such product.
    #[instrument(skip(self))]
    pub async fn get(&self, id: ProductId) -> Result<Product, RepositoryError> {
        self.products
            .get(id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }
}

/// Products whose name, category, or description contains `query`,
/// ignoring case, in listing order.
///
/// A blank query returns the listing itself.
#[must_use]
pub fn filter<'p>(products: &'p [Product], query: &str) -> Cow<'p, [Product]> {
    if query.trim().is_empty() {
        return Cow::Borrowed(products);
    }
    let needle = query.to_lowercase();
    Cow::Owned(
        products
            .iter()
            .filter(|p| matches(p, &needle))
            .cloned()
            .collect(),
    )
}

fn matches(product: &Product, needle: &str) -> bool {
    product.name.to_lowercase().contains(needle)
        || product.category.to_lowercase().contains(needle)
        || product
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(needle))
}

/// Featured products, in listing order. Unaffected by any search query.
#[must_use]
pub fn featured(products: &[Product]) -> Vec<&Product> {
    products.iter().filter(|p| p.featured).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use minimart_backend::{MemoryClient, ProductFields};

    use super::*;

    fn product(name: &str, category: &str, description: Option<&str>, featured: bool) -> Product {
        Product {
            id: ProductId::generate(),
            name: name.to_owned(),
            description: description.map(str::to_owned),
            price: Decimal::new(2500, 2),
            image_url: None,
            category: category.to_owned(),
            stock: 10,
            featured,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn shelf() -> Vec<Product> {
        vec![
            product("Chicharon", "Chips", Some("Crunchy pork rinds"), true),
            product("Polvoron", "Sweets", Some("Milk candy"), false),
            product("Calamansi Juice", "Beverages", None, false),
            product("Dried Mangoes", "Dried Fruits", Some("Sweet and chewy"), true),
        ]
    }

    #[test]
    fn test_blank_query_is_identity() {
        let products = shelf();
        for query in ["", "   ", "\t"] {
            let filtered = filter(&products, query);
            assert!(matches!(filtered, Cow::Borrowed(_)));
            assert_eq!(filtered.as_ref(), products.as_slice());
        }
    }

    #[test]
    fn test_filter_matches_name_category_description() {
        let products = shelf();

        let by_name = filter(&products, "POLV");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].name, "Polvoron");

        let by_category = filter(&products, "beverages");
        assert_eq!(by_category[0].name, "Calamansi Juice");

        let by_description = filter(&products, "chewy");
        assert_eq!(by_description[0].name, "Dried Mangoes");

        assert!(filter(&products, "adobo").is_empty());
    }

    #[test]
    fn test_filter_is_ordered_subsequence() {
        let products = shelf();
        // "sweet" hits Polvoron (category) and Dried Mangoes (description).
        let filtered = filter(&products, "sweet");
        let names: Vec<_> = filtered.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Polvoron", "Dried Mangoes"]);
        assert!(filtered.iter().all(|p| products.contains(p)));
    }

    #[test]
    fn test_featured_ignores_query() {
        let products = shelf();
        let names: Vec<_> = featured(&products).iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Chicharon", "Dried Mangoes"]);
    }

    #[tokio::test]
    async fn test_fetch_all_empty_catalog() {
        let client = MemoryClient::new();
        let products = Catalog::new(&client).fetch_all().await.unwrap();
        assert!(products.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_all_newest_first_and_get() {
        let client = MemoryClient::new();
        let table = Table::<Product>::new(&client);
        for name in ["Chicharon", "Banana Chips"] {
            table
                .insert(&ProductFields {
                    name: name.to_owned(),
                    description: None,
                    price: Decimal::new(1500, 2),
                    image_url: None,
                    category: "Chips".to_owned(),
                    stock: 5,
                    featured: false,
                })
                .await
                .unwrap();
        }

        let catalog = Catalog::new(&client);
        let products = catalog.fetch_all().await.unwrap();
        assert_eq!(products[0].name, "Banana Chips");
        assert_eq!(products[1].name, "Chicharon");

        let fetched = catalog.get(products[1].id).await.unwrap();
        assert_eq!(fetched.name, "Chicharon");
        assert!(matches!(
            catalog.get(ProductId::generate()).await,
            Err(RepositoryError::NotFound)
        ));
    }
}
