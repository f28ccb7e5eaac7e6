//! First-run setup: sample catalog and a store health report.

use std::time::Instant;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use minimart_backend::{
    Buyer, CartItem, DataClient, Product, ProductFields, Profile, Query, Record, RepositoryError,
    Table, Transaction,
};

/// Name, description, price in centavos, category, stock, featured, image.
type Sample = (&'static str, &'static str, i64, &'static str, i32, bool, &'static str);

const SAMPLES: [Sample; 4] = [
    (
        "Chicharon",
        "Crispy pork skin snack, a Filipino favorite",
        2500,
        "Chips",
        50,
        true,
        "photo-1566478989037-eec170784d0b",
    ),
    (
        "Banana Chips",
        "Sweet and crispy banana chips",
        1500,
        "Chips",
        75,
        true,
        "photo-1587132161949-b47d2ad79de8",
    ),
    (
        "Polvoron",
        "Traditional Filipino shortbread confection",
        3500,
        "Sweets",
        30,
        false,
        "photo-1578985545062-69928b1d9587",
    ),
    (
        "Dried Mangoes",
        "Sweet dried Philippine mangoes",
        4500,
        "Dried Fruits",
        40,
        true,
        "photo-1605027990121-cbae9fc09d5a",
    ),
];

/// The starter catalog.
#[must_use]
pub fn sample_products() -> Vec<ProductFields> {
    SAMPLES
        .iter()
        .map(
            |&(name, description, centavos, category, stock, featured, image)| ProductFields {
                name: name.to_owned(),
                description: Some(description.to_owned()),
                price: Decimal::new(centavos, 2),
                image_url: Some(format!("https://images.unsplash.com/{image}?w=400")),
                category: category.to_owned(),
                stock,
                featured,
            },
        )
        .collect()
}

/// What [`seed`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SeedOutcome {
    /// The catalog was empty and the samples were inserted.
    Seeded { inserted: usize },
    /// The catalog already had products; nothing was written.
    AlreadyPresent,
}

/// Insert the sample catalog into an empty store.
///
/// # Errors
///
/// Returns the data client's error. Products inserted before a failure stay.
#[instrument(skip_all)]
pub async fn seed(client: &dyn DataClient) -> Result<SeedOutcome, RepositoryError> {
    let products = Table::<Product>::new(client);
    if !client
        .select(Product::TABLE, &Query::new().limit(1))
        .await?
        .is_empty()
    {
        tracing::info!("Catalog already has products; skipping seed");
        return Ok(SeedOutcome::AlreadyPresent);
    }

    let samples = sample_products();
    for fields in &samples {
        products.insert(fields).await?;
    }
    tracing::info!(inserted = samples.len(), "Seeded sample products");
    Ok(SeedOutcome::Seeded {
        inserted: samples.len(),
    })
}

/// Reachability of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableAccess {
    pub table: &'static str,
    pub accessible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Store health report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub connected: bool,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub tables: Vec<TableAccess>,
}

impl HealthReport {
    /// Connected and every table readable.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.connected && self.tables.iter().all(|t| t.accessible)
    }
}

/// Tables the application reads and writes.
pub const TABLES: [&str; 5] = [
    Product::TABLE,
    CartItem::TABLE,
    Buyer::TABLE,
    Transaction::TABLE,
    Profile::TABLE,
];

/// Ping the store, timing the round trip, then try a one-row read of each
/// table.
#[instrument(skip_all)]
pub async fn check(client: &dyn DataClient) -> HealthReport {
    let started = Instant::now();
    let ping = client.ping().await;
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let mut tables = Vec::with_capacity(TABLES.len());
    for table in TABLES {
        let access = client.select(table, &Query::new().limit(1)).await;
        tables.push(TableAccess {
            table,
            accessible: access.is_ok(),
            error: access.err().map(|e| e.to_string()),
        });
    }

    let report = HealthReport {
        connected: ping.is_ok(),
        latency_ms,
        error: ping.err().map(|e| e.to_string()),
        tables,
    };
    if report.is_healthy() {
        tracing::info!(latency_ms, "Store check passed");
    } else {
        tracing::warn!(?report, "Store check failed");
    }
    report
}
