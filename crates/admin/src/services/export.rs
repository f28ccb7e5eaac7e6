//! CSV export of recorded sales.

use std::collections::HashMap;

use chrono::NaiveDate;

use minimart_backend::{
    Buyer, DataClient, Direction, Product, Query, RepositoryError, Table, Transaction,
};
use minimart_core::{BuyerId, CurrencyCode, ProductId};

/// Column headings, in order.
pub const HEADER: [&str; 11] = [
    "Transaction ID",
    "Date",
    "Buyer Name",
    "Buyer Email",
    "Product Name",
    "Category",
    "Quantity",
    "Unit Price",
    "Total Amount",
    "Status",
    "Payment Method",
];

/// Cell text for a reference whose row was deleted.
const MISSING: &str = "N/A";

/// Download name for an export taken on `date`.
#[must_use]
pub fn file_name(date: NaiveDate) -> String {
    format!("transactions-{}.csv", date.format("%Y-%m-%d"))
}

/// Double-quote a cell, doubling any quotes inside it.
fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

fn push_row<I, S>(out: &mut String, cells: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let row: Vec<String> = cells.into_iter().map(|c| quote(c.as_ref())).collect();
    out.push_str(&row.join(","));
}

/// Render transactions (already in export order) with buyer and product
/// details joined in.
#[must_use]
pub fn render(
    transactions: &[Transaction],
    buyers: &HashMap<BuyerId, Buyer>,
    products: &HashMap<ProductId, Product>,
) -> String {
    let symbol = CurrencyCode::PHP.symbol();
    let mut out = String::new();
    push_row(&mut out, HEADER);

    for t in transactions {
        let buyer = t.buyer_id.and_then(|id| buyers.get(&id));
        let product = t.product_id.and_then(|id| products.get(&id));

        out.push('\n');
        push_row(
            &mut out,
            [
                t.id.to_string(),
                t.transaction_date.format("%Y-%m-%d").to_string(),
                buyer.map_or(MISSING, |b| b.name.as_str()).to_owned(),
                buyer.map_or(MISSING, |b| b.email.as_str()).to_owned(),
                product.map_or(MISSING, |p| p.name.as_str()).to_owned(),
                product.map_or(MISSING, |p| p.category.as_str()).to_owned(),
                t.quantity.to_string(),
                money(symbol, t.unit_price),
                money(symbol, t.total_amount),
                t.status.to_string(),
                t.payment_method.to_string(),
            ],
        );
    }
    out
}

fn money(symbol: &str, amount: rust_decimal::Decimal) -> String {
    format!("{symbol}{amount:.2}")
}

/// Every transaction, newest first, as CSV.
///
/// # Errors
///
/// Returns the data client's error if any of the three tables cannot be read.
pub async fn transactions_csv(client: &dyn DataClient) -> Result<String, RepositoryError> {
    let transactions = Table::<Transaction>::new(client)
        .select(&Query::new().order_by("created_at", Direction::Descending))
        .await?;
    let buyers = Table::<Buyer>::new(client)
        .select_lenient(&Query::new())
        .await?
        .into_iter()
        .map(|b| (b.id, b))
        .collect();
    let products = Table::<Product>::new(client)
        .select_lenient(&Query::new())
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    tracing::info!(rows = transactions.len(), "Exporting transactions");
    Ok(render(&transactions, &buyers, &products))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use minimart_core::{BuyerStatus, PaymentMethod, TransactionId, TransactionStatus};

    use super::*;

    fn sale(buyer_id: Option<BuyerId>, product_id: Option<ProductId>) -> Transaction {
        let date = Utc.with_ymd_and_hms(2026, 3, 14, 10, 30, 0).unwrap();
        Transaction {
            id: TransactionId::generate(),
            buyer_id,
            product_id,
            quantity: 2,
            unit_price: Decimal::new(25, 0),
            total_amount: Decimal::new(50, 0),
            status: TransactionStatus::Completed,
            payment_method: PaymentMethod::Gcash,
            notes: None,
            transaction_date: date,
            created_at: date,
            updated_at: None,
        }
    }

    #[test]
    fn test_quote_doubles_inner_quotes() {
        assert_eq!(quote("plain"), "\"plain\"");
        assert_eq!(quote("the \"best\" chips"), "\"the \"\"best\"\" chips\"");
        assert_eq!(quote(""), "\"\"");
    }

    #[test]
    fn test_file_name() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
        assert_eq!(file_name(date), "transactions-2026-03-04.csv");
    }

    #[test]
    fn test_render_joins_and_marks_missing() {
        let buyer = Buyer {
            id: BuyerId::generate(),
            name: "Ana \"Anne\" Reyes".to_owned(),
            email: "ana@example.ph".to_owned(),
            phone: None,
            address: None,
            status: BuyerStatus::Active,
            notes: None,
            created_at: Utc::now(),
            updated_at: None,
        };
        let with_buyer = sale(Some(buyer.id), Some(ProductId::generate()));
        let buyers = HashMap::from([(buyer.id, buyer)]);

        let csv = render(&[with_buyer.clone()], &buyers, &HashMap::new());
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines.first().unwrap().starts_with("\"Transaction ID\",\"Date\""));
        let expected = format!(
            "\"{}\",\"2026-03-14\",\"Ana \"\"Anne\"\" Reyes\",\"ana@example.ph\",\"N/A\",\"N/A\",\"2\",\"₱25.00\",\"₱50.00\",\"completed\",\"gcash\"",
            with_buyer.id
        );
        assert_eq!(*lines.get(1).unwrap(), expected);
    }

    #[test]
    fn test_render_empty_is_header_only() {
        let csv = render(&[], &HashMap::new(), &HashMap::new());
        assert_eq!(csv.lines().count(), 1);
        assert_eq!(csv.matches(',').count(), HEADER.len() - 1);
    }
}
