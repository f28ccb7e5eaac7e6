//! Storefront flows: catalog, cart, wishlist, and sign-in.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::{Value, json};

use minimart_integration_tests::{Store, decimal, product_id};

async fn catalog(store: &Store) -> Value {
    let mut storefront = store.storefront();
    let response = storefront.get("/api/products").await;
    assert_eq!(response.status, StatusCode::OK);
    response.json()["products"].clone()
}

#[tokio::test]
async fn test_health_endpoints() {
    let store = Store::new().await;
    let mut storefront = store.storefront();

    let live = storefront.get("/health").await;
    assert_eq!(live.status, StatusCode::OK);
    assert_eq!(live.text(), "ok");

    assert_eq!(storefront.get("/health/ready").await.status, StatusCode::OK);

    store.client.set_offline(true);
    assert_eq!(
        storefront.get("/health/ready").await.status,
        StatusCode::SERVICE_UNAVAILABLE
    );
    assert_eq!(storefront.get("/health").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_every_response_carries_a_request_id() {
    let store = Store::new().await;
    let mut storefront = store.storefront();

    let response = storefront.get("/health").await;
    assert!(response.header("x-request-id".parse().unwrap()).is_some());
}

#[tokio::test]
async fn test_catalog_listing_search_and_featured() {
    let store = Store::new().await;
    store.seeded_admin().await;
    let mut storefront = store.storefront();

    let all = storefront.get("/api/products").await.json();
    assert_eq!(all["total"], 4);

    let chips = storefront.get("/api/products?q=chips").await.json();
    assert_eq!(chips["total"], 2);

    let sweet = storefront.get("/api/products?q=SWEET").await.json();
    assert_eq!(sweet["total"], 3);

    let none = storefront.get("/api/products?q=adobo").await.json();
    assert_eq!(none["total"], 0);
    assert_eq!(none["products"], json!([]));

    let featured = storefront.get("/api/products/featured").await.json();
    assert_eq!(featured["total"], 3);
    let names: Vec<&str> = featured["products"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["name"].as_str())
        .collect();
    assert!(!names.contains(&"Polvoron"));
}

#[tokio::test]
async fn test_product_detail_and_missing_product() {
    let store = Store::new().await;
    store.seeded_admin().await;
    let products = catalog(&store).await;
    let polvoron = product_id(&products, "Polvoron");
    let mut storefront = store.storefront();

    let response = storefront.get(&format!("/api/products/{polvoron}")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(decimal(&response.json()["price"]), Decimal::new(3500, 2));

    let missing = storefront
        .get("/api/products/00000000-0000-4000-8000-000000000000")
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_anonymous_cart_is_rejected_but_badge_reads_zero() {
    let store = Store::new().await;
    store.seeded_admin().await;
    let chicharon = product_id(&catalog(&store).await, "Chicharon");
    let mut storefront = store.storefront();

    assert_eq!(
        storefront.get("/api/cart").await.status,
        StatusCode::UNAUTHORIZED
    );
    let add = storefront
        .post("/api/cart/add", json!({ "product_id": chicharon }))
        .await;
    assert_eq!(add.status, StatusCode::UNAUTHORIZED);

    let count = storefront.get("/api/cart/count").await;
    assert_eq!(count.status, StatusCode::OK);
    assert_eq!(count.json()["count"], 0);
}

#[tokio::test]
async fn test_cart_add_merges_and_totals_include_delivery() {
    let store = Store::new().await;
    store.seeded_admin().await;
    let products = catalog(&store).await;
    let chicharon = product_id(&products, "Chicharon");
    let mangoes = product_id(&products, "Dried Mangoes");
    let mut buyer = store.registered_buyer("juan@example.ph").await;

    let empty = buyer.get("/api/cart").await.json();
    assert_eq!(empty["items"], json!([]));
    assert_eq!(decimal(&empty["summary"]["delivery_fee"]["amount"]), Decimal::ZERO);
    assert_eq!(decimal(&empty["summary"]["total"]["amount"]), Decimal::ZERO);

    buyer
        .post("/api/cart/add", json!({ "product_id": chicharon }))
        .await;
    buyer
        .post("/api/cart/add", json!({ "product_id": chicharon }))
        .await;
    let cart = buyer
        .post("/api/cart/add", json!({ "product_id": mangoes }))
        .await
        .json();

    assert_eq!(cart["items"].as_array().unwrap().len(), 2);
    assert_eq!(cart["summary"]["item_count"], 3);
    // 2 x 25.00 + 45.00
    assert_eq!(
        decimal(&cart["summary"]["subtotal"]["amount"]),
        Decimal::new(9500, 2)
    );
    assert_eq!(
        decimal(&cart["summary"]["delivery_fee"]["amount"]),
        Decimal::new(5000, 2)
    );
    assert_eq!(
        decimal(&cart["summary"]["total"]["amount"]),
        Decimal::new(14500, 2)
    );

    assert_eq!(buyer.get("/api/cart/count").await.json()["count"], 3);
}

#[tokio::test]
async fn test_cart_update_and_remove() {
    let store = Store::new().await;
    store.seeded_admin().await;
    let products = catalog(&store).await;
    let banana = product_id(&products, "Banana Chips");
    let polvoron = product_id(&products, "Polvoron");
    let mut buyer = store.registered_buyer("maria@example.ph").await;

    buyer
        .post("/api/cart/add", json!({ "product_id": banana }))
        .await;
    let cart = buyer
        .post("/api/cart/add", json!({ "product_id": polvoron }))
        .await
        .json();
    let entry_of = |cart: &Value, product: &str| -> String {
        cart["items"]
            .as_array()
            .unwrap()
            .iter()
            .find(|line| line["entry"]["product_id"] == product)
            .and_then(|line| line["entry"]["id"].as_str())
            .unwrap()
            .to_owned()
    };
    let banana_entry = entry_of(&cart, &banana);
    let polvoron_entry = entry_of(&cart, &polvoron);

    let updated = buyer
        .post(
            "/api/cart/update",
            json!({ "entry_id": banana_entry, "quantity": 4 }),
        )
        .await
        .json();
    assert_eq!(updated["summary"]["item_count"], 5);

    let zeroed = buyer
        .post(
            "/api/cart/update",
            json!({ "entry_id": banana_entry, "quantity": 0 }),
        )
        .await
        .json();
    assert_eq!(zeroed["items"].as_array().unwrap().len(), 1);
    assert_eq!(zeroed["summary"]["item_count"], 1);

    let removed = buyer
        .post("/api/cart/remove", json!({ "entry_id": polvoron_entry }))
        .await
        .json();
    assert_eq!(removed["items"], json!([]));
    assert_eq!(
        decimal(&removed["summary"]["total"]["amount"]),
        Decimal::ZERO
    );
    assert_eq!(store.client.row_count("cart_items").await, 0);
}

#[tokio::test]
async fn test_cart_quantity_above_limit_is_rejected() {
    let store = Store::new().await;
    store.seeded_admin().await;
    let chicharon = product_id(&catalog(&store).await, "Chicharon");
    let mut buyer = store.registered_buyer("nena@example.ph").await;

    let cart = buyer
        .post("/api/cart/add", json!({ "product_id": chicharon }))
        .await
        .json();
    let entry = cart["items"][0]["entry"]["id"].as_str().unwrap().to_owned();

    let response = buyer
        .post(
            "/api/cart/update",
            json!({ "entry_id": entry, "quantity": i32::MAX }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(buyer.get("/api/cart/count").await.json()["count"], 1);
}

#[tokio::test]
async fn test_adding_unknown_product_is_not_found() {
    let store = Store::new().await;
    let mut buyer = store.registered_buyer("pedro@example.ph").await;

    let response = buyer
        .post(
            "/api/cart/add",
            json!({ "product_id": "00000000-0000-4000-8000-000000000000" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_carts_are_per_buyer() {
    let store = Store::new().await;
    store.seeded_admin().await;
    let chicharon = product_id(&catalog(&store).await, "Chicharon");

    let mut juan = store.registered_buyer("juan@example.ph").await;
    let mut ana = store.registered_buyer("ana@example.ph").await;

    juan.post("/api/cart/add", json!({ "product_id": chicharon }))
        .await;

    assert_eq!(juan.get("/api/cart/count").await.json()["count"], 1);
    assert_eq!(ana.get("/api/cart/count").await.json()["count"], 0);
}

#[tokio::test]
async fn test_cart_survives_sign_out_and_back_in() {
    let store = Store::new().await;
    store.seeded_admin().await;
    let chicharon = product_id(&catalog(&store).await, "Chicharon");
    let mut buyer = store.registered_buyer("lola@example.ph").await;

    buyer
        .post("/api/cart/add", json!({ "product_id": chicharon }))
        .await;

    let logout = buyer.post("/api/auth/logout", Value::Null).await;
    assert_eq!(logout.status, StatusCode::NO_CONTENT);
    assert_eq!(buyer.get("/api/cart").await.status, StatusCode::UNAUTHORIZED);

    let login = buyer
        .post(
            "/api/auth/login",
            json!({ "email": "lola@example.ph", "password": "mabuhay-2024" }),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(buyer.get("/api/cart/count").await.json()["count"], 1);
}

#[tokio::test]
async fn test_sign_in_errors() {
    let store = Store::new().await;
    store.registered_buyer("juan@example.ph").await;
    let mut storefront = store.storefront();

    let wrong = storefront
        .post(
            "/api/auth/login",
            json!({ "email": "juan@example.ph", "password": "not-the-password" }),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let duplicate = storefront
        .post(
            "/api/auth/register",
            json!({ "email": "juan@example.ph", "password": "mabuhay-2024" }),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let weak = storefront
        .post(
            "/api/auth/register",
            json!({ "email": "new@example.ph", "password": "short" }),
        )
        .await;
    assert_eq!(weak.status, StatusCode::BAD_REQUEST);

    assert_eq!(
        storefront.get("/api/auth/me").await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_me_returns_buyer_profile() {
    let store = Store::new().await;
    let mut buyer = store.registered_buyer("juan@example.ph").await;

    let response = buyer.get("/api/auth/me").await;
    assert_eq!(response.status, StatusCode::OK);
    let me = response.json();
    assert_eq!(me["user"]["email"], "juan@example.ph");
    assert_eq!(me["profile"]["role"], "buyer");
}

#[tokio::test]
async fn test_wishlist_toggle_and_badges() {
    let store = Store::new().await;
    store.seeded_admin().await;
    let polvoron = product_id(&catalog(&store).await, "Polvoron");
    let mut visitor = store.storefront();

    let added = visitor
        .post("/api/wishlist/toggle", json!({ "product_id": polvoron }))
        .await;
    assert_eq!(added.status, StatusCode::OK);
    assert_eq!(added.json()["wishlisted"], true);
    assert_eq!(visitor.get("/api/wishlist").await.json(), json!([polvoron]));

    let listing = visitor.get("/api/products").await.json();
    let badged = listing["products"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["id"] == polvoron.as_str())
        .unwrap()
        .clone();
    assert_eq!(badged["in_wishlist"], true);
    assert_eq!(badged["in_cart"], false);

    let removed = visitor
        .post("/api/wishlist/toggle", json!({ "product_id": polvoron }))
        .await
        .json();
    assert_eq!(removed["wishlisted"], false);
    assert_eq!(visitor.get("/api/wishlist").await.json(), json!([]));
}

#[tokio::test]
async fn test_wishlist_rejects_unknown_product() {
    let store = Store::new().await;
    let mut visitor = store.storefront();

    let response = visitor
        .post(
            "/api/wishlist/toggle",
            json!({ "product_id": "00000000-0000-4000-8000-000000000000" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(visitor.get("/api/wishlist").await.json(), json!([]));
}
