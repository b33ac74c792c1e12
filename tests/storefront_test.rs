mod common;

use axum::http::{Method, StatusCode};
use rust_decimal_macros::dec;
use serde_json::json;
use storefront_api::services::payments::expected_signature;
use uuid::Uuid;

use common::{decimal, id_of, TestApp, PAYMENT_KEY_SECRET};

#[tokio::test]
async fn register_then_login_issues_customer_tokens() {
    let app = TestApp::new().await;

    let (status, registered) = app
        .call(
            Method::POST,
            "/api/store/auth/register",
            Some(json!({
                "name": "Kavya Nair",
                "email": "kavya@example.com",
                "password": "marigold-2024",
                "state": "KL"
            })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{registered}");
    assert!(registered["data"]["access_token"].is_string());
    assert_eq!(registered["data"]["token_type"], "Bearer");
    assert!(registered["data"].get("token").is_none());
    assert_eq!(registered["data"]["principal"]["roles"], json!(["customer"]));

    let (status, _) = app
        .call(
            Method::POST,
            "/api/store/auth/register",
            Some(json!({
                "name": "Kavya Again",
                "email": "kavya@example.com",
                "password": "marigold-2024"
            })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .call(
            Method::POST,
            "/api/store/auth/login",
            Some(json!({ "email": "kavya@example.com", "password": "wrong-password" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, session) = app
        .call(
            Method::POST,
            "/api/store/auth/login",
            Some(json!({ "email": "kavya@example.com", "password": "marigold-2024" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = session["data"]["access_token"]
        .as_str()
        .expect("token")
        .to_string();

    let (status, cart) = app.call(Method::GET, "/api/store/cart", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["data"]["item_count"], 0);
}

#[tokio::test]
async fn cart_checkout_and_payment_round_trip() {
    let app = TestApp::new().await;
    let customer = app.seed_customer(None).await;
    let token = app.customer_token(customer.id);
    let candle = app.seed_product("Candle", dec!(15), 10).await;
    let tray = app.seed_product("Tray", dec!(20), 10).await;

    let (status, _) = app
        .call(Method::POST, "/api/store/checkout", Some(json!({})), Some(&token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "empty cart");

    app.call(
        Method::POST,
        "/api/store/cart",
        Some(json!({ "product_id": candle.id, "quantity": 2 })),
        Some(&token),
    )
    .await;
    app.call(
        Method::POST,
        "/api/store/cart",
        Some(json!({ "product_id": candle.id })),
        Some(&token),
    )
    .await;
    let (status, cart) = app
        .call(
            Method::POST,
            "/api/store/cart",
            Some(json!({ "product_id": tray.id, "quantity": 1 })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["data"]["item_count"], 4);
    assert_eq!(decimal(&cart["data"]["subtotal"]), dec!(65));

    let (status, cart) = app
        .call(
            Method::PATCH,
            &format!("/api/store/cart/{}", tray.id),
            Some(json!({ "quantity": 0 })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["data"]["lines"].as_array().map(Vec::len), Some(1));

    let (status, order) = app
        .call(
            Method::POST,
            "/api/store/checkout",
            Some(json!({ "notes": "Leave at the door" })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    assert_eq!(decimal(&order["data"]["net_total"]), dec!(45));
    let order_id = id_of(&order["data"]);

    let (_, cart) = app.call(Method::GET, "/api/store/cart", None, Some(&token)).await;
    assert_eq!(cart["data"]["item_count"], 0);

    let (status, payment) = app
        .call(
            Method::POST,
            "/api/store/payments/order",
            Some(json!({ "order_id": order_id })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{payment}");
    assert_eq!(payment["data"]["amount"], 4500);
    assert_eq!(payment["data"]["key_id"], "rzp_test_key");
    let gateway_order_id = payment["data"]["gateway_order_id"]
        .as_str()
        .expect("gateway order id")
        .to_string();

    let signature =
        expected_signature(PAYMENT_KEY_SECRET, &gateway_order_id, "pay_001").expect("signature");
    let (status, verified) = app
        .call(
            Method::POST,
            "/api/store/payments/verify",
            Some(json!({
                "gateway_order_id": gateway_order_id,
                "gateway_payment_id": "pay_001",
                "signature": signature
            })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{verified}");
    assert_eq!(verified["data"]["payment_status"], "paid");

    let (_, mine) = app
        .call(
            Method::GET,
            &format!("/api/store/orders/{order_id}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(mine["data"]["payment_status"], "paid");
    assert_eq!(mine["data"]["status"], "confirmed");
    assert_eq!(mine["data"]["invoice"]["status"], "paid");
}

#[tokio::test]
async fn tampered_signature_is_rejected() {
    let app = TestApp::new().await;
    let customer = app.seed_customer(None).await;
    let token = app.customer_token(customer.id);
    let bowl = app.seed_product("Bowl", dec!(9), 3).await;

    app.call(
        Method::POST,
        "/api/store/cart",
        Some(json!({ "product_id": bowl.id })),
        Some(&token),
    )
    .await;
    let (_, order) = app
        .call(Method::POST, "/api/store/checkout", Some(json!({})), Some(&token))
        .await;
    let order_id = id_of(&order["data"]);

    let (_, payment) = app
        .call(
            Method::POST,
            "/api/store/payments/order",
            Some(json!({ "order_id": order_id })),
            Some(&token),
        )
        .await;

    let (status, _) = app
        .call(
            Method::POST,
            "/api/store/payments/verify",
            Some(json!({
                "gateway_order_id": payment["data"]["gateway_order_id"],
                "gateway_payment_id": "pay_002",
                "signature": "00ff"
            })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, mine) = app
        .call(
            Method::GET,
            &format!("/api/store/orders/{order_id}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(mine["data"]["payment_status"], "failed");
}

#[tokio::test]
async fn likes_are_idempotent() {
    let app = TestApp::new().await;
    let customer = app.seed_customer(None).await;
    let token = app.customer_token(customer.id);
    let shawl = app.seed_product("Shawl", dec!(70), 2).await;
    let uri = format!("/api/store/likes/{}", shawl.id);

    let (status, _) = app.call(Method::POST, &uri, None, Some(&token)).await;
    assert_eq!(status, StatusCode::CREATED);
    app.call(Method::POST, &uri, None, Some(&token)).await;

    let (_, likes) = app.call(Method::GET, "/api/store/likes", None, Some(&token)).await;
    assert_eq!(likes["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(likes["data"][0]["name"], "Shawl");

    let (status, _) = app.call(Method::DELETE, &uri, None, Some(&token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.call(Method::DELETE, &uri, None, Some(&token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .call(
            Method::POST,
            &format!("/api/store/likes/{}", Uuid::new_v4()),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn storefront_routes_require_a_customer_token() {
    let app = TestApp::new().await;

    let (status, body) = app.call(Method::GET, "/api/store/cart", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_MISSING");

    let staff = app.staff_token(&["orders:read"]);
    let (status, _) = app.call(Method::GET, "/api/store/cart", None, Some(&staff)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn approved_reviews_show_on_the_product_page() {
    let app = TestApp::new().await;
    let admin = app.admin_token();
    let customer = app.seed_customer(None).await;
    let token = app.customer_token(customer.id);
    let chair = app.seed_product("Cane Chair", dec!(120), 2).await;
    let uri = format!("/api/store/products/{}/reviews", chair.id);

    let (status, _) = app
        .call(Method::POST, &uri, Some(json!({ "rating": 6 })), Some(&token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, review) = app
        .call(
            Method::POST,
            &uri,
            Some(json!({ "rating": 5, "title": "Sturdy", "comment": "Comfortable too" })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{review}");
    let review_id = id_of(&review["data"]);

    let (_, public) = app.call(Method::GET, &uri, None, None).await;
    assert_eq!(public["data"]["total"], 0);

    let (status, _) = app
        .call(
            Method::PATCH,
            &format!("/api/vendor/reviews/{review_id}"),
            Some(json!({ "is_approved": true })),
            Some(&admin),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, public) = app.call(Method::GET, &uri, None, None).await;
    assert_eq!(public["data"]["total"], 1);
    assert_eq!(public["data"]["items"][0]["title"], "Sturdy");
}
