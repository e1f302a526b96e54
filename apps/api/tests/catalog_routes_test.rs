//! Integration tests for the REST catalog endpoints
//!
//! Runs the full router against a seeded in-memory catalog.

mod common;

use axum::http::StatusCode;
use rstest::rstest;
use serde_json::Value;

use common::{get_json, seeded_app};
use storefront_api::query::Predicate;
use storefront_api::store::{EntityKind, StoreCall};

fn slugs(body: &Value) -> Vec<&str> {
    body["data"]
        .as_array()
        .expect("data array")
        .iter()
        .map(|item| item["slug"].as_str().expect("slug"))
        .collect()
}

// ==================== Product listing ====================

#[tokio::test]
async fn test_products_default_to_published_newest_first() {
    let (app, _) = seeded_app();

    let (status, body) = get_json(&app, "/api/products").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(slugs(&body), vec!["silk-scarf", "wool-coat", "linen-shirt"]);
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 20);
    assert_eq!(body["total"], 3);
}

#[rstest]
#[case("/api/products?featured=true", &["silk-scarf", "linen-shirt"])]
#[case("/api/products?category=shirts", &["linen-shirt"])]
#[case("/api/products?collection=summer", &["silk-scarf", "linen-shirt"])]
#[case("/api/products?search=LINEN", &["linen-shirt"])]
#[case("/api/products?status=published", &["silk-scarf", "wool-coat", "linen-shirt"])]
#[case("/api/products?sort=price-asc", &["silk-scarf", "linen-shirt", "wool-coat"])]
#[case("/api/products?sort=name-desc", &["wool-coat", "silk-scarf", "linen-shirt"])]
#[case("/api/products?sort=oldest", &["linen-shirt", "wool-coat", "silk-scarf"])]
#[case("/api/products?sort=bestselling", &["silk-scarf", "wool-coat", "linen-shirt"])]
#[case("/api/products?search=%20%20&featured=", &["silk-scarf", "wool-coat", "linen-shirt"])]
#[tokio::test]
async fn test_product_list_filters(#[case] uri: &str, #[case] expected: &[&str]) {
    let (app, _) = seeded_app();

    let (status, body) = get_json(&app, uri).await;

    assert_eq!(status, StatusCode::OK, "{}: {}", uri, body);
    assert_eq!(slugs(&body), expected);
}

#[tokio::test]
async fn test_product_list_pagination() {
    let (app, _) = seeded_app();

    let (status, body) = get_json(&app, "/api/products?limit=2&page=2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(slugs(&body), vec!["linen-shirt"]);
    assert_eq!(body["page"], 2);
    assert_eq!(body["limit"], 2);
    assert_eq!(body["total"], 3);
}

#[tokio::test]
async fn test_product_list_clamps_limit() {
    let (app, _) = seeded_app();

    let (_, body) = get_json(&app, "/api/products?limit=500").await;

    assert_eq!(body["limit"], 100);
}

#[tokio::test]
async fn test_prices_are_decimal() {
    let (app, _) = seeded_app();

    let (_, body) = get_json(&app, "/api/products?search=linen").await;

    assert_eq!(body["data"][0]["price"], 45.0);
    assert_eq!(body["data"][0]["compareAtPrice"], 60.0);
}

#[rstest]
#[case("/api/products?limit=0")]
#[case("/api/products?page=-1")]
#[case("/api/products?page=abc")]
#[case("/api/products?featured=maybe")]
#[case("/api/products?status=deleted")]
#[case("/api/products?status=draft")]
#[case("/api/products?status=archived&search=jacket")]
#[case("/api/categories?parent=top")]
#[case("/api/collections?parent=root")]
#[tokio::test]
async fn test_invalid_query_params_are_rejected(#[case] uri: &str) {
    let (app, store) = seeded_app();

    let (status, body) = get_json(&app, uri).await;

    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
    assert_eq!(body["code"], "INVALID_QUERY_PARAM");
    assert!(store.calls().is_empty(), "validation must run before the store");
}

#[tokio::test]
async fn test_unsupported_sort_field_is_a_bad_request() {
    let (app, _) = seeded_app();

    // Categories have no price
    let (status, body) = get_json(&app, "/api/categories?sort=price-asc").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_QUERY_PARAM");
}

// ==================== Product detail ====================

#[tokio::test]
async fn test_product_detail() {
    let (app, _) = seeded_app();

    let (status, body) = get_json(&app, "/api/products/linen-shirt").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Linen Shirt");
    assert_eq!(body["price"], 45.0);

    let variants = body["variants"].as_array().unwrap();
    let skus: Vec<_> = variants.iter().map(|v| v["sku"].as_str().unwrap()).collect();
    assert_eq!(skus, vec!["SKU-102", "SKU-101"]);
    assert_eq!(variants[0]["size"], "M");
    assert_eq!(variants[0]["color"], "White");
    assert_eq!(variants[1]["size"], "S");

    // Hidden categories and pending reviews stay out
    assert_eq!(body["categories"].as_array().unwrap().len(), 1);
    assert_eq!(body["categories"][0]["slug"], "shirts");
    assert_eq!(body["collections"][0]["slug"], "summer");
    let review_ids: Vec<_> = body["reviews"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect();
    assert_eq!(review_ids, vec![1002, 1001]);
}

#[tokio::test]
async fn test_product_detail_batches_relations() {
    let (app, store) = seeded_app();

    get_json(&app, "/api/products/linen-shirt").await;

    for kind in [
        EntityKind::Product,
        EntityKind::Variant,
        EntityKind::VariantSelection,
        EntityKind::ProductCategory,
        EntityKind::ProductCollection,
        EntityKind::Review,
    ] {
        assert_eq!(store.calls_for(kind).len(), 1, "{} fetched more than once", kind);
    }

    let selection_calls = store.calls_for(EntityKind::VariantSelection);
    let [StoreCall::FindMany { query, .. }] = selection_calls.as_slice() else {
        panic!("expected one selection fetch, got {:?}", selection_calls);
    };
    let [Predicate::VariantIdIn(variant_ids)] = query.filter.predicates() else {
        panic!("expected a single variant predicate, got {:?}", query.filter);
    };
    let mut variant_ids = variant_ids.clone();
    variant_ids.sort_unstable();
    assert_eq!(variant_ids, vec![101, 102]);
}

#[rstest]
#[case("/api/products/draft-jacket")]
#[case("/api/products/no-such-product")]
#[case("/api/categories/clearance")]
#[case("/api/collections/archive")]
#[case("/api/collections/nothing")]
#[tokio::test]
async fn test_detail_not_found(#[case] uri: &str) {
    let (app, _) = seeded_app();

    let (status, body) = get_json(&app, uri).await;

    assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
    assert_eq!(body["code"], "NOT_FOUND");
}

// ==================== Taxonomy ====================

#[rstest]
#[case("/api/categories", &["clearance", "shirts", "tops"])]
#[case("/api/categories?visible=true", &["shirts", "tops"])]
#[case("/api/categories?parent=root", &["clearance", "tops"])]
#[case("/api/categories?parent=10", &["shirts"])]
#[case("/api/categories?sort=name-asc", &["clearance", "shirts", "tops"])]
#[case("/api/collections", &["archive", "summer"])]
#[case("/api/collections?visible=false", &["archive"])]
#[tokio::test]
async fn test_taxonomy_listings(#[case] uri: &str, #[case] expected: &[&str]) {
    let (app, _) = seeded_app();

    let (status, body) = get_json(&app, uri).await;

    assert_eq!(status, StatusCode::OK, "{}: {}", uri, body);
    assert_eq!(slugs(&body), expected);
}

#[tokio::test]
async fn test_category_detail() {
    let (app, _) = seeded_app();

    let (status, body) = get_json(&app, "/api/categories/tops").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Tops");
    assert_eq!(body["children"][0]["slug"], "shirts");
    assert_eq!(body["products"][0]["slug"], "wool-coat");
    assert_eq!(body["products"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_collection_detail() {
    let (app, _) = seeded_app();

    let (status, body) = get_json(&app, "/api/collections/summer").await;

    assert_eq!(status, StatusCode::OK);
    let products: Vec<_> = body["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["slug"].as_str().unwrap())
        .collect();
    assert_eq!(products, vec!["silk-scarf", "linen-shirt"]);
}

// ==================== Themes ====================

#[tokio::test]
async fn test_active_theme() {
    let (app, _) = seeded_app();

    let (status, body) = get_json(&app, "/api/themes/active").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Midnight");
    assert_eq!(body["settings"]["primaryColor"], "#111111");
}

#[tokio::test]
async fn test_no_active_theme() {
    let (app, store) = seeded_app();
    store.mutate(|data| data.themes.iter_mut().for_each(|t| t.is_active = false));

    let (status, body) = get_json(&app, "/api/themes/active").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

// ==================== Failures ====================

#[tokio::test]
async fn test_store_failure_is_sanitized() {
    let (app, store) = seeded_app();
    store.fail_with("could not connect to 10.0.0.5:5432");

    for uri in ["/api/products", "/api/products/linen-shirt", "/api/themes/active"] {
        let (status, body) = get_json(&app, uri).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{}", uri);
        assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
        assert_eq!(body["message"], "service temporarily unavailable");
        assert!(!body.to_string().contains("10.0.0.5"));
    }
}
