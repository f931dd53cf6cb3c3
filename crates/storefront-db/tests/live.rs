//! Live integration tests for storefront-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/storefront-db/`), so `"../../migrations"` resolves to the
//! workspace migration directory.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use storefront_core::products::ProductDraft;
use storefront_db::{
    count_products, create_contact, create_deal, create_order, create_product, delete_product,
    get_contact, get_deal, list_contacts, list_deals, list_products, update_contact, NewContact,
    NewDeal, NewOrder, ProductFilters, SortOrder,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn draft(title: &str, category: &str, price_cents: i64) -> ProductDraft {
    let mut draft = ProductDraft::bare(title, Decimal::new(price_cents, 2));
    draft.category = category.to_string();
    draft.brand = "Test Brand".to_string();
    draft.stock = 5;
    draft
}

async fn insert_product(pool: &sqlx::PgPool, title: &str, category: &str, price_cents: i64) -> i64 {
    create_product(pool, &draft(title, category, price_cents), false)
        .await
        .unwrap_or_else(|e| panic!("insert_product failed for '{title}': {e}"))
        .id
}

fn order_fixture(user_id: i64) -> NewOrder {
    NewOrder {
        user_id,
        items: json!([{ "product_id": 1, "name": "Mug", "price": "14.50", "quantity": 1 }]),
        shipping_address: None,
        payment_method: None,
        payment_result: None,
        items_price: Decimal::new(1_450, 2),
        shipping_price: Decimal::new(1_000, 2),
        tax_price: Decimal::ZERO,
        total_amount: Decimal::new(2_450, 2),
    }
}

async fn insert_user(pool: &sqlx::PgPool, email: &str) -> i64 {
    storefront_db::create_user(pool, "Buyer", email, "not-a-real-hash", false)
        .await
        .expect("insert user")
        .id
}

// ---------------------------------------------------------------------------
// Catalog query builder
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn filters_compose_without_constraining_absent_ones(pool: sqlx::PgPool) {
    insert_product(&pool, "Cheap Shoe", "shoes", 4_000).await;
    insert_product(&pool, "Mid Shoe", "shoes", 8_000).await;
    insert_product(&pool, "Posh Shoe", "shoes", 20_000).await;
    insert_product(&pool, "Mid Mug", "kitchen", 8_000).await;

    let unfiltered = count_products(&pool, &ProductFilters::default())
        .await
        .expect("count");
    assert_eq!(unfiltered, 4);

    let filters = ProductFilters {
        category: Some("shoes".to_string()),
        min_price: Some(Decimal::new(5_000, 2)),
        max_price: Some(Decimal::new(15_000, 2)),
        ..ProductFilters::default()
    };
    let page = list_products(&pool, &filters, None, SortOrder::Desc, 10, 0)
        .await
        .expect("list");
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].title, "Mid Shoe");
}

#[sqlx::test(migrations = "../../migrations")]
async fn membership_filters_use_overlap_semantics(pool: sqlx::PgPool) {
    let mut red = draft("Red Shirt", "shirts", 2_000);
    red.colors = vec!["red".to_string(), "white".to_string()];
    create_product(&pool, &red, false).await.expect("red");

    let mut blue = draft("Blue Shirt", "shirts", 2_000);
    blue.colors = vec!["blue".to_string()];
    create_product(&pool, &blue, false).await.expect("blue");

    let filters = ProductFilters {
        colors: Some(vec!["red".to_string(), "green".to_string()]),
        ..ProductFilters::default()
    };
    let page = list_products(&pool, &filters, None, SortOrder::Desc, 10, 0)
        .await
        .expect("list");
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].title, "Red Shirt");
}

#[sqlx::test(migrations = "../../migrations")]
async fn offset_pagination_beyond_data_is_empty_not_an_error(pool: sqlx::PgPool) {
    for i in 0..3 {
        insert_product(&pool, &format!("Shoe {i}"), "shoes", 5_000).await;
    }
    let page = list_products(&pool, &ProductFilters::default(), None, SortOrder::Desc, 10, 30)
        .await
        .expect("list");
    assert!(page.items.is_empty());
    assert_eq!(page.total, 3);
}

#[sqlx::test(migrations = "../../migrations")]
async fn sort_whitelist_orders_by_price_ascending(pool: sqlx::PgPool) {
    insert_product(&pool, "Expensive", "shoes", 20_000).await;
    insert_product(&pool, "Cheap", "shoes", 1_000).await;
    insert_product(&pool, "Middle", "shoes", 10_000).await;

    let page = list_products(
        &pool,
        &ProductFilters::default(),
        Some("price"),
        SortOrder::Asc,
        10,
        0,
    )
    .await
    .expect("list");
    let titles: Vec<&str> = page.items.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Cheap", "Middle", "Expensive"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn search_matches_tags_case_insensitively(pool: sqlx::PgPool) {
    let mut tagged = draft("Plain Name", "misc", 5_000);
    tagged.tags = vec!["Waterproof".to_string()];
    create_product(&pool, &tagged, false).await.expect("tagged");
    insert_product(&pool, "Other", "misc", 5_000).await;

    let filters = ProductFilters {
        search: Some("waterproof".to_string()),
        ..ProductFilters::default()
    };
    let page = list_products(&pool, &filters, None, SortOrder::Desc, 10, 0)
        .await
        .expect("list");
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].title, "Plain Name");
}

// ---------------------------------------------------------------------------
// Deals
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn deal_join_null_checks_a_deleted_product(pool: sqlx::PgPool) {
    let product_id = insert_product(&pool, "Doomed", "shoes", 10_000).await;
    let deal = create_deal(
        &pool,
        &NewDeal {
            product_id,
            discount_percentage: 20,
            start_date: Utc::now() - Duration::days(1),
            end_date: Utc::now() + Duration::days(1),
            featured: false,
            is_active: true,
        },
    )
    .await
    .expect("create deal");
    assert_eq!(deal.product_title.as_deref(), Some("Doomed"));

    assert!(delete_product(&pool, product_id).await.expect("delete"));

    let row = get_deal(&pool, deal.id).await.expect("get").expect("deal row");
    assert!(row.product_title.is_none());
    assert!(row.product_price.is_none());
    assert_eq!(row.product_id, product_id);

    let listed = list_deals(&pool, None).await.expect("list");
    assert_eq!(listed.len(), 1);
}

// ---------------------------------------------------------------------------
// Orders: per-day counter
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn order_numbers_increment_from_the_day_counter(pool: sqlx::PgPool) {
    let user_id = insert_user(&pool, "buyer@example.com").await;

    let first = create_order(&pool, &order_fixture(user_id)).await.expect("first");
    let second = create_order(&pool, &order_fixture(user_id)).await.expect("second");
    let third = create_order(&pool, &order_fixture(user_id)).await.expect("third");

    assert!(first.order_number.ends_with("-0001"), "{}", first.order_number);
    assert!(second.order_number.ends_with("-0002"), "{}", second.order_number);
    assert!(third.order_number.ends_with("-0003"), "{}", third.order_number);
    assert_eq!(&first.order_number[..4], "ORD-");
    // All three share the same day stamp.
    assert_eq!(first.order_number[4..10], second.order_number[4..10]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn concurrent_order_creation_never_reuses_a_number(pool: sqlx::PgPool) {
    let user_id = insert_user(&pool, "buyer@example.com").await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let pool = pool.clone();
        let order = order_fixture(user_id);
        handles.push(tokio::spawn(async move {
            create_order(&pool, &order).await.expect("create order")
        }));
    }

    let mut numbers = Vec::new();
    for handle in handles {
        numbers.push(handle.await.expect("join").order_number);
    }
    numbers.sort();
    numbers.dedup();
    assert_eq!(numbers.len(), 8, "order numbers collided: {numbers:?}");
}

// ---------------------------------------------------------------------------
// Contacts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn contact_lifecycle_updates_only_triage_fields(pool: sqlx::PgPool) {
    let created = create_contact(
        &pool,
        &NewContact {
            name: "Grace".to_string(),
            email: "grace@example.com".to_string(),
            subject: "Hello".to_string(),
            message: "A question".to_string(),
        },
    )
    .await
    .expect("create");
    assert_eq!(created.status, "new");
    assert!(created.notes.is_none());

    let updated = update_contact(&pool, created.id, Some("replied"), Some("called back"))
        .await
        .expect("update")
        .expect("row");
    assert_eq!(updated.status, "replied");
    assert_eq!(updated.notes.as_deref(), Some("called back"));
    assert_eq!(updated.subject, "Hello");
    assert_eq!(updated.message, "A question");

    let fetched = get_contact(&pool, created.id).await.expect("get").expect("row");
    assert_eq!(fetched.status, "replied");

    let (rows, total) = list_contacts(&pool, Some("replied"), None, 10, 0)
        .await
        .expect("list");
    assert_eq!(total, 1);
    assert_eq!(rows[0].id, created.id);

    let (_, none_match) = list_contacts(&pool, Some("archived"), None, 10, 0)
        .await
        .expect("list");
    assert_eq!(none_match, 0);
}
