//! Offline unit tests for storefront-db pool configuration and row types.
//! These tests do not require a live database connection.

use rust_decimal::Decimal;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use storefront_core::app_config::{AppConfig, Environment};
use storefront_db::{PoolConfig, ProductFilters};

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        jwt_secret: "secret".to_string(),
        token_ttl_days: 7,
        stripe_secret_key: None,
        stripe_publishable_key: None,
        stripe_api_base: "https://api.stripe.com".to_string(),
        env_file_path: PathBuf::from("./.env"),
        flat_shipping: Decimal::new(1_000, 2),
        free_shipping_over: Decimal::new(10_000, 2),
        tax_rate: Decimal::ZERO,
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn product_filters_default_is_unconstrained() {
    let filters = ProductFilters::default();
    assert!(filters.category.is_none());
    assert!(filters.brand.is_none());
    assert!(filters.min_price.is_none());
    assert!(filters.max_price.is_none());
    assert!(filters.colors.is_none());
    assert!(filters.sizes.is_none());
    assert!(filters.is_new.is_none());
    assert!(filters.is_sale.is_none());
    assert!(filters.is_featured.is_none());
    assert!(filters.is_best_seller.is_none());
    assert!(!filters.in_stock);
    assert!(filters.search.is_none());
}
