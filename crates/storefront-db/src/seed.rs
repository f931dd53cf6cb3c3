//! Demo catalog seed used by the CLI for local development.

use rust_decimal::Decimal;
use sqlx::PgPool;
use storefront_core::products::{derive_is_sale, ProductDraft};

use crate::{products::create_product, DbError};

/// Insert a small demo catalog. Returns the number of products created.
///
/// Not idempotent: running twice seeds twice. Meant for fresh local
/// databases only.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails.
pub async fn seed_demo_catalog(pool: &PgPool) -> Result<usize, DbError> {
    let drafts = demo_drafts();
    for draft in &drafts {
        let is_sale = derive_is_sale(draft.discount_percentage, None, draft.price);
        create_product(pool, draft, is_sale).await?;
    }
    Ok(drafts.len())
}

fn demo_drafts() -> Vec<ProductDraft> {
    let mut trail_shoe = ProductDraft::bare("Ridgeline Trail Shoe", Decimal::new(12_900, 2));
    trail_shoe.description = "Grippy trail runner with a rock plate.".to_string();
    trail_shoe.category = "shoes".to_string();
    trail_shoe.brand = "Ridgeline".to_string();
    trail_shoe.stock = 40;
    trail_shoe.sizes = vec!["41".into(), "42".into(), "43".into(), "44".into()];
    trail_shoe.colors = vec!["black".into(), "orange".into()];
    trail_shoe.tags = vec!["trail".into(), "running".into()];
    trail_shoe.is_new = true;

    let mut rain_jacket = ProductDraft::bare("Cloudbreak Rain Jacket", Decimal::new(18_950, 2));
    rain_jacket.description = "Three-layer shell, taped seams.".to_string();
    rain_jacket.category = "jackets".to_string();
    rain_jacket.brand = "Cloudbreak".to_string();
    rain_jacket.discount_percentage = 15;
    rain_jacket.stock = 25;
    rain_jacket.sizes = vec!["S".into(), "M".into(), "L".into(), "XL".into()];
    rain_jacket.colors = vec!["navy".into(), "moss".into()];
    rain_jacket.is_featured = true;

    let mut camp_mug = ProductDraft::bare("Enamel Camp Mug", Decimal::new(1_450, 2));
    camp_mug.description = "12oz enamel mug, fire-safe.".to_string();
    camp_mug.category = "kitchen".to_string();
    camp_mug.brand = "Hearthside".to_string();
    camp_mug.stock = 200;
    camp_mug.colors = vec!["cream".into(), "forest".into()];
    camp_mug.is_best_seller = true;

    let mut wool_beanie = ProductDraft::bare("Merino Wool Beanie", Decimal::new(3_200, 2));
    wool_beanie.description = "Midweight merino, one size.".to_string();
    wool_beanie.category = "accessories".to_string();
    wool_beanie.brand = "Ridgeline".to_string();
    wool_beanie.stock = 0;
    wool_beanie.availability_status = "Out of Stock".to_string();
    wool_beanie.colors = vec!["charcoal".into()];

    vec![trail_shoe, rain_jacket, camp_mug, wool_beanie]
}
