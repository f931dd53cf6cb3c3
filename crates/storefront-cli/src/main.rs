use std::path::PathBuf;

use clap::{Parser, Subcommand};
use storefront_core::import::map_external_product;
use storefront_core::products::derive_is_sale;

#[derive(Debug, Parser)]
#[command(name = "storefront-cli")]
#[command(about = "Storefront operations command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create an admin account.
    CreateAdmin {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "STOREFRONT_ADMIN_PASSWORD")]
        password: String,
    },
    /// Bulk-import products from a JSON file (an array, or `{"products": [...]}`).
    Import { file: PathBuf },
    /// Seed a small demo catalog into a fresh database.
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let pool = storefront_db::connect_pool_from_env().await?;
    storefront_db::run_migrations(&pool).await?;

    match cli.command {
        Commands::CreateAdmin {
            name,
            email,
            password,
        } => create_admin(&pool, &name, &email, &password).await?,
        Commands::Import { file } => import_file(&pool, &file).await?,
        Commands::Seed => {
            let count = storefront_db::seed::seed_demo_catalog(&pool).await?;
            println!("seeded {count} demo products");
        }
    }

    Ok(())
}

async fn create_admin(
    pool: &sqlx::PgPool,
    name: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<()> {
    if password.len() < 8 {
        anyhow::bail!("password must be at least 8 characters");
    }
    let hash = storefront_core::auth::hash_password(password)?;
    let user = storefront_db::create_user(pool, name, email, &hash, true).await?;
    println!("created admin {} (id {})", user.email, user.id);
    Ok(())
}

async fn import_file(pool: &sqlx::PgPool, file: &PathBuf) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let rows = match parsed {
        serde_json::Value::Array(rows) => rows,
        serde_json::Value::Object(mut map) => match map.remove("products") {
            Some(serde_json::Value::Array(rows)) => rows,
            _ => anyhow::bail!("expected a JSON array or an object with a 'products' array"),
        },
        _ => anyhow::bail!("expected a JSON array or an object with a 'products' array"),
    };

    let total = rows.len();
    let mut success = 0usize;
    let mut errors = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        match map_external_product(row) {
            Ok(draft) => {
                let is_sale = derive_is_sale(draft.discount_percentage, None, draft.price);
                match storefront_db::create_product(pool, &draft, is_sale).await {
                    Ok(_) => success += 1,
                    Err(e) => errors.push(format!("row {}: {e}", index + 1)),
                }
            }
            Err(e) => errors.push(format!("row {}: {e}", index + 1)),
        }
    }

    println!("imported {success}/{total} products ({} failed)", total - success);
    for error in errors {
        eprintln!("  {error}");
    }
    Ok(())
}
