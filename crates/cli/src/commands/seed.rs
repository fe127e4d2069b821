//! Seed the product catalog from a YAML file.
//!
//! The storefront never mutates the catalog; this command is how
//! products get into the database. The YAML file is a list of products:
//!
//! ```yaml
//! - title: Marigold Seeds
//!   description: A packet of heirloom marigold seeds.
//!   price: "4.50"
//!   image_url: /images/seeds.jpg
//! ```

use std::path::Path;

use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Deserialize;
use tracing::{error, info};

use marigold_core::CurrencyCode;
use marigold_storefront::db::{self, ProductRepository};

/// One product entry in the seed file.
#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub image_url: String,
}

/// Validate a parsed seed file, returning every problem found.
fn validate(products: &[SeedProduct]) -> Vec<String> {
    let mut errors = Vec::new();

    if products.is_empty() {
        errors.push("seed file contains no products".to_string());
    }

    for (i, product) in products.iter().enumerate() {
        if product.title.trim().is_empty() {
            errors.push(format!("product {i}: title is empty"));
        }
        if product.price < Decimal::ZERO {
            errors.push(format!("product {i} ({}): negative price", product.title));
        }
    }

    errors
}

/// Seed products from a YAML file.
///
/// # Arguments
///
/// * `file_path` - Path to the YAML catalog file
/// * `clear_existing` - If true, delete all existing products first
///
/// # Errors
///
/// Returns an error if environment variables are missing, the file
/// cannot be read or parsed, or database operations fail.
pub async fn products(
    file_path: &str,
    clear_existing: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let database_url = std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "STOREFRONT_DATABASE_URL not set")?;

    // Verify file exists
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let entries: Vec<SeedProduct> = serde_yaml::from_str(&content)?;

    info!(products = entries.len(), "Parsed catalog file");

    let errors = validate(&entries);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    // Connect to database
    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    // The repository applies the storefront currency on reads; seeding
    // only writes raw amounts, so the currency choice here is inert
    let repo = ProductRepository::new(&pool, CurrencyCode::default());

    if clear_existing {
        let removed = repo.delete_all().await?;
        info!(removed, "Cleared existing products");
    }

    let mut inserted = 0_usize;
    for entry in &entries {
        let product = repo
            .insert(
                &entry.title,
                &entry.description,
                entry.price,
                &entry.image_url,
            )
            .await?;
        inserted += 1;
        info!(id = %product.id, title = %product.title, "Seeded product");
    }

    info!(inserted, "Catalog seeding complete");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seed_yaml() {
        let yaml = r#"
- title: Marigold Seeds
  description: A packet of heirloom marigold seeds.
  price: "4.50"
  image_url: /images/seeds.jpg
- title: Watering Can
  description: Two litres, galvanized.
  price: "19.99"
  image_url: /images/can.jpg
"#;

        let entries: Vec<SeedProduct> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Marigold Seeds");
        assert_eq!(entries[1].price, Decimal::new(1999, 2));
    }

    #[test]
    fn test_validate_rejects_empty_file() {
        let errors = validate(&[]);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_validate_rejects_bad_entries() {
        let entries = vec![
            SeedProduct {
                title: "  ".to_string(),
                description: "desc".to_string(),
                price: Decimal::new(100, 2),
                image_url: "/x.jpg".to_string(),
            },
            SeedProduct {
                title: "Negative".to_string(),
                description: "desc".to_string(),
                price: Decimal::new(-100, 2),
                image_url: "/y.jpg".to_string(),
            },
        ];

        let errors = validate(&entries);
        assert_eq!(errors.len(), 2);
    }
}
