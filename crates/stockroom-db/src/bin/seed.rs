//! # Seed Data Generator
//!
//! Populates the database with sample stores, products, sales and an admin
//! user for development.
//!
//! ## Usage
//! ```bash
//! # Seed two stores with 14 days of sales (default)
//! cargo run -p stockroom-db --bin seed
//!
//! # More history
//! cargo run -p stockroom-db --bin seed -- --days 60
//!
//! # Specify database path
//! cargo run -p stockroom-db --bin seed -- --db ./data/stockroom.db
//! ```
//!
//! ## Generated Data
//! - Stores: `Main`, `Harbel`
//! - Every product in [`CATALOG`] in every store
//! - One opening restock per store, then 1-4 sales a day
//! - User `admin` / `admin123` (role admin) in `Main`

use chrono::{Duration, Utc};
use std::env;
use stockroom_core::posting::{LineRequest, PostRequest};
use stockroom_core::{Category, Currency, Money, NewProduct, Role, TransactionType};
use stockroom_db::{Database, DbConfig, NewUser};

const STORES: &[&str] = &["Main", "Harbel"];

/// (item, measurement, category, price LRD, price USD) in minor units
const CATALOG: &[(&str, &str, Category, i64, i64)] = &[
    ("Rice 25kg", "bag", Category::A, 450_000, 2_400),
    ("Palm Oil 1L", "bottle", Category::A, 60_000, 325),
    ("Sugar 1kg", "pack", Category::B, 25_000, 135),
    ("Flour 2kg", "pack", Category::B, 40_000, 215),
    ("Tomato Paste", "tin", Category::C, 7_500, 40),
    ("Sardines", "tin", Category::C, 12_500, 65),
    ("Bar Soap", "bar", Category::C, 5_000, 25),
    ("Bottled Water", "bottle", Category::C, 3_500, 20),
];

const DEFAULT_DAYS: i64 = 14;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut days = DEFAULT_DAYS;
    let mut db_path = String::from("./stockroom_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--days" | "-n" => {
                if i + 1 < args.len() {
                    days = args[i + 1].parse().unwrap_or(DEFAULT_DAYS);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockroom Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --days <N>     Days of sales history (default: {DEFAULT_DAYS})");
                println!("  -d, --db <PATH>    Database file path (default: ./stockroom_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Stockroom Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!("Days:     {}", days);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let now = Utc::now();
    let mut posted = 0usize;

    for (store_idx, store) in STORES.iter().enumerate() {
        let mut product_ids = Vec::with_capacity(CATALOG.len());

        for (item, measurement, category, lrd, usd) in CATALOG {
            let product = db
                .products()
                .insert(NewProduct {
                    store: store.to_string(),
                    item: item.to_string(),
                    measurement: Some(measurement.to_string()),
                    product_type: None,
                    category: Some(*category),
                    price_lrd: Money::from_cents(*lrd),
                    price_usd: Money::from_cents(*usd),
                    pieces: 0,
                    cts: None,
                    image: None,
                })
                .await?;
            product_ids.push(product.id);
        }

        // Opening stock arrives the day before the sales history starts.
        db.transactions()
            .post(PostRequest {
                store: store.to_string(),
                kind: TransactionType::Restock,
                currency: Currency::Usd,
                date: Some(now - Duration::days(days + 1)),
                lines: product_ids
                    .iter()
                    .map(|id| LineRequest {
                        product_id: id.clone(),
                        quantity: 500,
                    })
                    .collect(),
            })
            .await?;
        posted += 1;

        for day in 0..days {
            let seed = (store_idx as i64 * 31 + day * 7) as usize;
            let sales_today = 1 + seed % 4;

            for sale in 0..sales_today {
                let first = (seed + sale) % product_ids.len();
                let second = (seed + sale * 3 + 1) % product_ids.len();
                let mut lines = vec![LineRequest {
                    product_id: product_ids[first].clone(),
                    quantity: 1 + ((seed + sale) % 3) as i64,
                }];
                if second != first {
                    lines.push(LineRequest {
                        product_id: product_ids[second].clone(),
                        quantity: 1,
                    });
                }

                let request = PostRequest {
                    store: store.to_string(),
                    kind: TransactionType::Sale,
                    currency: if sale % 2 == 0 { Currency::Lrd } else { Currency::Usd },
                    date: Some(now - Duration::days(days - day) + Duration::hours(sale as i64)),
                    lines,
                };

                if let Err(e) = db.transactions().post(request).await {
                    eprintln!("Failed to post sale in {}: {}", store, e);
                    continue;
                }
                posted += 1;
            }
        }

        println!("  Seeded store {}", store);
    }

    db.users()
        .register(NewUser {
            username: "admin".to_string(),
            password: "admin123".to_string(),
            role: Some(Role::Admin),
            store: STORES[0].to_string(),
        })
        .await?;

    let elapsed = start.elapsed();
    println!();
    println!(
        "✓ Seeded {} products and {} transactions in {:?}",
        db.products().count().await?,
        posted,
        elapsed
    );
    println!("✓ Admin login: admin / admin123");
    println!();
    println!("✓ Seed complete!");

    Ok(())
}
