//! Loads the TACO nutrition table from a semicolon-delimited file into
//! `taco_foods`. Re-running upserts by name, so the file is the source of
//! truth.

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

struct TacoRow {
    name: String,
    kcal: f64,
    protein: f64,
    fat: f64,
    carb: f64,
}

/// `name;kcal;protein;fat;carb`, one food per line, header on the first line.
fn parse_line(line: &str) -> Option<TacoRow> {
    let mut fields = line.split(';').map(str::trim);
    let name = fields.next()?.to_string();
    if name.is_empty() {
        return None;
    }
    let mut number = || fields.next()?.replace(',', ".").parse::<f64>().ok();
    Some(TacoRow {
        name,
        kcal: number()?,
        protein: number()?,
        fat: number()?,
        carb: number()?,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "seed_taco=info,sqlx=warn".to_string());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let path = std::env::var("TACO_CSV_PATH").unwrap_or_else(|_| "data/taco.csv".to_string());
    let contents =
        std::fs::read_to_string(&path).with_context(|| format!("read taco file {path:?}"))?;

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    let db = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("connect to database")?;

    let mut seeded = 0usize;
    let mut skipped = 0usize;
    for (line_no, line) in contents.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let Some(row) = parse_line(line) else {
            warn!(line = line_no + 1, "unparseable row skipped");
            skipped += 1;
            continue;
        };
        sqlx::query(
            r#"
            INSERT INTO taco_foods (name, kcal_per_100g, protein_g_per_100g, fat_g_per_100g, carb_g_per_100g)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (name) DO UPDATE SET
                kcal_per_100g = EXCLUDED.kcal_per_100g,
                protein_g_per_100g = EXCLUDED.protein_g_per_100g,
                fat_g_per_100g = EXCLUDED.fat_g_per_100g,
                carb_g_per_100g = EXCLUDED.carb_g_per_100g
            "#,
        )
        .bind(&row.name)
        .bind(row.kcal)
        .bind(row.protein)
        .bind(row.fat)
        .bind(row.carb)
        .execute(&db)
        .await?;
        seeded += 1;
    }

    info!(seeded, skipped, "taco table seeded");
    Ok(())
}
