use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::{env, error::Error, path::PathBuf};

/// Builds a scratch database from `migrations/` so the `sqlx::query!` macros
/// can check statements at compile time without a developer database.
fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed=migrations");
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let db_path = PathBuf::from(env::var("OUT_DIR")?).join("schema.db");
    if db_path.exists() {
        std::fs::remove_file(&db_path)?;
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let migrator = sqlx::migrate::Migrator::new(manifest_dir.join("migrations")).await?;
        migrator.run(&pool).await?;
        pool.close().await;

        Ok::<(), Box<dyn Error>>(())
    })?;

    println!("cargo:rustc-env=DATABASE_URL=sqlite://{}", db_path.display());

    Ok(())
}
