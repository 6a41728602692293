//! `migrate-shot-prompts` command handler.

use panelsmith::{MigrationOptions, PanelsmithResult};

/// Run the shot prompt migration against PostgreSQL and print the counts.
#[cfg(feature = "postgres")]
pub async fn handle_migrate(options: MigrationOptions) -> PanelsmithResult<()> {
    use panelsmith::{PostgresStore, establish_connection, migrate_shot_prompts};

    tracing::info!(
        mode = %options.mode(),
        limit = options.limit,
        project_id = ?options.project_id,
        "Starting shot prompt migration"
    );

    let conn = establish_connection()?;
    let store = PostgresStore::new(conn);
    let stats = migrate_shot_prompts(&store, &options).await?;

    println!("{}", stats);
    Ok(())
}

#[cfg(not(feature = "postgres"))]
pub async fn handle_migrate(_options: MigrationOptions) -> PanelsmithResult<()> {
    eprintln!("Error: PostgreSQL feature not enabled. Rebuild with --features postgres");
    std::process::exit(1);
}
