use clap::Parser;
use scheduler::db::{get_db_pool, migrations::{run_migrations, MIGRATOR}, DatabaseConfig};
use scheduler::utils;

#[derive(Debug, Parser)]
#[command(name = "migrate", about = "Apply the bundled database migrations")]
struct Args {
    /// Print the bundled migrations without connecting to the database
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::init_logging();
    let args = Args::parse();

    if args.list {
        for migration in MIGRATOR.iter() {
            println!("{} {}", migration.version, migration.description);
        }
        return Ok(());
    }

    let db_config = DatabaseConfig::from_env()?;
    let pool = get_db_pool(&db_config).await?;

    println!("Running database migrations...");
    run_migrations(&pool).await?;
    println!("Migrations completed successfully!");

    Ok(())
}
