use coupon_ledger::{
    config::{database, settings},
    core::{
        coupon::{self, DEFAULT_GENERATED_AMOUNT},
        report::{self, Translations},
    },
    errors::{Error, Result},
};
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: coupon-ledger [status | generate [amount]]";

/// What the binary was asked to do
enum Command {
    Status,
    Generate(usize),
}

fn parse_command(mut args: impl Iterator<Item = String>) -> Result<Command> {
    match args.next().as_deref() {
        None | Some("status") => Ok(Command::Status),
        Some("generate") => {
            let amount = match args.next() {
                Some(raw) => raw.parse().map_err(|e| Error::Config {
                    message: format!("Invalid amount '{raw}': {e}\n{USAGE}"),
                })?,
                None => DEFAULT_GENERATED_AMOUNT,
            };
            Ok(Command::Generate(amount))
        }
        Some(other) => Err(Error::Config {
            message: format!("Unknown command '{other}'\n{USAGE}"),
        }),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can be set externally
    dotenv().ok();

    let command = parse_command(std::env::args().skip(1))?;

    // Code generation needs neither configuration nor database
    if let Command::Generate(amount) = command {
        for code in coupon::generate_random_coupons(amount)? {
            println!("{code}");
        }
        return Ok(());
    }

    // 3. Load the application configuration
    let app_config = settings::load_app_configuration()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    let offset = app_config.offset()?;
    let translations = Translations::new(app_config.translations.clone());

    // 4. Initialize database
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    // 5. Seed configured coupons
    let seeded = coupon::seed_coupons(&db, &app_config.coupons)
        .await
        .inspect_err(|e| error!("Failed to seed coupons: {}", e))?;
    info!(seeded, "Coupon seeding complete.");

    // 6. Report
    let now = chrono::Utc::now();
    for entry in coupon::get_all_coupons(&db).await? {
        println!(
            "{}",
            report::format_coupon_summary(&entry, now, &translations, offset)
        );
    }

    Ok(())
}
