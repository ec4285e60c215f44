use clap::Parser;
use genesys_ops::app::jobs::run_blacklist;
use genesys_ops::utils::{logger, validation::Validate};
use genesys_ops::{BlacklistArgs, LocalStorage, SyncError};

fn report_failure(context: &str, e: &SyncError) -> i32 {
    tracing::error!(
        "❌ {}: {} (Category: {:?}, Severity: {:?})",
        context,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    e.exit_code()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = BlacklistArgs::parse();

    logger::init_cli_logger(args.verbose);
    tracing::info!("Starting update-blacklist");

    let settings = match args.resolve().and_then(|settings| {
        settings.validate()?;
        Ok(settings)
    }) {
        Ok(settings) => settings,
        Err(e) => std::process::exit(report_failure("Configuration validation failed", &e)),
    };

    if settings.dry_run {
        tracing::info!("🔍 DRY RUN MODE - no rows or watermark will be written");
    }

    // Relative watermark paths resolve against the working directory.
    let storage = LocalStorage::new(".".to_string());

    match run_blacklist(&settings, storage).await {
        Ok(report) => {
            println!(
                "✅ Added {} new emails ({} already present, {} failed)",
                report.inserted, report.already_present, report.failed
            );
            println!("🕒 Watermark: {}", report.watermark_after);
            if report.failed > 0 {
                std::process::exit(1);
            }
        }
        Err(e) => std::process::exit(report_failure("Blacklist update failed", &e)),
    }

    Ok(())
}
