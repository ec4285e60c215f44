use clap::Parser;
use genesys_ops::app::jobs::run_useralias;
use genesys_ops::config::toml_config::{require, resolved, GenesysSection, RetrySection};
use genesys_ops::config::{retry_policy, validate_genesys};
use genesys_ops::utils::logger;
use genesys_ops::AliasArgs;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = AliasArgs::parse();

    logger::init_cli_logger(args.verbose);

    let resolved_config =
        require("GENESYS_DIVISION_ID", resolved(&args.division_id)).and_then(|division_id| {
            let retry = retry_policy(&RetrySection::default(), args.max_retries);
            let settings = args.genesys.resolve(&GenesysSection::default(), None, retry)?;
            validate_genesys(&settings)?;
            Ok((division_id, settings))
        });

    let (division_id, settings) = match resolved_config {
        Ok(resolved_config) => resolved_config,
        Err(e) => {
            tracing::error!("❌ {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    };

    match run_useralias(&settings, &division_id, args.dry_run).await {
        Ok(report) => {
            println!(
                "✅ Updated {} users. Skipped: {}. Errors: {}",
                report.updated, report.skipped, report.errors
            );
            if report.errors > 0 {
                std::process::exit(1);
            }
        }
        Err(e) => {
            tracing::error!("❌ An unexpected error occurred: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }

    Ok(())
}
