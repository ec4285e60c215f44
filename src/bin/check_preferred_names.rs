use clap::Parser;
use genesys_ops::app::jobs::run_check;
use genesys_ops::config::toml_config::{GenesysSection, RetrySection};
use genesys_ops::config::{retry_policy, validate_genesys};
use genesys_ops::core::report::{log_mismatches, write_report};
use genesys_ops::utils::logger;
use genesys_ops::CheckArgs;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CheckArgs::parse();

    logger::init_cli_logger(args.verbose);

    let retry = retry_policy(&RetrySection::default(), args.max_retries);
    let settings = match args
        .genesys
        .resolve(&GenesysSection::default(), None, retry)
        .and_then(|settings| {
            validate_genesys(&settings)?;
            Ok(settings)
        }) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    };

    let check = match run_check(&settings, args.specific_division.as_deref()).await {
        Ok(check) => check,
        Err(e) => {
            tracing::error!("❌ An unexpected error occurred: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    };

    match &args.output_file {
        Some(path) => write_report(path, args.format, &check.mismatches)?,
        None => log_mismatches(&check.mismatches),
    }

    Ok(())
}
