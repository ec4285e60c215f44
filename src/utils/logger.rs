use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output shape of the process-wide subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines for the command line jobs.
    Compact,
    /// One JSON object per event; CloudWatch indexes the fields.
    Json,
}

/// Directive used when `RUST_LOG` is unset.
fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "genesys_ops=debug,info"
    } else {
        "genesys_ops=info"
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

pub fn init(format: LogFormat, verbose: bool) {
    let registry = tracing_subscriber::registry().with(env_filter(verbose));
    let layer = fmt::layer().with_target(false);

    match format {
        LogFormat::Compact => registry.with(layer.compact()).init(),
        // Lambda stamps every log line itself.
        LogFormat::Json => registry.with(layer.without_time().json()).init(),
    }
}

pub fn init_cli_logger(verbose: bool) {
    init(LogFormat::Compact, verbose);
}

pub fn init_lambda_logger() {
    init(LogFormat::Json, false);
}
