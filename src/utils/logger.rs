use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact single-line text for terminals.
    Compact,
    /// One JSON object per line.
    Json,
}

/// Filter used when `RUST_LOG` is not set.
///
/// WebDriver traffic goes through reqwest/hyper, which are kept at `warn`
/// so a verbose run shows the lookup steps rather than connection pooling.
pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "rego_check=debug,tower_http=debug,hyper=warn,reqwest=warn,info"
    } else {
        "rego_check=info,tower_http=info,warn"
    }
}

pub fn init_logger(format: LogFormat, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    let layer = tracing_subscriber::fmt::layer()
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match format {
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(layer.with_target(false).compact())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(layer.with_target(true).json().flatten_event(true))
            .init(),
    }
}
