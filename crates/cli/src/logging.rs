use anyhow::Result;
use tether_core::tracing::{InstrumentationConfig, LogFormat, init_tracing};
use tracing::Level;

/// Initialize logging for the CLI
///
/// `RUST_LOG` still overrides the level picked on the command line.
pub fn init_logging(level: Level, json: bool) -> Result<()> {
    let format = if json { LogFormat::Json } else { LogFormat::Pretty };
    let config = InstrumentationConfig::from_env()
        .with_log_level(crate_filter(level))
        .with_format(format);

    init_tracing(&config)
}

fn crate_filter(level: Level) -> String {
    let level = level.as_str().to_lowercase();
    format!("tether={level},tether_core={level},tether_http={level},tether_frontend_common={level}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_covers_workspace_crates() {
        let filter = crate_filter(Level::DEBUG);
        assert!(filter.starts_with("tether=debug,"));
        assert!(filter.contains("tether_http=debug"));
        assert!(filter.contains("tether_frontend_common=debug"));
    }
}
