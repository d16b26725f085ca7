use anyhow::Result;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

fn filter(verbosity_level: Level) -> Result<EnvFilter> {
    // RUST_LOG= overrides the verbosity flag
    Ok(EnvFilter::builder()
        .with_default_directive(verbosity_level.into())
        .from_env_lossy()
        .add_directive("tokio=error".parse()?)
        .add_directive("redis=warn".parse()?))
}

/// Initialize logging on stderr, keeping stdout for command output.
///
/// # Errors
///
/// Returns an error if the subscriber cannot be installed.
pub fn init(verbosity_level: Option<Level>, json: bool) -> Result<()> {
    let filter = filter(verbosity_level.unwrap_or(Level::ERROR))?;

    if json {
        let fmt_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(false)
            .with_writer(std::io::stderr);

        let subscriber = Registry::default().with(fmt_layer).with(filter);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let fmt_layer = fmt::layer()
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(true)
            .with_target(false)
            .with_writer(std::io::stderr);

        let subscriber = Registry::default().with(fmt_layer).with(filter);
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn test_filter_default_level() -> Result<()> {
        temp_env::with_var("RUST_LOG", None::<&str>, || {
            assert_eq!(filter(Level::ERROR)?.max_level_hint(), Some(LevelFilter::WARN));
            assert_eq!(filter(Level::DEBUG)?.max_level_hint(), Some(LevelFilter::DEBUG));
            Ok(())
        })
    }

    #[test]
    fn test_filter_rust_log_overrides() -> Result<()> {
        temp_env::with_var("RUST_LOG", Some("trace"), || {
            assert_eq!(filter(Level::ERROR)?.max_level_hint(), Some(LevelFilter::TRACE));
            Ok(())
        })
    }
}
