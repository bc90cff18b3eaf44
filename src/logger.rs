//! Logger setup for the command-line tool.

/// Initializes `env_logger`: debug output with `verbose`, warnings otherwise.
/// `RUST_LOG` takes precedence when set.
pub fn init_logger(verbose: bool) {
    env_logger::Builder::new()
        .filter_level(if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .format_timestamp(None)
        .parse_default_env()
        .init();
}
