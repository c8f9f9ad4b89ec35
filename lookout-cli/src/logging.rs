use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn verbosity_level(verbosity_level: u8) -> Level {
    match verbosity_level {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Logs go to stderr so stdout only carries the skill result.
///
/// `RUST_LOG` takes precedence over the verbosity flag.
pub fn setup_tracing(verbosity: u8, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity_level(verbosity).to_string()));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(verbosity_level(0), Level::INFO);
        assert_eq!(verbosity_level(1), Level::DEBUG);
        assert_eq!(verbosity_level(5), Level::TRACE);
    }
}
