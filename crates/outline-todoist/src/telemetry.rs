//! Log output for hosts and test binaries
//!
//! `RUST_LOG` wins over the default directive when set.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_DIRECTIVE: &str = "info";

/// Install a global fmt subscriber; does nothing if one is already set
pub fn init_tracing() {
    let _ = try_init_tracing(DEFAULT_DIRECTIVE);
}

/// Install a global fmt subscriber filtered by `RUST_LOG` or `default_directive`
pub fn try_init_tracing(
    default_directive: &str,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_rejected() {
        init_tracing();
        assert!(try_init_tracing("debug").is_err());
    }
}
