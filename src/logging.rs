use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "AGENTDESK_LOG";

/// Picks the filter from `AGENTDESK_LOG`, then `RUST_LOG`, then `default_level`.
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

pub fn init(default_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_default_level_falls_back_to_info() {
        if std::env::var_os(LOG_ENV).is_some() || std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert_eq!(env_filter("agentdesk=loud").to_string(), "info");
        assert_eq!(env_filter("debug").to_string(), "debug");
    }

    #[test]
    fn init_twice_is_harmless() {
        init("warn");
        init("warn");
    }
}
