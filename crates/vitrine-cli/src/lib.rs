pub mod api_client;
pub mod compress;

use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Load `.env` (or `env_file`), then initialize tracing so that a `RUST_LOG`
/// set in the file applies.
pub fn init_environment(env_file: Option<&Path>) {
    match env_file {
        Some(path) => {
            dotenvy::from_path(path).ok();
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }
    init_tracing();
}

/// Initialize tracing for the CLI.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_log_from_env_file_reaches_filter() {
        let dir = tempfile::tempdir().unwrap();
        let env_file = dir.path().join(".env");
        std::fs::write(&env_file, "RUST_LOG=vitrine_cli=trace\n").unwrap();
        std::env::remove_var("RUST_LOG");

        init_environment(Some(&env_file));

        assert_eq!(std::env::var("RUST_LOG").unwrap(), "vitrine_cli=trace");
        assert!(env_filter().to_string().contains("vitrine_cli=trace"));
    }
}
