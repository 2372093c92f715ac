//! Logging setup utilities for the taskboard services.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// The filter covers the given library crate and the binary itself. The log
/// level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `crate_names` - Crates whose events should be enabled (e.g. `["taskboard_server"]`)
/// * `binary_name` - The name of the binary (e.g. "taskboard-server")
/// * `default_log_level` - The default log level (e.g. "debug", "info")
///
/// # Examples
///
/// ```no_run
/// use taskboard_shared::logger::setup_logger;
///
/// setup_logger(&["taskboard_server"], "taskboard-server", "info");
/// ```
pub fn setup_logger(crate_names: &[&str], binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directives(crate_names, binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn default_directives(crate_names: &[&str], binary_name: &str, default_log_level: &str) -> String {
    let mut targets: Vec<String> = Vec::new();
    for name in crate_names.iter().copied().chain([binary_name, "tower_http"]) {
        let target = name.replace('-', "_");
        if !targets.contains(&target) {
            targets.push(target);
        }
    }
    targets
        .iter()
        .map(|target| format!("{}={}", target, default_log_level))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_normalizes_binary_name() {
        // テスト項目: バイナリ名のハイフンがアンダースコアに変換され、重複するターゲットは一度だけ現れる
        // given (前提条件):
        let crates = ["taskboard_server"];

        // when (操作):
        let directives = default_directives(&crates, "taskboard-server", "debug");

        // then (期待する結果):
        assert_eq!(
            directives,
            "taskboard_server=debug,tower_http=debug"
        );
    }
}
