//! Logger setup for the DLL.
//!
//! There is no `main` to install a logger, so the first `HookKeyboard` call
//! does it. If the host (or a Rust caller) already installed a `log` backend,
//! that one is kept.

use std::sync::Once;

use env_logger::Env;

static INIT: Once = Once::new();

/// Installs `env_logger` once per process. `RUST_LOG` overrides `default_filter`.
pub fn init(default_filter: &str) {
    INIT.call_once(|| {
        let result = env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
            .format_timestamp_millis()
            .try_init();
        if result.is_err() {
            log::debug!("logging: backend already installed, keeping it");
        }
    });
}
