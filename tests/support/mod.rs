#![allow(dead_code)]

pub mod account;
pub mod recording;

pub use account::Account;
pub use recording::RecordingRepository;

/// Install a `RUST_LOG`-driven subscriber once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
