pub mod chain;
pub mod http;
pub mod runner;

/// Install a test subscriber honouring `RUST_LOG`. Safe to call from every
/// test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
