/// Initializes structured logging for hosts embedding the tree runtime.
///
/// Filtering is controlled through the `RUST_LOG` environment variable:
/// - `RUST_LOG=info` - lifecycle milestones
/// - `RUST_LOG=unit_tree=debug` - every attach, detach, activation and build
///
/// # Example
///
/// ```ignore
/// setup_tracing();
/// tracing::info!("host started");
/// ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
