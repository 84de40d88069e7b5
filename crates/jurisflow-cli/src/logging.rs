use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn";
const VERBOSE_FILTER: &str = "debug";

/// `--verbose` wins over `RUST_LOG`; otherwise `RUST_LOG`, else warnings only.
/// Logs go to stderr so rendered output on stdout stays clean.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
