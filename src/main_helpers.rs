use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

const CRATE_TARGETS: &str = "execgate_core,execgate_config,execgate";

/// Install the stderr subscriber.
///
/// `RUST_LOG` takes precedence. Otherwise `--debug` enables debug events for
/// the execgate crates and everything else stays at `warn`.
pub(crate) fn initialize_tracing(debug: bool) {
    let env_filter = if std::env::var_os("RUST_LOG").is_some() {
        EnvFilter::from_default_env()
    } else if debug {
        let directives = CRATE_TARGETS
            .split(',')
            .map(|target| format!("{target}=debug"))
            .collect::<Vec<_>>()
            .join(",");
        EnvFilter::new(format!("warn,{directives}"))
    } else {
        EnvFilter::new("warn")
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    let init_result = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();

    if let Err(err) = init_result {
        tracing::warn!(error = %err, "tracing already initialized; skipping setup");
    }
}
