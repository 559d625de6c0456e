use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber. Respects `RUST_LOG` when set,
/// otherwise defaults to info with debug for the service's own crates.
/// Production (`SHELFCURE_ENV=production`) switches to JSON lines for the
/// log shipper.
pub fn init_tracing(service_name: &str) {
    let crate_target = service_name.replace('-', "_");
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("info,{crate_target}=debug,shelfcure_shared=debug"))
    });

    let registry = tracing_subscriber::registry().with(env_filter);

    let is_production = std::env::var("SHELFCURE_ENV")
        .map(|v| v == "production")
        .unwrap_or(false);

    if is_production {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(true)
                    .with_line_number(true),
            )
            .init();
    }

    tracing::info!(service = service_name, "tracing initialized");
}
