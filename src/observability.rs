//! Observability wiring for the catalog service.
//!
//! # Purpose
//! Initializes the tracing subscriber with an `EnvFilter` (default `info`)
//! and a fmt layer. Initialization is guarded by `OnceLock` so repeated calls
//! from tests stay idempotent.
use std::sync::OnceLock;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static OBS_INIT: OnceLock<()> = OnceLock::new();

pub fn init_observability() {
    OBS_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer();
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_observability_is_idempotent() {
        init_observability();
        init_observability();
    }
}
