//! Scenario test support for mrepo.
//!
//! Provides a shared satellite systems model and a tracing setup so the
//! scenario tests in `tests/` can run both evaluators over the same data.

pub mod fixtures;

use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// Install a test subscriber once. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("mrepo_ocl=debug,mrepo_gql=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_ansi(false)
            .try_init();
    });
}

/// Prelude for scenario tests.
pub mod prelude {
    pub use crate::fixtures::{satellite, Satellite};
    pub use crate::init_tracing;
    pub use mrepo_core::{AccessPort, BindingTable, Collection, CollectionKind, ObjectRef, Value};
    pub use mrepo_model::Model;
}
