//! # breakglass
//!
//! Out-of-band recovery channel for axum web applications. When the host
//! application is too broken to reach its own admin interface, a single
//! secret-gated endpoint lets an operator disable or re-enable installed
//! extensions (plugins/themes) by renaming their directories, with every
//! mutation recorded in an append-only log.
//!
//! The layer is installed as middleware in front of the host router:
//!
//! ```ignore
//! let ctx = Arc::new(RescueContext::from_config(&config));
//! let app = host_router
//!     .layer(axum::middleware::from_fn_with_state(ctx, rescue_gate));
//! ```
//!
//! Requests without the correct secret pass through untouched. The layer
//! keeps no in-memory state and depends on nothing but the local filesystem,
//! so it keeps working when the host's own subsystems do not.

pub mod config;
pub mod error;
pub mod extensions;
pub mod rescue;
pub mod store;

pub use config::RescueConfig;
pub use error::{RescueError, RescueResult};
pub use rescue::{rescue_gate, RescueContext};
