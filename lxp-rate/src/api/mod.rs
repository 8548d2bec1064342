//! HTTP API handlers for lxp-rate

pub mod admin;
pub mod health;
pub mod profile;
pub mod sessions;
pub mod stimuli;

pub use admin::admin_routes;
pub use health::health_routes;
pub use profile::profile_routes;
pub use sessions::session_routes;
pub use stimuli::stimuli_routes;
