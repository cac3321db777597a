//! Authentication module for the portal
//!
//! Phone OTP and OAuth (Google, Facebook) sign-in against the backend,
//! provider linking, token refresh and the auth audit trail.

pub mod client;
pub mod models;
mod rate_limit;
pub mod service;
pub mod validation;

pub use client::{AuthApi, HttpAuthClient};
pub use models::{AuthAction, AuthAuditEvent, AuthProvider, AuthResponse, OtpDispatch};
pub use rate_limit::{spawn_throttle_pruner, OtpThrottle, OtpThrottleConfig};
pub use service::AuthService;
