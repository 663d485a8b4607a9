//! Permission resolver, rule engine, rate limiter, audit sink, and event bus —
//! the permission service facade every REST handler, the messaging gateway,
//! and the voice hub call through instead of re-deriving access decisions.

pub mod audit;
pub mod bus;
pub mod hierarchy;
pub mod rate_limiter;
pub mod resolver;
pub mod rules;

pub use audit::AuditSink;
pub use bus::EventBus;
pub use rate_limiter::RateLimiter;
