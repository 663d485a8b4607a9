//! API route modules (§6's REST surface).

pub mod channels;
pub mod health;
pub mod roles;
pub mod secure;
pub mod servers;
pub mod voice;
