//! Persistent entities of §3. Each uses a UUIDv7 snowflake id for global
//! uniqueness and time-sortability.

pub mod audit;
pub mod channel;
pub mod channel_override;
pub mod member;
pub mod member_role;
pub mod role;
pub mod server;
pub mod voice_membership;

pub use audit::*;
pub use channel::*;
pub use channel_override::*;
pub use member::*;
pub use member_role::*;
pub use role::*;
pub use server::*;
pub use voice_membership::*;
