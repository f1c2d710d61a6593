//! Repository trait definitions for persistence.
//!
//! These traits define the contract that infrastructure implementations
//! (e.g., SQLite) must fulfill. They use native async fn in traits (RPITIT).

pub mod message;
pub mod session;
pub mod user;
