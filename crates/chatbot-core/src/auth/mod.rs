//! Account and login-session management.
//!
//! - [`hasher`]: password hashing and session-token ports
//! - [`validation`]: signup form rules
//! - [`service::AuthService`]: signup, login, session resolution, logout

pub mod hasher;
pub mod service;
pub mod validation;
