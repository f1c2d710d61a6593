pub mod conversation;
pub mod service;
