//! Chat provider abstraction.
//!
//! - [`provider::ChatProvider`]: the "send a conversation, get text back" trait.
//! - [`box_provider::BoxChatProvider`]: type-erased wrapper for runtime selection.

pub mod box_provider;
pub mod provider;
