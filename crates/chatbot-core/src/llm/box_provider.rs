//! BoxChatProvider -- object-safe dynamic dispatch wrapper for ChatProvider.
//!
//! 1. Define an object-safe `ChatProviderDyn` trait with boxed futures
//! 2. Blanket-impl `ChatProviderDyn` for all `T: ChatProvider`
//! 3. `BoxChatProvider` wraps `Box<dyn ChatProviderDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use chatbot_types::llm::{ChatRequest, ChatResponse, LlmError};

use super::provider::ChatProvider;

/// Object-safe version of [`ChatProvider`] with boxed futures.
pub trait ChatProviderDyn: Send + Sync {
    fn name(&self) -> &str;

    fn send_boxed<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ChatResponse, LlmError>> + Send + 'a>>;
}

impl<T: ChatProvider> ChatProviderDyn for T {
    fn name(&self) -> &str {
        ChatProvider::name(self)
    }

    fn send_boxed<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ChatResponse, LlmError>> + Send + 'a>> {
        Box::pin(self.send(request))
    }
}

/// Type-erased chat provider.
///
/// Since `ChatProvider` uses RPITIT, it cannot be used as a trait object
/// directly. `BoxChatProvider` lets the service layer hold whichever backend
/// was configured at startup (or a scripted one in tests) without a generic
/// parameter.
pub struct BoxChatProvider {
    inner: Box<dyn ChatProviderDyn + Send + Sync>,
}

impl BoxChatProvider {
    /// Wrap a concrete `ChatProvider` in a type-erased box.
    pub fn new<T: ChatProvider + 'static>(provider: T) -> Self {
        Self {
            inner: Box::new(provider),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Send the conversation and receive the reply.
    pub async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        self.inner.send_boxed(request).await
    }
}
