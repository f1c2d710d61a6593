//! OpenTelemetry GenAI Semantic Convention attribute constants.
//!
//! Field names recorded on the `gen_ai.chat` span around every provider call.
//! Usable with `Span::record` and as `{ CONST }` field names in span macros.

/// The name of the operation being performed.
pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";

/// The GenAI provider (e.g., "gemini").
pub const GEN_AI_SYSTEM: &str = "gen_ai.system";

/// The model ID requested (e.g., "gemini-2.5-flash").
pub const GEN_AI_REQUEST_MODEL: &str = "gen_ai.request.model";

pub const GEN_AI_REQUEST_TEMPERATURE: &str = "gen_ai.request.temperature";

pub const GEN_AI_REQUEST_MAX_TOKENS: &str = "gen_ai.request.max_tokens";

/// The number of input tokens consumed.
pub const GEN_AI_USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";

/// The number of output tokens generated.
pub const GEN_AI_USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";

/// The finish reason reported by the provider (e.g., "STOP").
pub const GEN_AI_RESPONSE_FINISH_REASONS: &str = "gen_ai.response.finish_reasons";

/// Model version that actually served the request.
pub const GEN_AI_RESPONSE_MODEL: &str = "gen_ai.response.model";

// --- Operation name values ---

/// Standard chat completion operation.
pub const OP_CHAT: &str = "chat";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_names_are_namespaced() {
        for name in [
            GEN_AI_OPERATION_NAME,
            GEN_AI_SYSTEM,
            GEN_AI_REQUEST_MODEL,
            GEN_AI_REQUEST_TEMPERATURE,
            GEN_AI_REQUEST_MAX_TOKENS,
            GEN_AI_USAGE_INPUT_TOKENS,
            GEN_AI_USAGE_OUTPUT_TOKENS,
            GEN_AI_RESPONSE_FINISH_REASONS,
            GEN_AI_RESPONSE_MODEL,
        ] {
            assert!(name.starts_with("gen_ai."), "{name}");
        }
    }
}
