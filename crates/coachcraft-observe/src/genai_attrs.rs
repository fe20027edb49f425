//! GenAI response attribute names recorded after a reply completes.
//!
//! Request-side fields are written literally in the span macros; these are
//! the ones filled in later through `Span::record`, so the span must declare
//! them as `tracing::field::Empty`.

/// The model that actually produced the reply.
pub const GEN_AI_RESPONSE_MODEL: &str = "gen_ai.response.model";

/// The finish reason reported for the reply (e.g., "stop", "length").
pub const GEN_AI_RESPONSE_FINISH_REASONS: &str = "gen_ai.response.finish_reasons";

/// The number of input tokens consumed.
pub const GEN_AI_USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";

/// The number of output tokens generated.
pub const GEN_AI_USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";

/// Standard chat completion operation.
pub const OP_CHAT: &str = "chat";
