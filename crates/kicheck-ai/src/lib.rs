//! LLM layer: chat-completion client, prompt templates, and tagged narrative results.

pub mod completion;
pub mod narrative;
pub mod prompt;

pub use completion::{CompletionClient, CompletionError, CompletionRequest, OpenAiClient};
pub use narrative::{
    Narrative, NarrativeBundle, Recommendation, RiskProfile, generate, generate_bundle, generate_text,
};
pub use prompt::{AnalysisContext, SYSTEM_PROMPT};
