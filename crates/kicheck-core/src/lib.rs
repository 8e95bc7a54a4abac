pub mod form;
pub mod scoring;
pub mod settings;
pub mod submission;

pub use form::{Category, FormVariant, PromptField};
pub use scoring::{ScoreResult, Tier, ordinal_value, score};
pub use settings::{ConfigError, Settings, TemplateVariant};
pub use submission::{Submission, SubmissionError};
