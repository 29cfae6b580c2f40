pub mod provider;
pub mod providers;
pub mod study;

pub use provider::{LlmError, LlmProvider, Message, ResponseFormat, Role};
pub use providers::create_provider;
pub use study::{clamp_text, StudyError, StudyPackGenerator};
