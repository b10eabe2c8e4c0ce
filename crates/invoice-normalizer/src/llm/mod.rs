//! Optional LLM advisor for header mapping and customs units.
//!
//! The normalizer works fully without an advisor. When one is installed it is
//! consulted only for required fields the matcher left unmapped and for HS
//! codes the unit table does not cover. Its answers never bypass the
//! matcher's threshold or the unit validation.
//!
//! # Advisors
//!
//! - **OpenAI** - GPT models via API (requires `OPENAI_API_KEY`)
//! - **Mock** - canned answers for tests and offline runs
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use invoice_normalizer::{OpenAiAdvisor, Pipeline, TargetSchema};
//!
//! let pipeline = Pipeline::new(Arc::new(TargetSchema::invoice_default()))
//!     .unwrap()
//!     .with_advisor(OpenAiAdvisor::from_env().unwrap());
//! ```

mod mock;
mod openai;
mod prompts;
mod provider;

pub use mock::MockAdvisor;
pub use openai::OpenAiAdvisor;
pub use provider::{DEFAULT_SUGGESTION_CONFIDENCE, LlmConfig, MappingAdvisor, validate_unit};
