//! # Resolve Module
//!
//! Everything that can close a ticket without a human: the resolution cache, the
//! knowledge base and the generative assistant fallback.

pub mod assistant;
pub mod cache;
pub mod http;
pub mod knowledge_base;

pub use assistant::{
    interpret_reply, AssistantFallback, AssistantOutcome, NoAssistant, ResolutionAssistant,
    Suggestion, SuggestionRequest,
};
pub use cache::{CacheKey, ResolutionCache};
pub use http::HttpResolutionAssistant;
pub use knowledge_base::{KnowledgeBase, KnowledgeEntry};
