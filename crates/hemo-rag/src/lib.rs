//! Retrieval-augmented answering for hemoglobinopathy questions.
//!
//! [`RetrievalEngine`] owns the knowledge indices and picks context;
//! [`Chatbot`] turns that context into an answer; [`ReportAnalyzer`] assesses
//! blood-test parameters; [`MessageRouter`] dispatches inbound chat messages
//! and [`PatientRegistry`] welcomes new patients.

pub mod analyzer;
pub mod bootstrap;
pub mod chatbot;
pub mod engine;
pub mod messaging;
pub mod openai_chat;

pub use analyzer::{Assessment, ReportAnalyzer};
pub use bootstrap::{bootstrap_sources, IndexSlot, KnowledgeSources};
pub use chatbot::{ChatAnswer, Chatbot};
pub use engine::{RetrievalEngine, RetrievedContext, SkipReason, SkippedTier, FALLBACK_PASSAGES, TOP_K};
pub use messaging::{MessageGateway, MessageRouter, PatientRegistry, PhoneNumber, RouteAction, RoutedReply};
pub use openai_chat::OpenAiChat;
