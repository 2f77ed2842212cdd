//! Conversation core for the Nyaya legal assistant.
//!
//! Owns the transcript, dispatches questions to the answering service, and
//! regenerates earlier answers in place.

pub mod controller;
pub mod error;
pub mod events;
pub mod state;
pub mod store;
pub mod types;

pub use controller::{Indicators, SessionController};
pub use error::ChatError;
pub use events::{ChatAction, ChatEvent, ChatObserver, TracingObserver};
pub use state::ControllerState;
pub use store::ConversationStore;
pub use types::{Message, MessageId, Revision, Role};

pub use nyaya_client::{Answer, AnsweringService, AskError, Provenance};
