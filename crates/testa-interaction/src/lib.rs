//! Remote service adapters for testa.

pub mod openai_assistants_client;

pub use openai_assistants_client::OpenAIAssistantsClient;
