// LLM abstraction layer

pub mod provider;
pub mod google;
pub mod openai;

pub use provider::*;
