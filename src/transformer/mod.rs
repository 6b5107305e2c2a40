//! Protocol translation between the OpenAI Chat Completions format and the
//! Anakin chatbot API.
//!
//! - [`anakin`]: request flattening and upstream payload extraction
//! - [`openai`]: OpenAI response and chunk construction
//! - [`stream`]: line decoding and SSE framing

pub mod anakin;
pub mod openai;
pub mod stream;

pub use anakin::{flatten_messages, AnakinRequest};
pub use openai::ResponseTranslator;
pub use stream::{parse_data_line, DataLine, LineDecoder};
