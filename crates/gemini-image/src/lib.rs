pub mod api;
pub mod error;
pub mod models;
pub mod types;
pub mod utils;

pub use api::{
    check_api_key, classify_error, first_inline_image, response_to_text_data,
    send_generate_request,
};
pub use error::{GeminiError, Result};
pub use types::{GeminiClient, GenerationConfig, ImageConfig, Message, MessagePart, Role};
