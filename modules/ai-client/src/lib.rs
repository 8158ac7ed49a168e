pub mod error;
pub mod gemini;
pub mod util;

pub use error::AiError;
pub use gemini::{Gemini, StructuredOutput};
pub use util::{strip_code_blocks, truncate_to_char_boundary};
