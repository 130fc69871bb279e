//! Text helpers shared by the normalizer and the output writers.

mod text;

pub use text::{clean_text, strip_control_chars};
