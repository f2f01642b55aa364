//! LLM Response Validation
//!
//! JSON repair for malformed structured output and shape helpers that turn
//! a response into a list of items.

mod json_repair;
mod response;

pub use json_repair::{JsonRepairer, extract_json_from_response};
pub use response::{split_blocks, split_lines, string_list};
