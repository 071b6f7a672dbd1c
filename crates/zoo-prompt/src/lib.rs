//! Zoo Prompt - assistant system prompt assembly
//!
//! Builds the system prompt an animal assistant runs with:
//! - [`merge_assistant_prompt`]: identity preamble + personality + guardrail
//! - [`validate_assistant_prompt`]: structural checks on a finished prompt
//! - [`validate_prompt_quality`]: a `[0, 1]` length/uniqueness heuristic
//! - [`guardrail_text`]: renders a guardrail record into prompt text
//!
//! Merging is plain template concatenation; nothing is rewritten or
//! truncated.

#![warn(unreachable_pub)]

pub mod error;
pub mod guardrail;
pub mod merge;
pub mod validate;

pub use error::PromptError;
pub use guardrail::{guardrail_text, personality_text};
pub use merge::{merge_assistant_prompt, MergeStats};
pub use validate::{
    validate_assistant_prompt, validate_prompt_quality, PromptValidation, MAX_PROMPT_CHARS,
};
