//! # reviewkit-report
//!
//! Everything that turns review inputs into text: reviewer personas, review
//! request prompts, the review checklist, markdown reports and formatted
//! review comments.

mod comment;
mod persona;
mod prompts;

pub use comment::{format_review_comment, Severity};
pub use persona::{Persona, PersonaSource, DEFAULT_PERSONA_PATH, EMBEDDED_PERSONA};
pub use prompts::{number_lines, preview, ReportInput, ReviewPrompts, REVIEW_CHECKLIST};
