//! Content stream tokenizing and canonical re-serialization.
//!
//! Page content is rewritten without interpreting operators: every
//! instruction is emitted on its own line with single spaces between
//! operands, and comments are dropped.

pub mod canonical;
pub mod parser;

pub use canonical::{canonicalize, serialize_instructions};
pub use parser::{tokenize, Instruction, Operand};
