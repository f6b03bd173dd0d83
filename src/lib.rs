//! Interactive arithmetic calculator: a tokenizer, a two-stack evaluator with
//! right-associative exponents, and a variable store seeded with `pi` and `e`.

pub mod calc_engine;
pub mod console;
pub mod format;
pub mod line_buffer;

pub use calc_engine::{CalcError, Calculator, Evaluation, UnboundPolicy};
