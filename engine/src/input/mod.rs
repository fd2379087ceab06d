//! Input mutation: committed symbols applied to text or arithmetic
//! buffers, plus the arithmetic evaluator.

pub mod buffer;
pub mod eval;
