//! Document walkers
//!
//! Each module implements one traversal over a (possibly trimmed) working root.

mod census;
mod nested;
mod sequential;
mod trim;

pub use census::*;
pub use nested::*;
pub use sequential::*;
pub use trim::*;
