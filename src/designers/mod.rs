//! Designer algorithms: suggestion generators pluggable into the
//! benchmark harness.

mod random;
mod scalarizing;

pub use random::RandomDesigner;
pub use scalarizing::ScalarizingDesigner;
