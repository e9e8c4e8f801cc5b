pub mod graph;
pub mod heap;
pub mod query;
pub mod summary;
pub mod symbols;

pub use graph::*;
pub use heap::*;
pub use query::*;
pub use summary::*;
pub use symbols::*;
