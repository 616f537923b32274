pub mod batch;
pub mod completions;
pub mod graph;
pub mod solve;
pub mod util;
pub mod validate;
