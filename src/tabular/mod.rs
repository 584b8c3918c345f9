pub mod row;
pub mod source;

pub use row::{Column, TabularRow};
pub use source::{mean, median, TabularSource};
