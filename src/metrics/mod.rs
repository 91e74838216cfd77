pub mod exposition;

pub use exposition::{render, CONTENT_TYPE};
