pub mod bulk;
pub mod document;
