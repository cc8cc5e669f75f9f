// Currency module
// Detection modes and the denomination catalog

pub mod catalog;
pub mod types;

pub use catalog::{lookup, NO_OBJECT_LABEL};
pub use types::{Currency, Denomination, DetectionMode, Form};
