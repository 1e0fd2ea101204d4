mod document;
mod payload;

pub use document::*;
pub use payload::{Payload, PlainRecord};
