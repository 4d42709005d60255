mod client;
mod markup;

pub use client::{HttpBackend, interpret_write_response};
pub use markup::key_rows;
