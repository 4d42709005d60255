pub mod fake_backend;
pub mod fixtures;

pub use fake_backend::{FakeBackend, FakeBackendStats, FakeOperation};
