//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! - [`browser`]: `FakeBrowser`, an in-memory [`Browser`](crate::domain::ports::Browser)
//!   serving scripted pages built from `FakeElement`s.
//! - [`session`]: `FakeSessionFactory`, which hands out `FakeBrowser` sessions and
//!   counts how many are open.

pub mod browser;
pub mod session;

pub use browser::{Action, FakeBrowser, FakeElement};
pub use session::FakeSessionFactory;
