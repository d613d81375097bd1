//! Browser session management
//!
//! A [`Session`] owns one page through a [`PageDriver`]. The production driver is
//! [`ChromeDriver`]; anything exposing the same primitives can stand in for it.

pub mod chrome;
pub mod config;
pub mod driver;
pub mod session;

pub use chrome::{BrowserTarget, ChromeDriver, ChromeDriverFactory};
pub use config::{ConnectionOptions, LaunchOptions, SessionConfig};
pub use driver::{DriverFactory, ElementScope, PageDriver};
pub use session::{Session, SessionState};
