//! # scrap-engine
//!
//! Browser automation action engine over the Chrome DevTools Protocol (CDP).
//!
//! ## Features
//!
//! - **Session**: one live Chrome page with serialized, time-bounded operations
//! - **Dispatcher**: a fixed verb set (`extract_elements`, `interact_with_element`, `print_page`,
//!   `page_summary`, `navigate`, `end_navigation`) that reports failures as readable observations
//! - **Action Loop**: drives an external proposer one action per turn until it returns a final answer
//! - **Scrap Scripts**: declarative, parameterized step lists replayed without a proposer
//!
//! ## Dispatching actions
//!
//! ```rust,no_run
//! use scrap_engine::{ChromeDriver, LaunchOptions, Scrapper, Session, SessionConfig};
//! use std::sync::Arc;
//!
//! # async fn run() -> scrap_engine::Result<()> {
//! let driver = ChromeDriver::launch(LaunchOptions::default());
//! let session = Arc::new(Session::new(Box::new(driver), SessionConfig::default()));
//! session.open("https://books.toscrape.com").await?;
//!
//! let scrapper = Scrapper::new(session.clone());
//! let observation = scrapper.run_expression("extract_elements('article h3 a', true, 5)").await?;
//! println!("{}", observation);
//!
//! session.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Replaying a script
//!
//! ```rust,no_run
//! use scrap_engine::{ChromeDriverFactory, LaunchOptions, Script, ScriptRunner};
//! use std::{collections::HashMap, sync::Arc};
//!
//! # async fn run() -> scrap_engine::Result<()> {
//! let script = Script::load("books.toscrape.com.json")?;
//! let runner = ScriptRunner::new(Arc::new(ChromeDriverFactory::launch(LaunchOptions::default())));
//!
//! let values = HashMap::from([("category".to_string(), "science-fiction_16".to_string())]);
//! let output = runner.run(&script, &values).await?;
//! println!("{}", output);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`browser`]: the page driver contract, its Chrome implementation and the [`Session`]
//! - [`dom`]: element snapshots and their descriptor rendering
//! - [`tools`]: actions, their grammar and the [`Scrapper`] dispatcher
//! - [`agent`]: the proposer-driven [`ActionLoop`]
//! - [`script`]: scrap scripts, their runner and store
//! - [`vision`]: the screenshot description hook
//! - [`error`]: error types and result alias

pub mod agent;
pub mod browser;
pub mod dom;
pub mod error;
pub mod script;
pub mod tools;
pub mod vision;

pub use agent::{ActionLoop, ActionProposer, LoopConfig, LoopReport, ProposalRequest, RunOutcome, RunRecord,
                ScrapingAgent};
pub use browser::{BrowserTarget, ChromeDriver, ChromeDriverFactory, ConnectionOptions, DriverFactory,
                  ElementScope, LaunchOptions, PageDriver, Session, SessionConfig, SessionState};
pub use dom::{ElementDescriptor, ElementSnapshot};
pub use error::{Result, ScrapError};
pub use script::{Script, ScriptOutput, ScriptRunner, ScriptStore, Step};
pub use tools::{parse_action, Action, ActionKind, DispatchConfig, Observation, Scrapper};
pub use vision::PageDescriber;
