//! scrap command line
//!
//! Replays scrap scripts, stores them per site, and drives the action loop with
//! a human typing proposals on stdin.

use anyhow::{bail, Context};
use async_trait::async_trait;
use clap::{Args, Parser, Subcommand};
use scrap_engine::{agent::{ActionProposer, LoopConfig, ProposalRequest, RunOutcome, ScrapingAgent},
                   browser::{BrowserTarget, ChromeDriverFactory, ConnectionOptions, LaunchOptions, SessionConfig},
                   script::{Script, ScriptRunner, ScriptStore},
                   ScrapError};
use std::{collections::HashMap, path::PathBuf, sync::Arc, time::Duration};
use tokio::{io::{AsyncBufReadExt, BufReader, Lines, Stdin},
            sync::Mutex};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "scrap")]
#[command(version)]
#[command(about = "Browser automation action engine", long_about = None)]
struct Cli {
    #[command(flatten)]
    browser: BrowserArgs,

    /// Directory holding stored scripts, one `<host>.json` per site
    #[arg(long, value_name = "DIR", default_value = "scripts", global = true)]
    scripts_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct BrowserArgs {
    /// Launch browser in headed mode (default: headless)
    #[arg(long, short = 'H', global = true)]
    headed: bool,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH", global = true)]
    executable_path: Option<PathBuf>,

    /// WebSocket endpoint URL for remote browser connection
    #[arg(long, value_name = "URL", global = true)]
    ws_endpoint: Option<String>,

    /// Persistent browser profile directory
    #[arg(long, value_name = "DIR", global = true)]
    user_data_dir: Option<PathBuf>,

    /// Seconds to wait for a selector, click or typing
    #[arg(long, value_name = "SECS", default_value = "10", global = true)]
    element_timeout: u64,

    /// Seconds to wait for a page load
    #[arg(long, value_name = "SECS", default_value = "30", global = true)]
    navigation_timeout: u64,
}

impl BrowserArgs {
    fn factory(&self) -> ChromeDriverFactory {
        if let Some(ws) = &self.ws_endpoint {
            return ChromeDriverFactory::new(BrowserTarget::Connect(ConnectionOptions::new(ws.clone())));
        }

        let mut options = LaunchOptions::new().headless(!self.headed);
        if let Some(path) = &self.executable_path {
            options = options.chrome_path(path.clone());
        }
        if let Some(dir) = &self.user_data_dir {
            options = options.user_data_dir(dir.clone());
        }
        ChromeDriverFactory::launch(options)
    }

    fn session_config(&self) -> SessionConfig {
        SessionConfig::new()
            .element_timeout(Duration::from_secs(self.element_timeout))
            .navigation_timeout(Duration::from_secs(self.navigation_timeout))
    }
}

#[derive(Subcommand)]
enum Command {
    /// Run a script file
    Run {
        script: PathBuf,

        /// Input values as name=value
        #[arg(value_parser = parse_input)]
        inputs: Vec<(String, String)>,

        /// Write the extracted text to this file
        #[arg(long, short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Run the stored script for a URL's site
    Replay {
        url: String,

        #[arg(value_parser = parse_input)]
        inputs: Vec<(String, String)>,

        #[arg(long, short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Store a script under its site's host
    Save { script: PathBuf },

    /// Print the JSON schema of the script format
    Schema,

    /// Navigate a site by typing one proposal per turn on stdin
    Drive {
        url: String,

        /// What the navigation should find out
        #[arg(long, short = 'q')]
        query: String,

        /// Marker separating reasoning from the action
        #[arg(long, default_value = "ACTION:")]
        delimiter: String,

        /// Consecutive malformed proposals before giving up
        #[arg(long, default_value = "3")]
        max_retries: usize,

        #[arg(long, default_value = "100")]
        max_turns: usize,

        /// Write the run transcript to this file
        #[arg(long, value_name = "FILE")]
        transcript: Option<PathBuf>,
    },
}

/// `name=value` with both sides non-empty
fn parse_input(arg: &str) -> Result<(String, String), String> {
    match arg.trim().split_once('=') {
        Some((name, value)) if !name.trim().is_empty() && !value.is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("invalid input '{}', expected name=\"value\"", arg)),
    }
}

/// Proposals typed by a human; a proposal ends at the first empty line
struct StdinProposer {
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl StdinProposer {
    fn new() -> Self {
        Self { lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()) }
    }
}

#[async_trait]
impl ActionProposer for StdinProposer {
    async fn propose(&self, request: ProposalRequest) -> scrap_engine::Result<String> {
        eprintln!("\n--- turn {} ---\n{}", request.turn, request.observation);
        if let Some(correction) = &request.correction {
            eprintln!("\n! {}", correction);
        }
        eprintln!("\nQuery: {}\nProposal (end with an empty line):", request.query);

        let mut lines = self.lines.lock().await;
        let mut proposal = Vec::new();
        loop {
            match lines.next_line().await? {
                Some(line) if line.trim().is_empty() && !proposal.is_empty() => break,
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => proposal.push(line),
                None if proposal.is_empty() => return Err(ScrapError::ProposerFailed("stdin closed".to_string())),
                None => break,
            }
        }
        Ok(proposal.join("\n"))
    }
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, closing the browser");
            token.cancel();
        }
    });
    cancel
}

async fn run_script(
    cli: &Cli,
    script: &Script,
    inputs: &[(String, String)],
    output: Option<&PathBuf>,
) -> anyhow::Result<()> {
    let values: HashMap<String, String> = inputs.iter().cloned().collect();
    let runner = ScriptRunner::new(Arc::new(cli.browser.factory()))
        .with_session_config(cli.browser.session_config())
        .with_cancellation(cancel_on_ctrl_c());

    let result = match runner.run(script, &values).await {
        Ok(result) => result,
        Err(e) => {
            if let Some(report) = e.missing_input_report() {
                eprintln!("Required inputs:\n{}", report);
            }
            return Err(e.into());
        }
    };

    if let Some(path) = output {
        tokio::fs::write(path, result.text()).await.with_context(|| format!("writing {}", path.display()))?;
        eprintln!("Saved extracted data to {}", path.display());
    } else {
        println!("{}", result);
    }

    if let Some(failure) = &result.failure {
        bail!("step {} ('{}') failed: {}", failure.index + 1, failure.action, failure.message);
    }
    if result.cancelled {
        bail!("cancelled");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match &cli.command {
        Command::Run { script, inputs, output } => {
            let script = Script::load(script)?;
            run_script(&cli, &script, inputs, output.as_ref()).await
        }
        Command::Replay { url, inputs, output } => {
            let store = ScriptStore::new(&cli.scripts_dir);
            let key = ScriptStore::key_for_url(url);
            let script = store.get(&key).with_context(|| format!("no stored script for '{}'", key))?;
            run_script(&cli, &script, inputs, output.as_ref()).await
        }
        Command::Save { script } => {
            let script = Script::load(script)?;
            let key = ScriptStore::key_for_url(&script.site);
            let path = ScriptStore::new(&cli.scripts_dir).save(&key, &script)?;
            println!("{}", path.display());
            Ok(())
        }
        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&Script::schema())?);
            Ok(())
        }
        Command::Drive { url, query, delimiter, max_retries, max_turns, transcript } => {
            let agent = ScrapingAgent::new(Arc::new(cli.browser.factory()), Arc::new(StdinProposer::new()))
                .with_session_config(cli.browser.session_config())
                .with_loop_config(
                    LoopConfig::new().delimiter(delimiter.clone()).max_retries(*max_retries).max_turns(*max_turns),
                )
                .with_cancellation(cancel_on_ctrl_c());

            let report = agent.run(url, query).await;
            if let Some(path) = transcript {
                tokio::fs::write(path, report.record.transcript())
                    .await
                    .with_context(|| format!("writing {}", path.display()))?;
            }

            match report.outcome {
                RunOutcome::Completed(answer) => {
                    println!("{}", answer);
                    Ok(())
                }
                RunOutcome::ProtocolFailure(message) => bail!("protocol failure: {}", message),
                RunOutcome::SessionFailure(message) => bail!("session failure: {}", message),
                RunOutcome::Cancelled => bail!("cancelled"),
            }
        }
    }
}
