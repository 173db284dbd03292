//! Command-line client for MicroPython WebREPL devices.

#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::missing_docs_in_private_items
)]

mod target;

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;
use wrepl::{Connection, ExecOpts, ExecOutcome};

use crate::target::Remote;

#[derive(Parser)]
#[command(
    name = "wrepl",
    version,
    about = "Access a remote REPL and move files over the WebREPL protocol",
    after_help = "\
Examples:
  wrepl 192.168.4.1
  wrepl script.py 192.168.4.1:/app/script.py
  wrepl -p secret 192.168.4.1:/app/script.py .
  wrepl -p secret -e \"print('hi')\" 192.168.4.1"
)]
struct Cli {
    /// Device password (prompted with masking when omitted).
    #[arg(short = 'p', long)]
    password: Option<String>,

    /// Execute a code fragment and print its output instead of opening a
    /// REPL.
    #[arg(short = 'e', long = "exec", value_name = "CODE")]
    code: Option<String>,

    /// Generate shell completion scripts.
    #[arg(long, hide = true, value_name = "SHELL")]
    completions: Option<Shell>,

    /// `host[:port]`, `host[:port]:remote_path`, or a local path.
    #[arg(value_name = "SOURCE", required_unless_present = "completions")]
    source: Option<String>,

    /// `host[:port]:remote_path` or a local path.
    #[arg(value_name = "DEST")]
    dest: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_logging();
    if let Err(e) = Cli::parse().dispatch().await {
        eprintln!("wrepl: {e:#}");
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

impl Cli {
    async fn dispatch(self) -> Result<()> {
        if let Some(shell) = self.completions {
            clap_complete::generate(shell, &mut Self::command(), "wrepl", &mut std::io::stdout());
            return Ok(());
        }
        let Some(source) = self.source else {
            bail!("missing host argument");
        };

        let password = match self.password {
            Some(p) => p,
            None => prompt_password()?,
        };

        if let Some(code) = self.code {
            let (host, port) = target::parse_endpoint(&source)?;
            return exec(&host, port, &password, &code).await;
        }

        match self.dest {
            None => {
                let (host, port) = target::parse_endpoint(&source)?;
                repl(&host, port, &password).await
            }
            Some(dest) => match (target::parse_remote(&source), target::parse_remote(&dest)) {
                (Some(remote), None) => get(remote, Path::new(&dest), &password).await,
                (None, Some(remote)) => put(Path::new(&source), remote, &password).await,
                _ => bail!("exactly one of source/destination must use host:remote_path form"),
            },
        }
    }
}

/// Connects and logs in; every operation gets a fresh connection.
async fn open(host: &str, port: u16, password: &str) -> Result<Connection> {
    let mut session = wrepl::connect(host, port)
        .await
        .with_context(|| format!("cannot reach {host}:{port}"))?;
    session.login(password).await.context("login failed")?;
    Ok(session)
}

async fn exec(host: &str, port: u16, password: &str, code: &str) -> Result<()> {
    let mut session = open(host, port, password).await?;
    match session.exec(code, ExecOpts::default()).await? {
        ExecOutcome::Reset => eprintln!("[sent reset, not waiting for output]"),
        ExecOutcome::Completed(output) | ExecOutcome::TimedOut(output) => {
            let mut stdout = std::io::stdout();
            stdout.write_all(&output)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

#[cfg(unix)]
async fn repl(host: &str, port: u16, password: &str) -> Result<()> {
    let session = open(host, port, password).await?;
    Ok(wrepl::repl::run(session).await?)
}

#[cfg(not(unix))]
async fn repl(_host: &str, _port: u16, _password: &str) -> Result<()> {
    bail!("the interactive session requires a Unix terminal")
}

async fn get(remote: Remote, dest: &Path, password: &str) -> Result<()> {
    let local = target::resolve_get_dest(dest, &remote.path);
    println!("{} -> {}", remote.path, local.display());

    let mut session = open(&remote.host, remote.port, password).await?;
    session
        .get_file(&remote.path, &local, |received| {
            print!("\rReceived {received} bytes");
            let _ = std::io::stdout().flush();
        })
        .await?;
    println!();
    Ok(())
}

async fn put(source: &Path, remote: Remote, password: &str) -> Result<()> {
    let remote_path = target::resolve_put_dest(&remote.path, source);
    println!("{} -> {}", source.display(), remote_path);

    let mut session = open(&remote.host, remote.port, password).await?;
    session
        .put_file(source, &remote_path, |sent, total| {
            print!("\rSent {sent} of {total} bytes");
            let _ = std::io::stdout().flush();
        })
        .await?;
    println!();
    Ok(())
}

#[cfg(unix)]
fn prompt_password() -> Result<String> {
    Ok(wrepl::term::prompt_password("Password: ")?)
}

#[cfg(not(unix))]
fn prompt_password() -> Result<String> {
    bail!("no masked prompt available on this platform; pass the password with -p")
}
