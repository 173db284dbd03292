//! Host/port/path argument parsing and destination resolution.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use wrepl::DEFAULT_PORT;

/// A parsed `host[:port]:remote_path` argument.
#[derive(Debug, PartialEq, Eq)]
pub struct Remote {
    /// Device host name or address.
    pub host: String,
    /// Device TCP port.
    pub port: u16,
    /// Absolute or relative path on the device.
    pub path: String,
}

/// Parses `host` or `host:port` for REPL and exec targets.
pub fn parse_endpoint(arg: &str) -> Result<(String, u16)> {
    let Some((host, rest)) = arg.split_once(':') else {
        return Ok((arg.to_owned(), DEFAULT_PORT));
    };
    if host.is_empty() {
        bail!("invalid host argument {arg:?}");
    }
    let port = rest
        .parse()
        .with_context(|| format!("invalid port in {arg:?}"))?;
    Ok((host.to_owned(), port))
}

/// Splits a `host[:port]:remote_path` argument.
///
/// Returns `None` when `arg` has no colon (or starts with one), meaning it
/// names a local path. A lone `host:` maps to the remote root, and an
/// all-digit segment right after the host reads as a port.
pub fn parse_remote(arg: &str) -> Option<Remote> {
    let (host, rest) = arg.split_once(':')?;
    if host.is_empty() {
        return None;
    }
    let (port, mut path) = match rest.split_once(':') {
        Some((segment, tail)) if is_port(segment) => (segment.parse().ok()?, tail.to_owned()),
        _ if is_port(rest) => (rest.parse().ok()?, String::new()),
        _ => (DEFAULT_PORT, rest.to_owned()),
    };
    if path.is_empty() {
        path = "/".to_owned();
    }
    Some(Remote {
        host: host.to_owned(),
        port,
        path,
    })
}

/// True for a non-empty all-digit segment that fits a TCP port.
fn is_port(segment: &str) -> bool {
    !segment.is_empty()
        && segment.bytes().all(|b| b.is_ascii_digit())
        && segment.parse::<u16>().is_ok()
}

/// Resolves a download destination: a directory gets the remote base name.
pub fn resolve_get_dest(dest: &Path, remote_path: &str) -> PathBuf {
    if dest.is_dir() {
        let base = remote_path.rsplit('/').next().unwrap_or(remote_path);
        dest.join(base)
    } else {
        dest.to_owned()
    }
}

/// Resolves an upload destination: a trailing slash appends the local base
/// name.
pub fn resolve_put_dest(remote_path: &str, source: &Path) -> String {
    if remote_path.ends_with('/') {
        let base = source
            .file_name()
            .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
        format!("{remote_path}{base}")
    } else {
        remote_path.to_owned()
    }
}
