// ABOUTME: Parser for the host-map text format.
// ABOUTME: One host per line - address, comma-separated users, optional options.

use crate::error::{Result, SourceError};
use muxgate_core::Host;
use std::path::Path;

/// Option value that marks a host as a default/no-auth host.
const NOAUTH_OPTION: &str = "noauth";

/// Parse a host-map file: `address users[,users...] [options[,options...]]`.
///
/// Blank lines and `#` comments are skipped. Anything that is not two or
/// three whitespace-separated fields is rejected with its line number.
pub fn load_hosts(path: &Path) -> Result<Vec<Host>> {
    let content = std::fs::read_to_string(path).map_err(|e| SourceError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_hosts(&content, path)
}

fn parse_hosts(content: &str, path: &Path) -> Result<Vec<Host>> {
    let mut hosts = Vec::new();

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        let (address, users, options) = match fields.as_slice() {
            [address, users] => (*address, *users, None),
            [address, users, options] => (*address, *users, Some(*options)),
            _ => {
                return Err(SourceError::IncompleteHostEntry {
                    path: path.to_path_buf(),
                    line: index + 1,
                });
            }
        };

        let users = users
            .split(',')
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();
        let no_auth = options
            .map(|opts| opts.split(',').any(|o| o.trim() == NOAUTH_OPTION))
            .unwrap_or(false);

        hosts.push(Host {
            address: address.to_string(),
            users,
            no_auth,
        });
    }

    Ok(hosts)
}
