use std::io::{self, Write};

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine as _;
use log::warn;
use ssh2::{HashType, Session};

use crate::connections::errors::ConnectionError;

/// How to treat the host key a server presents during the SSH handshake.
///
/// Checked after the transport handshake and before authentication, so a
/// rejected key never sees the password.
#[derive(Debug, Clone, Default)]
pub enum HostKeyPolicy {
    /// Trust whatever key the server presents. No pinning, no verification.
    #[default]
    AutoAccept,
    /// Require the key to match an OpenSSH-style `SHA256:<base64>` fingerprint.
    PinnedSha256(String),
    /// Show the fingerprint and ask for confirmation on stdin.
    Prompt,
}

impl HostKeyPolicy {
    pub fn verify(&self, host: &str, session: &Session) -> Result<(), ConnectionError> {
        let fingerprint = fingerprint_sha256(session).ok_or_else(|| {
            ConnectionError::HostKeyRejected(format!("'{}' presented no host key", host))
        })?;

        match self {
            HostKeyPolicy::AutoAccept => {
                warn!("Accepting host key of '{}' unverified: {}", host, fingerprint);
                Ok(())
            }
            HostKeyPolicy::PinnedSha256(expected) => {
                if expected == &fingerprint {
                    Ok(())
                } else {
                    Err(ConnectionError::HostKeyRejected(format!(
                        "'{}': expected {}, server presented {}",
                        host, expected, fingerprint
                    )))
                }
            }
            HostKeyPolicy::Prompt => {
                print!("Host key for '{}' is {}. Connect? [y/N] ", host, fingerprint);
                io::stdout().flush()?;
                let mut answer = String::new();
                io::stdin().read_line(&mut answer)?;
                let answer = answer.trim();
                if answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes") {
                    Ok(())
                } else {
                    Err(ConnectionError::HostKeyRejected(format!(
                        "'{}': declined by user",
                        host
                    )))
                }
            }
        }
    }
}

/// OpenSSH-style SHA256 fingerprint of the server's host key, if the
/// handshake has completed.
pub fn fingerprint_sha256(session: &Session) -> Option<String> {
    session
        .host_key_hash(HashType::Sha256)
        .map(|hash| format!("SHA256:{}", STANDARD_NO_PAD.encode(hash)))
}
