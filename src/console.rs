//! Terminal presentation
//!
//! Prints the instructions and one line per session state change.

use std::io::{self, Write};

use crate::session::SessionState;

pub const TITLE: &str = "Farcaster EdDSA Signer";
pub const PROTOCOL_DOCS_URL: &str =
    "https://github.com/farcasterxyz/protocol#45-signer-authorizations";

const DESCRIPTION: &str = "A small demo app to generate an EdDSA signer, which can be used to \
sign casts in the Farcaster v2 protocol.";

const STEPS: [&str; 4] = [
    "Load the wallet that holds your Farcaster account (pass its key with --wallet-key or WALLET_PRIVATE_KEY)",
    "The wallet connects and the fid of its address is looked up",
    "A signature request appears, approve it to sign the signer authorization",
    "The signed message and signature are written to the log",
];

/// Writes user-facing output to a terminal or any other sink.
pub struct Console<W: Write> {
    out: W,
}

impl Console<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Prints the static instructions.
    pub fn render_intro(&mut self) -> io::Result<()> {
        writeln!(self.out, "{}", TITLE)?;
        writeln!(self.out)?;
        writeln!(self.out, "{}", DESCRIPTION)?;
        writeln!(self.out)?;
        writeln!(self.out, "Steps:")?;
        for (i, step) in STEPS.iter().enumerate() {
            writeln!(self.out, "  {}. {}", i + 1, step)?;
        }
        writeln!(self.out)?;
        writeln!(self.out, "Technical details: {}", PROTOCOL_DOCS_URL)?;
        writeln!(self.out)?;
        self.out.flush()
    }

    pub fn render_state(&mut self, state: &SessionState) -> io::Result<()> {
        let line = match state {
            SessionState::Disconnected => "Wallet disconnected".to_string(),
            SessionState::Connecting => "Connecting wallet...".to_string(),
            SessionState::Connected { address } => format!("Connected {}", address),
            SessionState::Resolving { address } => format!("Looking up fid for {}...", address),
            SessionState::Composed { message } => {
                format!("Composed signer authorization for fid {}", message.fid)
            }
            SessionState::AwaitingSignature { .. } => {
                "Waiting for the wallet to sign...".to_string()
            }
            SessionState::Signed(signed) => format!(
                "Signed. fid: {}, signer: {}",
                signed.message.fid, signed.message.authorized_public_key
            ),
            SessionState::Failed { reason } => format!("Failed: {}", reason),
        };
        writeln!(self.out, "[{}] {}", state.name(), line)?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
