//! Terminal mode guards and the masked password prompt.

use std::io::{self, Write};

use nix::sys::termios::{
    self, ControlFlags, InputFlags, LocalFlags, OutputFlags, SetArg, SpecialCharacterIndices,
    Termios,
};

/// Scoped terminal-mode change, restored on drop.
///
/// Restoration runs on every exit path — normal return, error propagation,
/// unwind — so the terminal is never left in a modified mode.
#[derive(Debug)]
pub struct TermGuard {
    /// Attributes to restore.
    saved: Termios,
}

impl TermGuard {
    /// Switches the controlling terminal to raw mode: no line buffering, no
    /// local echo, no signal-generating control characters, 8-bit clean,
    /// byte-at-a-time reads.
    pub fn raw() -> io::Result<Self> {
        let saved = termios::tcgetattr(io::stdin())?;
        let mut raw = saved.clone();
        raw.input_flags.remove(
            InputFlags::BRKINT
                | InputFlags::ICRNL
                | InputFlags::INPCK
                | InputFlags::ISTRIP
                | InputFlags::IXON,
        );
        raw.output_flags = OutputFlags::empty();
        raw.control_flags.remove(ControlFlags::CSIZE | ControlFlags::PARENB);
        raw.control_flags.insert(ControlFlags::CS8);
        raw.local_flags = LocalFlags::empty();
        raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
        raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
        termios::tcsetattr(io::stdin(), SetArg::TCSANOW, &raw)?;
        Ok(Self { saved })
    }

    /// Disables input echo only, for password entry.
    pub fn no_echo() -> io::Result<Self> {
        let saved = termios::tcgetattr(io::stdin())?;
        let mut quiet = saved.clone();
        quiet.local_flags.remove(LocalFlags::ECHO);
        termios::tcsetattr(io::stdin(), SetArg::TCSANOW, &quiet)?;
        Ok(Self { saved })
    }
}

impl Drop for TermGuard {
    fn drop(&mut self) {
        let _ = termios::tcsetattr(io::stdin(), SetArg::TCSANOW, &self.saved);
    }
}

/// Prompts on stderr and reads one line with echo disabled.
pub fn prompt_password(prompt: &str) -> io::Result<String> {
    let mut err = io::stderr();
    err.write_all(prompt.as_bytes())?;
    err.flush()?;

    let line = {
        let _quiet = TermGuard::no_echo()?;
        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        line
    };
    // The user's enter keystroke was swallowed along with the echo.
    err.write_all(b"\n")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}
