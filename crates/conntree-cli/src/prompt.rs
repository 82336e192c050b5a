//! Password prompts for the command line

use std::io::{BufRead, IsTerminal, Write};

use conntree_security::{CredentialPrompt, CredentialRequestor, SecretString};

/// Environment variable checked before prompting
pub(crate) const PASSWORD_ENV: &str = "CONNTREE_PASSWORD";

/// Answers from `CONNTREE_PASSWORD`, otherwise asks on the terminal
///
/// The environment value is offered once; later attempts prompt. Input is
/// hidden when stdin is a terminal; piped input is read a line at a time,
/// and a closed stdin declines the prompt.
#[derive(Debug, Default)]
pub(crate) struct TerminalRequestor {
    env_offered: std::sync::atomic::AtomicBool,
}

impl TerminalRequestor {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

impl CredentialRequestor for TerminalRequestor {
    fn request_credential(&self, prompt: &CredentialPrompt) -> Option<SecretString> {
        let offered = self
            .env_offered
            .swap(true, std::sync::atomic::Ordering::SeqCst);
        if !offered {
            if let Ok(value) = std::env::var(PASSWORD_ENV) {
                return Some(SecretString::from(value));
            }
        }
        read_password(&format!(
            "{} (attempt {}/{}): ",
            prompt.title, prompt.attempt, prompt.max_attempts
        ))
    }
}

/// Password for commands that set one, from the environment or the terminal
pub(crate) fn password_for_seed() -> Option<SecretString> {
    std::env::var(PASSWORD_ENV)
        .ok()
        .map(SecretString::from)
        .or_else(|| read_password("New store password: "))
}

fn read_password(label: &str) -> Option<SecretString> {
    if std::io::stdin().is_terminal() {
        return rpassword::prompt_password(label).ok().map(SecretString::from);
    }
    let mut stderr = std::io::stderr();
    let _ = write!(stderr, "{label}");
    let _ = stderr.flush();
    read_line(&mut std::io::stdin().lock())
}

/// One line from piped input, without its line ending; `None` at end of input
fn read_line(input: &mut impl BufRead) -> Option<SecretString> {
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(SecretString::from(
            line.trim_end_matches(['\r', '\n']).to_string(),
        )),
    }
}
