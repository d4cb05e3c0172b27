//! Interactive permission prompt on the terminal

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use colored::Colorize;
use tracing::debug;

use crate::application::ports::PermissionAuthority;
use crate::infrastructure::terminal::LineInput;

/// Asks on stderr and reads the answer from the shell's input. A grant is
/// remembered for the process; a refusal is asked again on the next request.
pub struct PromptPermission {
    input: LineInput,
    granted: AtomicBool,
}

impl PromptPermission {
    pub fn new(input: LineInput) -> Self {
        Self {
            input,
            granted: AtomicBool::new(false),
        }
    }
}

/// `y`/`yes` in any case grants; anything else denies
fn parse_answer(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[async_trait]
impl PermissionAuthority for PromptPermission {
    async fn request_microphone_access(&self) -> bool {
        if self.granted.load(Ordering::SeqCst) {
            return true;
        }

        eprint!("{} ", "Allow voice-memo to use the microphone? [y/N]".bold());
        let _ = io::stderr().flush();

        let granted = match self.input.next_line().await {
            Ok(Some(line)) => parse_answer(&line),
            Ok(None) => false,
            Err(e) => {
                debug!(error = %e, "Failed to read permission answer");
                false
            }
        };
        debug!(granted, "Permission prompt answered");
        if granted {
            self.granted.store(true, Ordering::SeqCst);
        }
        granted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt_over(script: &'static [u8]) -> (PromptPermission, LineInput) {
        let input = LineInput::new(script);
        (PromptPermission::new(input.clone()), input)
    }

    #[test]
    fn parse_answer_accepts_yes() {
        assert!(parse_answer("y\n"));
        assert!(parse_answer("  YES "));
    }

    #[test]
    fn parse_answer_defaults_to_no() {
        assert!(!parse_answer("\n"));
        assert!(!parse_answer("n"));
        assert!(!parse_answer("sure"));
    }

    #[tokio::test]
    async fn answer_comes_from_shared_input() {
        let (prompt, input) = prompt_over(b"y\nstatus\n");

        assert!(prompt.request_microphone_access().await);
        assert_eq!(input.next_line().await.unwrap().as_deref(), Some("status"));
    }

    #[tokio::test]
    async fn line_buffered_before_the_prompt_is_not_lost() {
        let (prompt, input) = prompt_over(b"permission\ny\n");

        assert_eq!(input.next_line().await.unwrap().as_deref(), Some("permission"));
        assert!(prompt.request_microphone_access().await);
    }

    #[tokio::test]
    async fn refusal_is_asked_again_and_grant_is_kept() {
        let (prompt, _input) = prompt_over(b"n\nyes\n");

        assert!(!prompt.request_microphone_access().await);
        assert!(prompt.request_microphone_access().await);
        // Input is exhausted; the remembered grant answers
        assert!(prompt.request_microphone_access().await);
    }

    #[tokio::test]
    async fn end_of_input_denies() {
        let (prompt, _input) = prompt_over(b"");
        assert!(!prompt.request_microphone_access().await);
    }
}
