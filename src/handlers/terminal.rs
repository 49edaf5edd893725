use inquire::{InquireError, Text};
use tracing::warn;

/// Line-oriented user I/O for the dialogue.
pub trait Terminal: Send {
    fn say(&mut self, text: &str);

    /// `None` once the user cancels or input is exhausted.
    fn ask(&mut self, prompt: &str) -> Option<String>;
}

pub struct InquireTerminal;

impl Terminal for InquireTerminal {
    fn say(&mut self, text: &str) {
        println!("{}", text);
    }

    fn ask(&mut self, prompt: &str) -> Option<String> {
        match Text::new(prompt).prompt() {
            Ok(answer) => Some(answer),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => None,
            Err(err) => {
                warn!(error = %err, "failed to read input");
                None
            }
        }
    }
}
