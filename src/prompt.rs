//! Interactive yes/no confirmation for `confirm` mode.

use crate::pairing::Confirm;
use std::io::{self, BufRead, Write};

/// Asks on `writer` and reads the answer from `reader`, re-asking until it
/// gets something it understands. End of input counts as "no".
pub struct PromptConfirm<R, W> {
    reader: R,
    writer: W,
}

impl PromptConfirm<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> PromptConfirm<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

fn parse_answer(answer: &str) -> Option<bool> {
    match answer.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" => Some(true),
        "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

impl<R: BufRead, W: Write> Confirm for PromptConfirm<R, W> {
    fn confirm(&mut self, question: &str) -> bool {
        loop {
            let _ = write!(self.writer, "{question} [yes/no]\n> ");
            let _ = self.writer.flush();

            let mut line = String::new();
            match self.reader.read_line(&mut line) {
                Ok(0) | Err(_) => return false,
                Ok(_) => {}
            }
            match parse_answer(&line) {
                Some(answer) => return answer,
                None => {
                    let _ = writeln!(self.writer, "Please answer yes or no.");
                }
            }
        }
    }
}
