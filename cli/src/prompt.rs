use mbrkit_core::{Choice, RestorePrompt, RestoreQuestion, RestoreWarning};
use std::io::{BufRead, Write};

/// Asks the reconciler's questions on a terminal.
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn read_answer(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_lowercase()),
        }
    }
}

impl<R: BufRead, W: Write> RestorePrompt for TerminalPrompt<R, W> {
    fn choose(&mut self, question: &RestoreQuestion) -> Choice {
        let _ = writeln!(self.output, "\n{}", question.message());
        let _ = writeln!(self.output, "1. {}", question.first_option());
        let _ = writeln!(self.output, "2. {}", question.second_option());
        let _ = writeln!(self.output, "q. Cancel");

        loop {
            let _ = write!(self.output, "Your choice (1,2,q): ");
            let _ = self.output.flush();
            match self.read_answer().as_deref() {
                Some("1") => return Choice::First,
                Some("2") => return Choice::Second,
                Some("q") | None => return Choice::Cancel,
                Some(_) => continue,
            }
        }
    }

    fn warn(&mut self, warning: RestoreWarning) {
        let _ = writeln!(self.output, "\nWARNING: {}", warning.message());
    }
}

/// Reads a yes/no confirmation. Only "yes" agrees.
pub fn confirm<R: BufRead, W: Write>(input: &mut R, output: &mut W, message: &str) -> bool {
    let _ = write!(output, "{} Type 'yes' to continue: ", message);
    let _ = output.flush();
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(_) => line.trim() == "yes",
        Err(_) => false,
    }
}
