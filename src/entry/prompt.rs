use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::str::FromStr;

/// Line-oriented question and answer over any reader/writer pair.
///
/// The terminal forms use stdin/stdout; tests drive the same forms from a
/// byte buffer.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Print a line of guidance.
    pub fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{}", text).context("Failed to write prompt")
    }

    /// Prompt with a message and return the trimmed input.
    ///
    /// End of input is an error so a closed stdin cannot spin a retry loop.
    pub fn ask(&mut self, message: &str) -> Result<String> {
        write!(self.output, "{}", message).context("Failed to write prompt")?;
        self.output.flush().context("Failed to flush prompt")?;
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("Failed to read input")?;
        if read == 0 {
            anyhow::bail!("Input closed before the form was complete");
        }
        Ok(line.trim().to_string())
    }

    /// Prompt with a default value. Returns the default if input is empty.
    pub fn ask_with_default(&mut self, message: &str, default: &str) -> Result<String> {
        let input = if default.is_empty() {
            self.ask(&format!("{}: ", message))?
        } else {
            self.ask(&format!("{} [{}]: ", message, default))?
        };
        if input.is_empty() {
            Ok(default.to_string())
        } else {
            Ok(input)
        }
    }

    /// Prompt until a non-empty answer is given.
    pub fn ask_required(&mut self, message: &str, default: &str) -> Result<String> {
        loop {
            let input = self.ask_with_default(message, default)?;
            if !input.is_empty() {
                return Ok(input);
            }
            self.say("  Invalid: a value is required. Try again.")?;
        }
    }

    /// Yes/no question. Empty input takes the default.
    pub fn ask_yes_no(&mut self, message: &str, default_yes: bool) -> Result<bool> {
        let hint = if default_yes { "Y/n" } else { "y/N" };
        let input = self.ask(&format!("{} [{}]: ", message, hint))?.to_lowercase();
        if input.is_empty() {
            Ok(default_yes)
        } else {
            Ok(input == "y" || input == "yes")
        }
    }

    /// Prompt until the answer parses and passes `check`.
    pub fn ask_parsed<T, C>(&mut self, message: &str, default: &str, check: C) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
        C: Fn(&T) -> Result<(), String>,
    {
        loop {
            let input = self.ask_with_default(message, default)?;
            match input.parse::<T>() {
                Ok(value) => match check(&value) {
                    Ok(()) => return Ok(value),
                    Err(reason) => self.say(&format!("  Invalid: {}. Try again.", reason))?,
                },
                Err(e) => self.say(&format!("  Invalid: {}. Try again.", e))?,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_ask_trims() {
        let mut p = prompter("  hello \n");
        assert_eq!(p.ask("Name: ").unwrap(), "hello");
        assert_eq!(String::from_utf8(p.into_output()).unwrap(), "Name: ");
    }

    #[test]
    fn test_default_on_empty() {
        let mut p = prompter("\n");
        assert_eq!(p.ask_with_default("Owner", "CRO").unwrap(), "CRO");
    }

    #[test]
    fn test_yes_no() {
        let mut p = prompter("\nno\nYES\n");
        assert!(p.ask_yes_no("Continue?", true).unwrap());
        assert!(!p.ask_yes_no("Continue?", true).unwrap());
        assert!(p.ask_yes_no("Continue?", false).unwrap());
    }

    #[test]
    fn test_parsed_retries_until_valid() {
        let mut p = prompter("abc\n9\n4\n");
        let value: u8 = p
            .ask_parsed("Likelihood", "", |v: &u8| {
                if (1..=5).contains(v) {
                    Ok(())
                } else {
                    Err("must be between 1 and 5".to_string())
                }
            })
            .unwrap();
        assert_eq!(value, 4);
        let out = String::from_utf8(p.into_output()).unwrap();
        assert_eq!(out.matches("Invalid").count(), 2);
        assert!(out.contains("Invalid: must be between 1 and 5. Try again."));
    }

    #[test]
    fn test_closed_input_is_an_error() {
        let mut p = prompter("");
        assert!(p.ask_required("Risk ID", "").is_err());
    }
}
