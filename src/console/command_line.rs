// SPDX-License-Identifier: GPL-3.0-only

//! Bounded command line input

use std::fmt;

use crate::constants::DEFAULT_COMMAND_MAX_LEN;

/// Reason a keystroke was not added to the line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRejected {
    /// The line already holds the maximum number of characters
    LimitReached { limit: usize },
    /// Control characters never enter the line
    NotPrintable(char),
}

impl fmt::Display for InputRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputRejected::LimitReached { limit } => {
                write!(f, "command line limit of {} characters reached", limit)
            }
            InputRejected::NotPrintable(ch) => write!(f, "unprintable character {:?}", ch),
        }
    }
}

impl std::error::Error for InputRejected {}

/// In-progress command text
#[derive(Debug, Clone)]
pub struct CommandLine {
    text: String,
    chars: usize,
    max_chars: usize,
}

impl CommandLine {
    pub fn new(max_chars: usize) -> Self {
        Self {
            text: String::with_capacity(max_chars),
            chars: 0,
            max_chars,
        }
    }

    pub fn push(&mut self, ch: char) -> Result<(), InputRejected> {
        if ch.is_control() {
            return Err(InputRejected::NotPrintable(ch));
        }
        if self.chars >= self.max_chars {
            return Err(InputRejected::LimitReached {
                limit: self.max_chars,
            });
        }
        self.text.push(ch);
        self.chars += 1;
        Ok(())
    }

    /// Remove the last character, if any
    pub fn backspace(&mut self) -> Option<char> {
        let ch = self.text.pop()?;
        self.chars -= 1;
        Some(ch)
    }

    /// Run `dispatch` on the line, then clear it
    ///
    /// An empty line is not dispatched.
    pub fn submit<R>(&mut self, dispatch: impl FnOnce(&str) -> R) -> Option<R> {
        if self.text.is_empty() {
            return None;
        }
        let result = dispatch(&self.text);
        self.clear();
        Some(result)
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.chars = 0;
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.chars
    }

    pub fn is_empty(&self) -> bool {
        self.chars == 0
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }
}

impl Default for CommandLine {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_MAX_LEN)
    }
}
