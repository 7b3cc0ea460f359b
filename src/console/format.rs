// SPDX-License-Identifier: GPL-3.0-only

//! Restricted printf-style line formatter
//!
//! Recognizes `%d`, `%f`, `%s` and `%c`. Each directive letter looks back one
//! template character; when that character is `%`, the `%` already copied to
//! the output is dropped and the rendered argument takes its place. Anything
//! else, including a lone or trailing `%`, is copied verbatim.

use crate::constants::MAX_LINE_BYTES;
use crate::errors::FormatError;

/// One argument for a console line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormatArg<'a> {
    Int(i64),
    /// Unsigned counts and sizes, printed by `%d` without clamping
    Uint(u64),
    Float(f64),
    Str(&'a str),
    Char(char),
}

impl From<i64> for FormatArg<'_> {
    fn from(value: i64) -> Self {
        FormatArg::Int(value)
    }
}

impl From<i32> for FormatArg<'_> {
    fn from(value: i32) -> Self {
        FormatArg::Int(value.into())
    }
}

impl From<i8> for FormatArg<'_> {
    fn from(value: i8) -> Self {
        FormatArg::Int(value.into())
    }
}

impl From<u32> for FormatArg<'_> {
    fn from(value: u32) -> Self {
        FormatArg::Int(value.into())
    }
}

impl From<u64> for FormatArg<'_> {
    fn from(value: u64) -> Self {
        FormatArg::Uint(value)
    }
}

impl From<usize> for FormatArg<'_> {
    fn from(value: usize) -> Self {
        FormatArg::Uint(value as u64)
    }
}

impl From<f64> for FormatArg<'_> {
    fn from(value: f64) -> Self {
        FormatArg::Float(value)
    }
}

impl From<f32> for FormatArg<'_> {
    fn from(value: f32) -> Self {
        FormatArg::Float(value.into())
    }
}

impl<'a> From<&'a str> for FormatArg<'a> {
    fn from(value: &'a str) -> Self {
        FormatArg::Str(value)
    }
}

impl<'a> From<&'a String> for FormatArg<'a> {
    fn from(value: &'a String) -> Self {
        FormatArg::Str(value.as_str())
    }
}

impl From<char> for FormatArg<'_> {
    fn from(value: char) -> Self {
        FormatArg::Char(value)
    }
}

/// Output buffer for one formatting call
struct FormatAccumulator {
    buf: String,
    limit: usize,
}

impl FormatAccumulator {
    fn with_limit(limit: usize) -> Self {
        Self {
            buf: String::new(),
            limit,
        }
    }

    fn push_str(&mut self, text: &str) -> Result<(), FormatError> {
        if self.buf.len() + text.len() > self.limit {
            return Err(FormatError::TooLong);
        }
        self.buf
            .try_reserve(text.len())
            .map_err(|_| FormatError::Allocation)?;
        self.buf.push_str(text);
        Ok(())
    }

    fn push(&mut self, ch: char) -> Result<(), FormatError> {
        let mut utf8 = [0u8; 4];
        self.push_str(ch.encode_utf8(&mut utf8))
    }

    /// Drop the speculative `%` copied one step earlier
    fn retract_percent(&mut self) {
        if self.buf.ends_with('%') {
            self.buf.pop();
        }
    }

    fn finish(self) -> String {
        self.buf
    }
}

/// Render `template` with `args` into a new line
pub fn format_line(template: &str, args: &[FormatArg<'_>]) -> Result<String, FormatError> {
    format_line_bounded(template, args, MAX_LINE_BYTES)
}

fn format_line_bounded(
    template: &str,
    args: &[FormatArg<'_>],
    limit: usize,
) -> Result<String, FormatError> {
    let mut out = FormatAccumulator::with_limit(limit);
    let mut args = args.iter();
    let mut prev: Option<char> = None;

    for (position, ch) in template.char_indices() {
        let is_directive = prev == Some('%') && matches!(ch, 'd' | 'f' | 's' | 'c');
        prev = Some(ch);

        if !is_directive {
            out.push(ch)?;
            continue;
        }

        let arg = args.next().ok_or(FormatError::MissingArgument {
            directive: ch,
            position,
        })?;
        out.retract_percent();

        match (ch, arg) {
            ('d', FormatArg::Int(value)) => out.push_str(&value.to_string())?,
            ('d', FormatArg::Uint(value)) => out.push_str(&value.to_string())?,
            ('f', FormatArg::Float(value)) => out.push_str(&format!("{:.6}", value))?,
            ('s', FormatArg::Str(value)) => out.push_str(value)?,
            ('c', FormatArg::Char(value)) => out.push(*value)?,
            _ => {
                return Err(FormatError::ArgumentMismatch {
                    directive: ch,
                    position,
                });
            }
        }
    }

    Ok(out.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_copied() {
        assert_eq!(format_line("Kinect is not open.", &[]).unwrap(), "Kinect is not open.");
    }

    #[test]
    fn test_integer_directive() {
        let line = format_line("Angle set to %d degrees", &[15i64.into()]).unwrap();
        assert_eq!(line, "Angle set to 15 degrees");
    }

    #[test]
    fn test_large_unsigned_values_print_exactly() {
        let line = format_line("%d frames", &[u64::MAX.into()]).unwrap();
        assert_eq!(line, "18446744073709551615 frames");
        let line = format_line("%d bytes", &[usize::MAX.into()]).unwrap();
        assert_eq!(line, format!("{} bytes", usize::MAX));
    }

    #[test]
    fn test_all_directives_in_place() {
        let line = format_line(
            "%s has %d devices, %f volts, grade %c",
            &["bus".into(), (-2i64).into(), 1.5f64.into(), 'A'.into()],
        )
        .unwrap();
        assert_eq!(line, "bus has -2 devices, 1.500000 volts, grade A");
    }

    #[test]
    fn test_adjacent_directives() {
        let line = format_line("%d%d%s", &[1i64.into(), 2i64.into(), "x".into()]).unwrap();
        assert_eq!(line, "12x");
    }

    #[test]
    fn test_no_directive_percent_survives() {
        let line = format_line("%d", &[7i64.into()]).unwrap();
        assert!(!line.contains('%'));
    }

    #[test]
    fn test_lone_and_trailing_percent_are_literal() {
        assert_eq!(format_line("100% done", &[]).unwrap(), "100% done");
        assert_eq!(format_line("ratio %", &[]).unwrap(), "ratio %");
        assert_eq!(format_line("%x", &[]).unwrap(), "%x");
    }

    #[test]
    fn test_double_percent_looks_back_one_char() {
        assert_eq!(format_line("%%d", &[5i64.into()]).unwrap(), "%5");
    }

    #[test]
    fn test_missing_argument() {
        assert_eq!(
            format_line("a %d b %d", &[1i64.into()]),
            Err(FormatError::MissingArgument {
                directive: 'd',
                position: 8
            })
        );
    }

    #[test]
    fn test_argument_mismatch() {
        assert_eq!(
            format_line("%d", &["nope".into()]),
            Err(FormatError::ArgumentMismatch {
                directive: 'd',
                position: 1
            })
        );
        assert!(format_line("%c", &[65i64.into()]).is_err());
    }

    #[test]
    fn test_extra_arguments_ignored() {
        assert_eq!(format_line("%d", &[1i64.into(), 2i64.into()]).unwrap(), "1");
    }

    #[test]
    fn test_string_argument_with_percent_is_verbatim() {
        assert_eq!(format_line("%s!", &["%d".into()]).unwrap(), "%d!");
    }

    #[test]
    fn test_multibyte_text() {
        let line = format_line("tilt → %d°", &[(-28i64).into()]).unwrap();
        assert_eq!(line, "tilt → -28°");
    }

    #[test]
    fn test_formatting_is_idempotent() {
        let args: [FormatArg; 2] = [3i64.into(), "rgb".into()];
        let first = format_line("%d frames of %s", &args).unwrap();
        let second = format_line("%d frames of %s", &args).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_line_limit() {
        assert_eq!(format_line_bounded("abcd", &[], 4).unwrap(), "abcd");
        assert_eq!(
            format_line_bounded("abcde", &[], 4),
            Err(FormatError::TooLong)
        );
        let long = "x".repeat(MAX_LINE_BYTES);
        assert_eq!(
            format_line("%s!", &[long.as_str().into()]),
            Err(FormatError::TooLong)
        );
    }
}
