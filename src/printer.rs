//! Line sink that prints streamed lines to a writer.

use crate::reader::LineSink;
use colored::Colorize;
use std::io::{self, Write};

/// How [`LinePrinter`] renders lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrintOptions {
    /// Print lines that are empty or whitespace-only
    pub with_blanks: bool,
    /// Prefix each line with `<filename>: `
    pub with_filename: bool,
    /// Re-indent lines that parse as JSON
    pub pretty: bool,
    /// Color the filename prefix and pretty-printed JSON
    pub color: bool,
}

/// Writes lines to `out`, keeping each line's terminator as it came.
pub struct LinePrinter<W: Write> {
    out: W,
    options: PrintOptions,
}

impl<W: Write> LinePrinter<W> {
    pub fn new(out: W, options: PrintOptions) -> Self {
        Self { out, options }
    }

    pub fn options(&self) -> PrintOptions {
        self.options
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Pretty JSON for `body`, or `None` to print it unchanged.
    fn render(&self, body: &[u8]) -> Option<String> {
        if !self.options.pretty {
            return None;
        }
        let value = parse_json(body)?;
        if self.options.color {
            let mut out = String::new();
            write_colored(&mut out, &value, 0);
            Some(out)
        } else {
            serde_json::to_string_pretty(&value).ok()
        }
    }
}

impl<W: Write> LineSink for LinePrinter<W> {
    fn handle_line(&mut self, filename: &str, line: &[u8]) -> io::Result<bool> {
        let (body, newline) = match line.strip_suffix(b"\n") {
            Some(body) => (body, true),
            None => (line, false),
        };
        let rendered = self.render(body);

        let blank = rendered.is_none() && body.iter().all(u8::is_ascii_whitespace);
        if blank && !self.options.with_blanks {
            return Ok(false);
        }

        if self.options.with_filename {
            if self.options.color {
                write!(self.out, "{}: ", filename.cyan())?;
            } else {
                write!(self.out, "{}: ", filename)?;
            }
        }
        match &rendered {
            Some(text) => self.out.write_all(text.as_bytes())?,
            None => self.out.write_all(body)?,
        }
        if newline {
            self.out.write_all(b"\n")?;
        }
        Ok(true)
    }
}

/// Parse `body` if it is a JSON object or array.
fn parse_json(body: &[u8]) -> Option<serde_json::Value> {
    let first = body.iter().find(|b| !b.is_ascii_whitespace())?;
    if !matches!(*first, b'{' | b'[') {
        return None;
    }
    serde_json::from_slice(body).ok()
}

const INDENT: &str = "  ";

/// Same layout as `to_string_pretty`, with keys and scalars colored.
fn write_colored(out: &mut String, value: &serde_json::Value, depth: usize) {
    use serde_json::Value;

    let pad = INDENT.repeat(depth + 1);
    let close = INDENT.repeat(depth);
    match value {
        Value::Object(map) if !map.is_empty() => {
            out.push_str("{\n");
            for (i, (key, item)) in map.iter().enumerate() {
                out.push_str(&pad);
                out.push_str(&Value::String(key.clone()).to_string().cyan().to_string());
                out.push_str(": ");
                write_colored(out, item, depth + 1);
                if i + 1 < map.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&close);
            out.push('}');
        }
        Value::Array(items) if !items.is_empty() => {
            out.push_str("[\n");
            for (i, item) in items.iter().enumerate() {
                out.push_str(&pad);
                write_colored(out, item, depth + 1);
                if i + 1 < items.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&close);
            out.push(']');
        }
        Value::String(_) => out.push_str(&value.to_string().green().to_string()),
        Value::Number(_) => out.push_str(&value.to_string().yellow().to_string()),
        Value::Bool(_) | Value::Null => out.push_str(&value.to_string().magenta().to_string()),
        Value::Object(_) | Value::Array(_) => out.push_str(&value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn print(options: PrintOptions, lines: &[(&str, &str)]) -> (String, Vec<bool>) {
        let mut printer = LinePrinter::new(Vec::new(), options);
        let printed = lines
            .iter()
            .map(|(name, line)| printer.handle_line(name, line.as_bytes()).unwrap())
            .collect();
        (String::from_utf8(printer.into_inner()).unwrap(), printed)
    }

    #[test]
    fn test_plain_lines_pass_through() {
        let (out, printed) = print(
            PrintOptions::default(),
            &[("a.log", "one\n"), ("a.log", "two")],
        );

        assert_eq!(out, "one\ntwo");
        assert_eq!(printed, vec![true, true]);
    }

    #[test]
    fn test_blank_lines_skipped_by_default() {
        let (out, printed) = print(
            PrintOptions::default(),
            &[("a.log", "one\n"), ("a.log", "\n"), ("a.log", "  \t\n")],
        );

        assert_eq!(out, "one\n");
        assert_eq!(printed, vec![true, false, false]);
    }

    #[test]
    fn test_with_blanks() {
        let options = PrintOptions {
            with_blanks: true,
            ..Default::default()
        };
        let (out, _) = print(options, &[("a.log", "one\n"), ("a.log", "\n")]);

        assert_eq!(out, "one\n\n");
    }

    #[test]
    fn test_with_filename() {
        let options = PrintOptions {
            with_filename: true,
            ..Default::default()
        };
        let (out, _) = print(options, &[("a-out.log", "hello\n"), ("b-out.log", "world\n")]);

        assert_eq!(out, "a-out.log: hello\nb-out.log: world\n");
    }

    #[test]
    fn test_with_filename_colored_keeps_text() {
        let options = PrintOptions {
            with_filename: true,
            color: true,
            ..Default::default()
        };
        let (out, _) = print(options, &[("a-out.log", "hello\n")]);

        assert!(out.contains("a-out.log"));
        assert!(out.ends_with(": hello\n"));
    }

    #[test]
    fn test_pretty_json() {
        let options = PrintOptions {
            pretty: true,
            ..Default::default()
        };
        let (out, _) = print(
            options,
            &[("a.log", "{\"level\":\"info\",\"msg\":\"up\"}\n"), ("a.log", "not json\n")],
        );

        assert_eq!(
            out,
            "{\n  \"level\": \"info\",\n  \"msg\": \"up\"\n}\nnot json\n"
        );
    }

    #[test]
    fn test_pretty_leaves_broken_json_alone() {
        let options = PrintOptions {
            pretty: true,
            ..Default::default()
        };
        let (out, _) = print(options, &[("a.log", "{\"unterminated\n")]);

        assert_eq!(out, "{\"unterminated\n");
    }

    #[test]
    fn test_non_utf8_bytes_pass_through() {
        let mut printer = LinePrinter::new(Vec::new(), PrintOptions::default());
        printer.handle_line("a.log", b"caf\xe9\n").unwrap();
        printer.handle_line("a.log", b"\x00\xff\xfe").unwrap();
        assert_eq!(printer.into_inner(), b"caf\xe9\n\x00\xff\xfe".to_vec());
    }

    #[test]
    fn test_non_utf8_bytes_pass_through_in_pretty_mode() {
        let options = PrintOptions {
            pretty: true,
            with_filename: true,
            ..Default::default()
        };
        let mut printer = LinePrinter::new(Vec::new(), options);
        printer.handle_line("a.log", b"{\"k\":\"\xe9\"}\n").unwrap();
        assert_eq!(printer.into_inner(), b"a.log: {\"k\":\"\xe9\"}\n".to_vec());
    }

    #[test]
    fn test_pretty_color_matches_plain_layout() {
        colored::control::set_override(true);
        let line = "{\"level\":\"info\",\"n\":3,\"ok\":true,\"tags\":[\"a\",null],\"empty\":{}}\n";
        let colored_options = PrintOptions {
            pretty: true,
            color: true,
            ..Default::default()
        };
        let (colored_out, _) = print(colored_options, &[("a.log", line)]);
        let plain_options = PrintOptions {
            pretty: true,
            ..Default::default()
        };
        let (plain_out, _) = print(plain_options, &[("a.log", line)]);

        assert!(colored_out.contains("\x1b["));
        assert_eq!(strip_ansi(&colored_out), plain_out);
    }

    fn strip_ansi(text: &str) -> String {
        let mut out = String::new();
        let mut chars = text.chars();
        while let Some(c) = chars.next() {
            if c == '\x1b' {
                for c in chars.by_ref() {
                    if c == 'm' {
                        break;
                    }
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    #[test]
    fn test_write_error_propagates() {
        struct Closed;

        impl Write for Closed {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::from(io::ErrorKind::BrokenPipe))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut printer = LinePrinter::new(Closed, PrintOptions::default());
        let err = printer.handle_line("a.log", b"x\n").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
