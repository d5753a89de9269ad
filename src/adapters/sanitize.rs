//! Log redaction for identifying patient data.
//!
//! Server error bodies and request traces can echo what the clinician typed:
//! dates of birth, contact details, free-text notes. Every formatted log line
//! passes through [`SanitizingMakeWriter`], which rewrites the known patterns
//! before the line reaches the log file.
//!
//! Input longer than [`MAX_LINE_BYTES`] is cut at a character boundary and
//! marked `[TRUNCATED]`.

use std::io::Write;
use std::sync::OnceLock;

use regex::{Regex, RegexSet};
use tracing_subscriber::fmt::MakeWriter;

/// Longest log line that is redacted in full.
pub const MAX_LINE_BYTES: usize = 16 * 1024;

struct Rule {
    regex: Regex,
    replacement: &'static str,
}

struct Rules {
    any: RegexSet,
    rules: Vec<Rule>,
}

static RULES: OnceLock<Rules> = OnceLock::new();

const RULE_SOURCES: &[(&str, &str)] = &[
    // "date_of_birth": "1985-03-15" in JSON bodies, date_of_birth=1985-03-15 in traces
    (
        r#"(?i)("?date_of_birth"?\s*[:=]\s*"?)\d{4}-\d{2}-\d{2}"#,
        "${1}[REDACTED-DOB]",
    ),
    // Free-text fields that carry clinical narrative
    (
        r#"(?i)("(?:details|result_text|rationale|note)"\s*:\s*")(?:[^"\\]|\\.)*""#,
        "${1}[REDACTED-TEXT]\"",
    ),
    (
        r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
        "[REDACTED-EMAIL]",
    ),
    (r"\+\d[\d\s().-]{8,}\d", "[REDACTED-PHONE]"),
    (r"(?i)\bbearer\s+[A-Za-z0-9._~+/-]{16,}=*", "Bearer [REDACTED-TOKEN]"),
    (
        r"(?i)\b(api[_-]?key|token|secret|password)\b\s*[:=]\s*\S{8,}",
        "${1}=[REDACTED-SECRET]",
    ),
];

fn rules() -> &'static Rules {
    RULES.get_or_init(|| {
        let rules: Vec<Rule> = RULE_SOURCES
            .iter()
            .filter_map(|(pattern, replacement)| match Regex::new(pattern) {
                Ok(regex) => Some(Rule {
                    regex,
                    replacement,
                }),
                Err(e) => {
                    eprintln!("log sanitizer: skipping invalid pattern {pattern}: {e}");
                    None
                }
            })
            .collect();
        let any = RegexSet::new(rules.iter().map(|r| r.regex.as_str()))
            .unwrap_or_else(|_| RegexSet::empty());
        Rules { any, rules }
    })
}

fn clip(input: &str, max_bytes: usize) -> Option<&str> {
    if input.len() <= max_bytes {
        return None;
    }
    let end = (0..=max_bytes)
        .rev()
        .find(|&i| input.is_char_boundary(i))
        .unwrap_or(0);
    Some(&input[..end])
}

/// Redact identifying data from `input`.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, MAX_LINE_BYTES)
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let rules = rules();
    let clipped = clip(input, max_bytes);
    let text = clipped.unwrap_or(input);

    let mut out = rules
        .any
        .matches(text)
        .into_iter()
        .fold(text.to_string(), |acc, idx| {
            let rule = &rules.rules[idx];
            rule.regex.replace_all(&acc, rule.replacement).into_owned()
        });

    if clipped.is_some() {
        out.push_str(" [TRUNCATED]");
    }
    out
}

/// Writer factory for `tracing_subscriber::fmt` that sanitizes each line.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

/// Line-buffering writer produced by [`SanitizingMakeWriter`].
pub struct SanitizingWriter<W: Write> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W: Write> SanitizingWriter<W> {
    fn write_sanitized(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let text = String::from_utf8_lossy(bytes);
        self.inner.write_all(sanitize(&text).as_bytes())
    }

    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.write_sanitized(&line)?;
        }
        Ok(())
    }
}

impl<W: Write> Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        // A line without newline that outgrows the cap is flushed as-is.
        if self.buffer.len() > MAX_LINE_BYTES * 2 {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
            self.inner.write_all(b"\n")?;
            return Ok(buf.len());
        }

        self.flush_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;
        if !self.buffer.is_empty() {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
        }
        self.inner.flush()
    }
}

impl<W: Write> Drop for SanitizingWriter<W> {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter {
            inner: self.inner.make_writer(),
            buffer: Vec::new(),
        }
    }
}
