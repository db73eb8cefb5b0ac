//! Log sanitization for patient inputs.
//!
//! The form handles clinical measurements. Log lines may carry them through
//! structured fields (`age=85`, `bmi=31.2`) or a serialized record
//! (`"HbA1c_level":7.1`). Everything written by the log subscriber passes
//! through [`SanitizingMakeWriter`], which replaces those values and a few
//! common identifier formats before they reach the sink.
//!
//! Keep sensitive values out of log calls in the first place; this is the
//! fallback.

use regex::Regex;
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

/// Cap on bytes sanitized per call. Overridable via
/// `DIABETES_RISK_SANITIZE_MAX_BYTES`.
const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

/// Names under which clinical values show up in log output.
const CLINICAL_KEYS: &str = r"gender|smoking_history|hypertension|heart_disease|age|bmi|hba1c|hba1c_level|HbA1c_level|glucose|blood_glucose_level";

struct Rule {
    regex: Regex,
    replacement: &'static str,
}

static RULES: OnceLock<Vec<Rule>> = OnceLock::new();

fn rules() -> &'static [Rule] {
    RULES.get_or_init(|| {
        let specs: Vec<(String, &'static str)> = vec![
            // key=value and key: value, quoted or bare (tracing fields, Debug output)
            (
                format!(r#"\b({CLINICAL_KEYS})(\s*[:=]\s*)("[^"]*"|[^\s,}})]+)"#),
                "${1}${2}[REDACTED]",
            ),
            // "key":value inside serialized JSON
            (
                format!(r#""({CLINICAL_KEYS})"(\s*:\s*)("[^"]*"|[^\s,}}]+)"#),
                "\"${1}\"${2}[REDACTED]",
            ),
            // UUIDs
            (
                r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}"
                    .to_string(),
                "[REDACTED-UUID]",
            ),
            // MRNs
            (r"\bMRN[:\s]?\d{6,10}\b".to_string(), "[REDACTED-MRN]"),
            // Emails
            (
                r"(?i)\b[a-z0-9._%+-]{1,64}@(?:[a-z0-9-]{1,63}\.)+[a-z]{2,}\b".to_string(),
                "[REDACTED-EMAIL]",
            ),
        ];

        specs
            .into_iter()
            .filter_map(|(pattern, replacement)| match Regex::new(&pattern) {
                Ok(regex) => Some(Rule { regex, replacement }),
                Err(e) => {
                    // Logging is not initialized yet when this runs; stderr is all we have.
                    eprintln!("sanitize: dropping invalid pattern {pattern:?}: {e}");
                    None
                }
            })
            .collect()
    })
}

fn max_sanitize_bytes() -> usize {
    std::env::var("DIABETES_RISK_SANITIZE_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_SANITIZE_MAX_BYTES)
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }
    let mut end = max_bytes;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

/// Replace clinical values and identifiers in `input`.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_sanitize_bytes())
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut out = prefix.to_string();
    for rule in rules() {
        if rule.regex.is_match(&out) {
            out = rule.regex.replace_all(&out, rule.replacement).into_owned();
        }
    }

    if truncated {
        out.push_str(" [TRUNCATED]");
    }
    out
}

/// A `tracing_subscriber` writer factory that sanitizes each formatted line.
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
pub struct SanitizingWriter<W: std::io::Write> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W: std::io::Write> SanitizingWriter<W> {
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

impl<W: std::io::Write> std::io::Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        // A line with no newline still gets written once it grows past the cap.
        if self.buffer.len() > max_sanitize_bytes().saturating_mul(2) {
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

impl<W: std::io::Write> Drop for SanitizingWriter<W> {
    fn drop(&mut self) {
        let _ = std::io::Write::flush(self);
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_redacts_structured_fields() {
        let line = r#"INFO submit: age=85 bmi=31.4 smoking_history="not current" advisory=true"#;
        let out = sanitize(line);
        assert!(!out.contains("85"));
        assert!(!out.contains("31.4"));
        assert!(!out.contains("not current"));
        assert!(out.contains("age=[REDACTED]"));
        assert!(out.contains("advisory=true"));
    }

    #[test]
    fn test_redacts_serialized_record() {
        let line = r#"record={"gender":"Male","age":85,"HbA1c_level":7.1,"blood_glucose_level":210.0}"#;
        let out = sanitize(line);
        assert!(!out.contains("Male"));
        assert!(!out.contains("7.1"));
        assert!(!out.contains("210.0"));
        assert!(out.contains(r#""HbA1c_level":[REDACTED]"#));
    }

    #[test]
    fn test_leaves_outcome_fields_alone() {
        let line = "INFO prediction complete: label=1 probability=0.8000";
        assert_eq!(sanitize(line), line);
    }

    #[test]
    fn test_redacts_identifiers() {
        let out = sanitize("patient 550e8400-e29b-41d4-a716-446655440000 MRN:12345678 a@b.org");
        assert!(out.contains("[REDACTED-UUID]"));
        assert!(out.contains("[REDACTED-MRN]"));
        assert!(out.contains("[REDACTED-EMAIL]"));
    }

    #[test]
    fn test_truncates_large_inputs() {
        let out = sanitize_with_limit("glucose=123.0 and then some more text", 10);
        assert!(out.ends_with("[TRUNCATED]"));
        assert!(!out.contains("123"));
    }

    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0
                .lock()
                .map_err(|_| std::io::Error::other("sink poisoned"))?
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for SharedSink {
        type Writer = SharedSink;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_writer_sanitizes_split_lines() {
        let sink = SharedSink::default();
        let make = SanitizingMakeWriter::new(sink.clone());
        {
            let mut writer = make.make_writer();
            writer.write_all(b"submit bmi=2").expect("write");
            writer.write_all(b"7.5 done\nnext line").expect("write");
        }

        let written = String::from_utf8(sink.0.lock().expect("lock").clone()).expect("utf8");
        assert_eq!(written, "submit bmi=[REDACTED] done\nnext line");
    }
}
