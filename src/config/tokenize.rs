//! Command and environment value tokenization.
//!
//! Two small dialects live here:
//!
//! - `command=` values: space-separated argv where a double-quoted run of
//!   tokens collapses into a single argument, and `%(NAME)s` references are
//!   substituted from the supervisor's environment before splitting.
//! - `environment=` values: comma-separated `KEY=VALUE` pairs, each value
//!   optionally double-quoted.

use std::sync::OnceLock;

use regex::{Captures, Regex};

fn envar_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"%\((.*?)\)s").expect("valid %(NAME)s pattern"))
}

/// Substitutes each `%(NAME)s` with the value of the environment variable
/// `NAME`; missing variables become the empty string.
fn substitute_envars(raw: &str) -> String {
    envar_pattern()
        .replace_all(raw, |caps: &Captures<'_>| {
            std::env::var(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}

/// Tokenizes a `command=` value.
///
/// Split on spaces; a token beginning with `"` opens a quoted run that is
/// concatenated (single-space separators) until a token ending in `"`, with
/// the outer quotes stripped. Empty tokens are discarded, and a quoted run
/// left open at the end of the value is dropped.
pub fn tokenize_command(raw: &str) -> Vec<String> {
    let substituted = substitute_envars(raw);
    let mut tokens = Vec::new();
    let mut quoted: Option<String> = None;

    for part in substituted.split(' ') {
        if part.is_empty() {
            continue;
        }
        match quoted.take() {
            None => {
                if let Some(rest) = part.strip_prefix('"') {
                    match rest.strip_suffix('"') {
                        Some(inner) => tokens.push(inner.to_string()),
                        None => quoted = Some(rest.to_string()),
                    }
                } else {
                    tokens.push(part.to_string());
                }
            }
            Some(mut acc) => match part.strip_suffix('"') {
                Some(body) => {
                    acc.push(' ');
                    acc.push_str(body);
                    tokens.push(acc);
                }
                None => {
                    acc.push(' ');
                    acc.push_str(part);
                    quoted = Some(acc);
                }
            },
        }
    }
    tokens
}

/// Parses a per-program `environment=` value into `KEY=VALUE` pairs.
///
/// The value splits on commas; entries without exactly one `=` are skipped.
/// A value wrapped in double quotes has both quotes stripped.
pub fn parse_environment(raw: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for entry in raw.split(',') {
        let fields: Vec<&str> = entry.split('=').collect();
        if fields.len() != 2 {
            continue;
        }
        let mut value = fields[1];
        if value.len() > 1 && value.starts_with('"') && value.ends_with('"') {
            value = &value[1..value.len() - 1];
        }
        pairs.push((fields[0].to_string(), value.to_string()));
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_plain_commands() {
        assert_eq!(tokenize_command("/bin/ls -l /tmp"), ["/bin/ls", "-l", "/tmp"]);
    }

    #[test]
    fn collapses_quoted_runs() {
        assert_eq!(
            tokenize_command(r#"bash -c "source x && y""#),
            ["bash", "-c", "source x && y"]
        );
    }

    #[test]
    fn quoted_python_one_liner() {
        assert_eq!(
            tokenize_command(r#"python -c "import sys; print(sys.argv)""#),
            ["python", "-c", "import sys; print(sys.argv)"]
        );
    }

    #[test]
    fn single_token_quote_closes_immediately() {
        assert_eq!(tokenize_command(r#"echo "x""#), ["echo", "x"]);
    }

    #[test]
    fn discards_empty_tokens() {
        assert_eq!(tokenize_command("a   b  c"), ["a", "b", "c"]);
    }

    #[test]
    fn drops_unterminated_quoted_run() {
        assert_eq!(tokenize_command(r#"echo "never closed"#), ["echo"]);
    }

    #[test]
    fn substitutes_environment_references() {
        std::env::set_var("PROCVISOR_TOKENIZE_TEST", "world");
        assert_eq!(
            tokenize_command("echo %(PROCVISOR_TOKENIZE_TEST)s"),
            ["echo", "world"]
        );
    }

    #[test]
    fn missing_environment_reference_becomes_empty() {
        assert_eq!(
            tokenize_command("echo %(PROCVISOR_TOKENIZE_UNSET)s"),
            ["echo"]
        );
    }

    #[test]
    fn parses_environment_pairs() {
        assert_eq!(
            parse_environment(r#"A=1,B="two words",C="#),
            [
                ("A".to_string(), "1".to_string()),
                ("B".to_string(), "two words".to_string()),
                ("C".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn skips_malformed_environment_entries() {
        assert_eq!(parse_environment("JUSTAKEY,A=B=C,X=1"), [("X".to_string(), "1".to_string())]);
    }
}
