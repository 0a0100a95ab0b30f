//! Canonical formatting pass.
//!
//! Runs after substitution so snippets typed on a command line and files
//! written by hand end up in the same style. It doubles as the first syntax
//! check: unbalanced brackets or unterminated literals surface here as
//! [`Error::Format`], before the compiler is ever invoked.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// Canonicalizes generated Go source.
pub trait SourceFormatter {
    /// Format `source`, rejecting text that is not well-formed.
    fn format(&self, source: &str) -> Result<String>;
}

/// Which formatter to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormatterChoice {
    /// `gofmt` when it is on `PATH`, the built-in formatter otherwise.
    #[default]
    Auto,
    /// Full syntax check and canonical layout.
    Gofmt,
    /// Lexical checks and re-indentation; see [`BuiltinFormatter`].
    Builtin,
}

/// Build the formatter for `choice`.
///
/// # Errors
/// Returns [`Error::Toolchain`] if `gofmt` was requested but not found.
pub fn formatter_for(choice: FormatterChoice) -> Result<Box<dyn SourceFormatter>> {
    match choice {
        FormatterChoice::Builtin => Ok(Box::new(BuiltinFormatter)),
        FormatterChoice::Gofmt => Ok(Box::new(Gofmt::find()?)),
        FormatterChoice::Auto => match Gofmt::find() {
            Ok(gofmt) => Ok(Box::new(gofmt)),
            Err(_) => {
                tracing::debug!("gofmt not found in PATH, using built-in formatter");
                Ok(Box::new(BuiltinFormatter))
            }
        },
    }
}

/// Formats through the `gofmt` binary.
#[derive(Debug, Clone)]
pub struct Gofmt {
    path: PathBuf,
}

impl Gofmt {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Find gofmt in PATH.
    pub fn find() -> Result<Self> {
        which::which("gofmt")
            .map(Self::new)
            .map_err(|_| Error::Toolchain("gofmt not found in PATH".to_string()))
    }
}

impl SourceFormatter for Gofmt {
    fn format(&self, source: &str) -> Result<String> {
        let mut child = Command::new(&self.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Toolchain(format!("Failed to run gofmt: {}", e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(source.as_bytes())?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Format(stderr.trim().to_string()));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| Error::Format(format!("gofmt produced invalid UTF-8: {}", e)))
    }
}

/// Dependency-free formatter covering the shapes skeletons produce.
///
/// Checks that brackets balance, literals and comments terminate, and no
/// assignment operator directly follows another, then re-indents every line
/// with tabs by bracket depth. Lines inside raw strings and block comments
/// are left untouched.
///
/// This is a lexical check only. Malformed statements it cannot see, such
/// as `x := 1 2`, reach the compiler and fail there.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinFormatter;

impl SourceFormatter for BuiltinFormatter {
    fn format(&self, source: &str) -> Result<String> {
        let lines = scan(source)?;
        Ok(render(&lines))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lex {
    Code,
    LineComment,
    BlockComment,
    Str,
    Rune,
    Raw,
}

impl Lex {
    /// States whose content spans lines and must be kept byte-for-byte.
    fn is_multiline(self) -> bool {
        matches!(self, Lex::BlockComment | Lex::Raw)
    }
}

#[derive(Debug)]
struct ScannedLine<'a> {
    text: &'a str,
    depth: usize,
    leading_closers: usize,
    starts_verbatim: bool,
    ends_verbatim: bool,
}

fn scan(source: &str) -> Result<Vec<ScannedLine<'_>>> {
    let mut lines = Vec::new();
    let mut stack: Vec<(char, usize)> = Vec::new();
    let mut state = Lex::Code;

    for (idx, text) in source.lines().enumerate() {
        let line_no = idx + 1;
        let starts_verbatim = state.is_multiline();
        let depth = stack.len();
        let mut leading_closers = 0;
        let mut at_line_start = !starts_verbatim;
        let mut prev_assign = false;

        let mut chars = text.char_indices().peekable();
        while let Some((pos, c)) = chars.next() {
            match state {
                Lex::Code => {
                    if at_line_start && !c.is_whitespace() && !is_closer(c) {
                        at_line_start = false;
                    }
                    let rest = &text[pos..];
                    match c {
                        '/' if rest.starts_with("//") => {
                            chars.next();
                            state = Lex::LineComment;
                        }
                        '/' if rest.starts_with("/*") => {
                            chars.next();
                            state = Lex::BlockComment;
                        }
                        '"' => state = Lex::Str,
                        '\'' => state = Lex::Rune,
                        '`' => state = Lex::Raw,
                        '(' | '[' | '{' => stack.push((c, line_no)),
                        ')' | ']' | '}' => {
                            match stack.pop() {
                                Some((open, _)) if matches_closer(open, c) => {}
                                Some((open, open_line)) => {
                                    return Err(Error::Format(format!(
                                        "line {}: '{}' does not close '{}' opened at line {}",
                                        line_no, c, open, open_line
                                    )));
                                }
                                None => {
                                    return Err(Error::Format(format!(
                                        "line {}: unexpected '{}'",
                                        line_no, c
                                    )));
                                }
                            }
                            if at_line_start {
                                leading_closers += 1;
                            }
                        }
                        _ => {}
                    }

                    if c.is_whitespace() || matches!(state, Lex::LineComment | Lex::BlockComment) {
                        continue;
                    }

                    let op = operator_at(rest);
                    let assign = op.is_some_and(is_assignment);
                    if let Some(op) = op {
                        if assign && prev_assign {
                            return Err(Error::Format(format!(
                                "line {}: unexpected '{}'",
                                line_no, op
                            )));
                        }
                        for _ in 1..op.len() {
                            chars.next();
                        }
                    }
                    prev_assign = assign;
                }
                Lex::LineComment => {}
                Lex::BlockComment => {
                    if c == '*' && chars.peek().is_some_and(|&(_, next)| next == '/') {
                        chars.next();
                        state = Lex::Code;
                    }
                }
                Lex::Str | Lex::Rune => {
                    let quote = if state == Lex::Str { '"' } else { '\'' };
                    if c == '\\' {
                        chars.next();
                    } else if c == quote {
                        state = Lex::Code;
                    }
                }
                Lex::Raw => {
                    if c == '`' {
                        state = Lex::Code;
                    }
                }
            }
        }

        match state {
            Lex::LineComment => state = Lex::Code,
            Lex::Str => {
                return Err(Error::Format(format!("line {}: newline in string", line_no)));
            }
            Lex::Rune => {
                return Err(Error::Format(format!("line {}: newline in rune literal", line_no)));
            }
            _ => {}
        }

        lines.push(ScannedLine {
            text,
            depth,
            leading_closers,
            starts_verbatim,
            ends_verbatim: state.is_multiline(),
        });
    }

    match state {
        Lex::BlockComment => return Err(Error::Format("comment not terminated".to_string())),
        Lex::Raw => return Err(Error::Format("raw string literal not terminated".to_string())),
        _ => {}
    }

    if let Some((open, line)) = stack.last() {
        return Err(Error::Format(format!(
            "'{}' opened at line {} is never closed",
            open, line
        )));
    }

    Ok(lines)
}

/// Multi-character Go operators, longest first.
const OPERATORS: &[&str] = &[
    "&^=", "<<=", ">>=", "...", ":=", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "==", "!=",
    "<=", ">=", "&&", "||", "<-", "++", "--", "<<", ">>", "&^",
];

/// The operator starting `rest`, if it is one the scanner tracks.
fn operator_at(rest: &str) -> Option<&'static str> {
    OPERATORS
        .iter()
        .copied()
        .find(|op| rest.starts_with(op))
        .or_else(|| rest.starts_with('=').then_some("="))
}

fn is_assignment(op: &str) -> bool {
    op.ends_with('=') && !matches!(op, "==" | "!=" | "<=" | ">=")
}

fn is_closer(c: char) -> bool {
    matches!(c, ')' | ']' | '}')
}

fn matches_closer(open: char, close: char) -> bool {
    matches!((open, close), ('(', ')') | ('[', ']') | ('{', '}'))
}

fn render(lines: &[ScannedLine<'_>]) -> String {
    let mut out: Vec<String> = Vec::new();

    for line in lines {
        if line.starts_verbatim {
            out.push(line.text.to_string());
            continue;
        }

        let body = if line.ends_verbatim {
            line.text.trim_start()
        } else {
            line.text.trim()
        };

        if body.is_empty() {
            // No blank lines at the top of the file or of a block.
            let skip = out
                .last()
                .is_none_or(|prev| prev.is_empty() || prev.ends_with(['{', '(']));
            if !skip {
                out.push(String::new());
            }
            continue;
        }

        if body.starts_with(is_closer) && out.last().is_some_and(|prev| prev.is_empty()) {
            out.pop();
        }

        if body == ")" {
            if let Some(prev) = out.last_mut() {
                if prev.ends_with('(') {
                    prev.push(')');
                    continue;
                }
            }
        }

        let mut indent = line.depth.saturating_sub(line.leading_closers);
        if body.starts_with("case ") || body == "default:" {
            indent = indent.saturating_sub(1);
        }

        out.push(format!("{}{}", "\t".repeat(indent), body));
    }

    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }

    let mut formatted = out.join("\n");
    formatted.push('\n');
    formatted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(source: &str) -> Result<String> {
        BuiltinFormatter.format(source)
    }

    #[test]
    fn test_reindents_body() {
        let source = "package main\n\nimport ( \n\t\"fmt\"\n)\n\nfunc main() {\n\tfor i := 0; i < 3; i++ {\nfmt.Println(i)   \n}\n}\n";
        assert_eq!(
            fmt(source).unwrap(),
            "package main\n\nimport (\n\t\"fmt\"\n)\n\nfunc main() {\n\tfor i := 0; i < 3; i++ {\n\t\tfmt.Println(i)\n\t}\n}\n"
        );
    }

    #[test]
    fn test_empty_skeleton_is_formattable() {
        let source = "package main\n\nimport ( \n)\n\nfunc main() {\n\t\n}\n";
        assert_eq!(
            fmt(source).unwrap(),
            "package main\n\nimport ()\n\nfunc main() {\n}\n"
        );
    }

    #[test]
    fn test_switch_cases_outdented() {
        let source = "func f(x int) {\nswitch x {\ncase 1:\nreturn\ndefault:\n}\n}";
        assert_eq!(
            fmt(source).unwrap(),
            "func f(x int) {\n\tswitch x {\n\tcase 1:\n\t\treturn\n\tdefault:\n\t}\n}\n"
        );
    }

    #[test]
    fn test_brackets_in_literals_and_comments_ignored() {
        let source = "func main() {\ns := \"{(\" // )}\nr := '}'\n/* { */\n_ = s\n_ = r\n}";
        assert!(fmt(source).is_ok());
    }

    #[test]
    fn test_raw_string_kept_verbatim() {
        let source = "func main() {\nx := `line one  \n   line two`\n_ = x\n}";
        assert_eq!(
            fmt(source).unwrap(),
            "func main() {\n\tx := `line one  \n   line two`\n\t_ = x\n}\n"
        );
    }

    #[test]
    fn test_collapses_blank_runs() {
        let source = "package main\n\n\n\nfunc main() {\n}\n\n\n";
        assert_eq!(fmt(source).unwrap(), "package main\n\nfunc main() {\n}\n");
    }

    #[test]
    fn test_unclosed_brace() {
        let err = fmt("func main() {\n\tfmt.Println(\"x\"\n}").unwrap_err();
        assert!(matches!(err, Error::Format(_)));
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_unexpected_closer() {
        let err = fmt("func main() {\n}\n}").unwrap_err();
        assert!(err.to_string().contains("unexpected '}'"));
    }

    #[test]
    fn test_unterminated_string() {
        let err = fmt("func main() {\n\tx := \"abc\n}").unwrap_err();
        assert!(err.to_string().contains("newline in string"));
    }

    #[test]
    fn test_unterminated_raw_string() {
        assert!(fmt("func main() {\n\tx := `abc\n}").is_err());
    }

    #[test]
    fn test_escaped_quote_in_string() {
        assert!(fmt("func main() {\n\tx := \"a\\\"{\"\n\t_ = x\n}").is_ok());
    }

    #[test]
    fn test_doubled_assignment_rejected() {
        let err = fmt("func main() {\n\tx := := 1\n}").unwrap_err();
        assert!(matches!(err, Error::Format(_)));
        assert!(err.to_string().contains("line 2: unexpected ':='"));

        assert!(fmt("func main() {\n\tx = += 1\n}").is_err());
    }

    #[test]
    fn test_operator_sequences_accepted() {
        let source = "func main() {\n\tx := -1\n\ty:=-x\n\tok := x == y\n\tx /= 2\n\tv, more := <-ch\n\tx <<= 1\n\t_, _ = ok, v\n\t_ = more\n}";
        assert!(fmt(source).is_ok());
    }

    #[test]
    fn test_builtin_choice() {
        let formatter = formatter_for(FormatterChoice::Builtin).unwrap();
        assert_eq!(formatter.format("package main").unwrap(), "package main\n");
    }
}
