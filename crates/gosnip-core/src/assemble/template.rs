//! Fill-in skeleton engine.
//!
//! Skeletons use the Go text/template action syntax, restricted to what a
//! program skeleton needs:
//!
//! ```text
//! {{.Code}}                         print a field
//! {{range .Imports}}{{.}}{{end}}    iterate a list, `.` is the element
//! {{if .Imports}}…{{else}}…{{end}}  branch on emptiness
//! {{/* comment */}}                 ignored
//! {{- .Code -}}                     trim surrounding whitespace
//! ```

use crate::error::{Error, Result};

/// Values substituted into the skeleton.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateData {
    /// Rendered import declarations, one per line of the import block.
    pub imports: Vec<String>,

    /// Body of the entry-point function, verbatim.
    pub code: String,
}

impl TemplateData {
    fn field(&self, name: &str) -> Option<Value<'_>> {
        match name {
            "Imports" => Some(Value::List(&self.imports)),
            "Code" => Some(Value::Str(&self.code)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Value<'a> {
    Data(&'a TemplateData),
    Str(&'a str),
    List(&'a [String]),
}

impl Value<'_> {
    fn is_truthy(&self) -> bool {
        match self {
            Value::Data(_) => true,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Data(_) => "data",
            Value::Str(_) => "string",
            Value::List(_) => "list",
        }
    }

    fn write_to(&self, out: &mut String) {
        match self {
            Value::Str(s) => out.push_str(s),
            Value::List(items) => {
                out.push('[');
                out.push_str(&items.join(" "));
                out.push(']');
            }
            Value::Data(data) => {
                out.push('{');
                Value::List(&data.imports).write_to(out);
                out.push(' ');
                out.push_str(&data.code);
                out.push('}');
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pipeline {
    Dot,
    Field(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Text(String),
    Print {
        pipe: Pipeline,
        line: usize,
    },
    Range {
        pipe: Pipeline,
        line: usize,
        body: Vec<Node>,
        else_body: Vec<Node>,
    },
    If {
        pipe: Pipeline,
        line: usize,
        body: Vec<Node>,
        else_body: Vec<Node>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Text(String),
    Action { body: String, line: usize },
}

/// What closed a list of nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Closer {
    Eof,
    End(usize),
    Else(usize),
}

/// A parsed skeleton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    /// Parse skeleton text.
    ///
    /// # Errors
    /// Returns [`Error::Template`] for unterminated actions, unsupported
    /// actions, or unbalanced `range`/`if`/`else`/`end`.
    pub fn parse(source: &str) -> Result<Self> {
        let tokens = lex(source)?;
        let mut parser = Parser { tokens, pos: 0 };

        let (nodes, closer) = parser.parse_list()?;
        match closer {
            Closer::Eof => Ok(Self { nodes }),
            Closer::End(line) => Err(Error::template(line, "unexpected {{end}}")),
            Closer::Else(line) => Err(Error::template(line, "unexpected {{else}}")),
        }
    }

    /// Execute the skeleton against `data`.
    ///
    /// # Errors
    /// Returns [`Error::Template`] for unknown fields or ranging over a
    /// value that is not a list.
    pub fn render(&self, data: &TemplateData) -> Result<String> {
        let mut out = String::new();
        exec_list(&self.nodes, Value::Data(data), &mut out)?;
        Ok(out)
    }
}

fn lex(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut rest = source;
    let mut line = 1;
    let mut trim_next = false;

    while let Some(start) = rest.find("{{") {
        let mut text = &rest[..start];
        if trim_next {
            text = text.trim_start();
        }
        let after_open = &rest[start + 2..];

        let trim_prev = starts_with_trim_marker(after_open);
        if trim_prev {
            text = text.trim_end();
        }
        if !text.is_empty() {
            tokens.push(Token::Text(text.to_string()));
        }

        line += rest[..start].matches('\n').count();
        let inner = if trim_prev { &after_open[1..] } else { after_open };

        let Some(close) = find_action_end(inner) else {
            return Err(Error::template(line, "unclosed action"));
        };
        let raw = &inner[..close];
        trim_next = raw.ends_with(" -") || raw.ends_with("\t-") || raw.ends_with("\n-");
        let body = if trim_next { &raw[..raw.len() - 1] } else { raw };

        tokens.push(Token::Action {
            body: body.trim().to_string(),
            line,
        });

        line += raw.matches('\n').count();
        rest = &inner[close + 2..];
    }

    let text = if trim_next { rest.trim_start() } else { rest };
    if !text.is_empty() {
        tokens.push(Token::Text(text.to_string()));
    }

    Ok(tokens)
}

fn starts_with_trim_marker(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next() == Some('-') && chars.next().is_some_and(char::is_whitespace)
}

/// Offset of the `}}` closing an action, skipping over a comment body.
fn find_action_end(inner: &str) -> Option<usize> {
    let trimmed = inner.trim_start();
    if trimmed.starts_with("/*") {
        let comment_start = inner.len() - trimmed.len();
        let comment_end = trimmed.find("*/")? + comment_start + 2;
        return inner[comment_end..].find("}}").map(|i| i + comment_end);
    }
    inner.find("}}")
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn parse_list(&mut self) -> Result<(Vec<Node>, Closer)> {
        let mut nodes = Vec::new();

        while let Some(token) = self.tokens.get(self.pos).cloned() {
            self.pos += 1;

            let (body, line) = match token {
                Token::Text(text) => {
                    nodes.push(Node::Text(text));
                    continue;
                }
                Token::Action { body, line } => (body, line),
            };

            if body.starts_with("/*") {
                continue;
            }

            match body.as_str() {
                "end" => return Ok((nodes, Closer::End(line))),
                "else" => return Ok((nodes, Closer::Else(line))),
                _ => {}
            }

            if let Some(arg) = keyword_arg(&body, "range") {
                let pipe = parse_pipeline(arg, line)?;
                let (body, else_body) = self.parse_block("range", line)?;
                nodes.push(Node::Range {
                    pipe,
                    line,
                    body,
                    else_body,
                });
            } else if let Some(arg) = keyword_arg(&body, "if") {
                let pipe = parse_pipeline(arg, line)?;
                let (body, else_body) = self.parse_block("if", line)?;
                nodes.push(Node::If {
                    pipe,
                    line,
                    body,
                    else_body,
                });
            } else {
                let pipe = parse_pipeline(&body, line)?;
                nodes.push(Node::Print { pipe, line });
            }
        }

        Ok((nodes, Closer::Eof))
    }

    /// Body and optional else branch of a `range`/`if` opened at `line`.
    fn parse_block(&mut self, keyword: &str, line: usize) -> Result<(Vec<Node>, Vec<Node>)> {
        let (body, closer) = self.parse_list()?;
        match closer {
            Closer::End(_) => Ok((body, Vec::new())),
            Closer::Else(else_line) => {
                let (else_body, closer) = self.parse_list()?;
                match closer {
                    Closer::End(_) => Ok((body, else_body)),
                    Closer::Else(l) => Err(Error::template(l, "second {{else}} in block")),
                    Closer::Eof => Err(Error::template(
                        else_line,
                        format!("unterminated {{{{{}}}}}", keyword),
                    )),
                }
            }
            Closer::Eof => Err(Error::template(
                line,
                format!("unterminated {{{{{}}}}}", keyword),
            )),
        }
    }
}

fn keyword_arg<'a>(body: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = body.strip_prefix(keyword)?;
    rest.starts_with(char::is_whitespace).then(|| rest.trim())
}

fn parse_pipeline(text: &str, line: usize) -> Result<Pipeline> {
    if text == "." {
        return Ok(Pipeline::Dot);
    }

    if let Some(name) = text.strip_prefix('.') {
        let valid = name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if valid {
            return Ok(Pipeline::Field(name.to_string()));
        }
    }

    Err(Error::template(line, format!("unsupported action {{{{{}}}}}", text)))
}

fn eval<'a>(pipe: &Pipeline, dot: Value<'a>, line: usize) -> Result<Value<'a>> {
    match pipe {
        Pipeline::Dot => Ok(dot),
        Pipeline::Field(name) => match dot {
            Value::Data(data) => data.field(name).ok_or_else(|| {
                Error::template(line, format!("can't evaluate field {} in template data", name))
            }),
            other => Err(Error::template(
                line,
                format!("can't evaluate field {} in type {}", name, other.type_name()),
            )),
        },
    }
}

fn exec_list(nodes: &[Node], dot: Value<'_>, out: &mut String) -> Result<()> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Print { pipe, line } => eval(pipe, dot, *line)?.write_to(out),
            Node::Range {
                pipe,
                line,
                body,
                else_body,
            } => match eval(pipe, dot, *line)? {
                Value::List(items) if items.is_empty() => exec_list(else_body, dot, out)?,
                Value::List(items) => {
                    for item in items {
                        exec_list(body, Value::Str(item), out)?;
                    }
                }
                other => {
                    return Err(Error::template(
                        *line,
                        format!("range can't iterate over {}", other.type_name()),
                    ));
                }
            },
            Node::If {
                pipe,
                line,
                body,
                else_body,
            } => {
                if eval(pipe, dot, *line)?.is_truthy() {
                    exec_list(body, dot, out)?;
                } else {
                    exec_list(else_body, dot, out)?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(imports: &[&str], code: &str) -> TemplateData {
        TemplateData {
            imports: imports.iter().map(|s| s.to_string()).collect(),
            code: code.to_string(),
        }
    }

    fn render(template: &str, data: &TemplateData) -> Result<String> {
        Template::parse(template)?.render(data)
    }

    #[test]
    fn test_default_skeleton() {
        let out = render(
            super::super::DEFAULT_TEMPLATE,
            &data(&[r#""fmt""#, r#"re "regexp""#], "fmt.Println(1)"),
        )
        .unwrap();

        assert_eq!(
            out,
            "package main\n\nimport ( \n\t\"fmt\"\n\tre \"regexp\"\n)\n\nfunc main() {\n\tfmt.Println(1)\n}\n"
        );
    }

    #[test]
    fn test_range_else() {
        let template = "{{range .Imports}}[{{.}}]{{else}}none{{end}}";
        assert_eq!(render(template, &data(&[], "")).unwrap(), "none");
        assert_eq!(render(template, &data(&["a", "b"], "")).unwrap(), "[a][b]");
    }

    #[test]
    fn test_if_on_code() {
        let template = "{{if .Code}}has code{{else}}empty{{end}}";
        assert_eq!(render(template, &data(&[], "x")).unwrap(), "has code");
        assert_eq!(render(template, &data(&[], "")).unwrap(), "empty");
    }

    #[test]
    fn test_trim_markers_and_comments() {
        let template = "a  {{- /* note */ -}}  b {{- .Code }}";
        assert_eq!(render(template, &data(&[], "!")).unwrap(), "ab!");
    }

    #[test]
    fn test_comment_containing_braces() {
        let template = "{{/* }} inside */}}x";
        assert_eq!(render(template, &data(&[], "")).unwrap(), "x");
    }

    #[test]
    fn test_unclosed_action() {
        let err = Template::parse("line1\n{{.Code").unwrap_err();
        assert!(matches!(err, Error::Template { line: Some(2), .. }));
    }

    #[test]
    fn test_unbalanced_blocks() {
        assert!(Template::parse("{{range .Imports}}x").is_err());
        assert!(Template::parse("x{{end}}").is_err());
        assert!(Template::parse("{{if .Code}}{{else}}{{else}}{{end}}").is_err());
    }

    #[test]
    fn test_unsupported_action() {
        let err = Template::parse("{{printf \"%s\" .Code}}").unwrap_err();
        assert!(err.to_string().contains("unsupported action"));
    }

    #[test]
    fn test_unknown_field_fails_at_render() {
        let template = Template::parse("{{.Name}}").unwrap();
        let err = template.render(&data(&[], "")).unwrap_err();
        assert!(err.to_string().contains("can't evaluate field Name"));
    }

    #[test]
    fn test_range_over_string_fails() {
        let template = Template::parse("{{range .Code}}{{end}}").unwrap();
        assert!(template.render(&data(&[], "x")).is_err());
    }

    #[test]
    fn test_field_on_element_fails() {
        let template = Template::parse("{{range .Imports}}{{.Path}}{{end}}").unwrap();
        let err = template.render(&data(&["a"], "")).unwrap_err();
        assert!(err.to_string().contains("in type string"));
    }
}
