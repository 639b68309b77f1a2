//! Template source to IR parser
//!
//! Template syntax:
//!
//! ```text
//! <statement>                     literal text
//!   <acct>{field:10}</acct>       copy 10 characters from the input
//!   {repeat:12}                   repeat the enclosed directives 12 times
//!     <line>{field:8}</line>
//!   {end}
//!   {# a comment #}               dropped
//!   {{                            a literal `{`
//! </statement>
//! ```
//!
//! Whitespace is allowed inside the braces (`{ field : 10 }`). A `}` outside
//! a directive is literal text.

use std::path::Path;

use crate::error::{Error, ParseError, ParseErrorKind, Result};
use crate::ir::{Instruction, Program};

/// Longest token quoted back in an error
const MAX_TOKEN_LEN: usize = 32;

/// Parser for template sources
#[derive(Debug, Default)]
pub struct Parser;

impl Parser {
    /// Create a new parser
    pub fn new() -> Self {
        Self
    }

    /// Parse a template file into IR, naming the program after the file stem
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Program> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("template");
        self.parse(name, &source).map_err(Error::from)
    }

    /// Parse template source into IR
    pub fn parse(&self, name: &str, source: &str) -> std::result::Result<Program, ParseError> {
        let instructions = Scanner::new(source).run()?;
        tracing::debug!(
            template = name,
            instructions = instructions.len(),
            "parsed template"
        );
        Ok(Program {
            name: name.to_string(),
            instructions,
        })
    }
}

/// An open `{repeat:N}` waiting for its `{end}`
struct Group {
    count: u32,
    position: usize,
    token: String,
    body: Vec<Instruction>,
}

struct Scanner<'a> {
    source: &'a str,
    root: Vec<Instruction>,
    groups: Vec<Group>,
    literal: String,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            root: Vec::new(),
            groups: Vec::new(),
            literal: String::new(),
        }
    }

    fn run(mut self) -> std::result::Result<Vec<Instruction>, ParseError> {
        let source = self.source;
        let bytes = source.as_bytes();
        let mut finger = 0;

        while finger < bytes.len() {
            let next = match memchr::memchr(b'{', &bytes[finger..]) {
                Some(x) => finger + x,
                None => bytes.len(),
            };
            self.literal.push_str(&source[finger..next]);
            if next == bytes.len() {
                break;
            }

            finger = match bytes.get(next + 1) {
                Some(b'{') => {
                    self.literal.push('{');
                    next + 2
                }
                Some(b'#') => self.skip_comment(next)?,
                _ => self.directive(next)?,
            };
        }

        self.flush_literal();

        if let Some(group) = self.groups.pop() {
            return Err(self.error(
                group.position,
                group.token,
                ParseErrorKind::UnterminatedGroup,
            ));
        }

        Ok(self.root)
    }

    /// Returns the offset just past the closing `#}`.
    fn skip_comment(&self, open: usize) -> std::result::Result<usize, ParseError> {
        let body = &self.source[open + 2..];
        match body.find("#}") {
            Some(end) => Ok(open + 2 + end + 2),
            None => Err(self.error(
                open,
                truncate(&self.source[open..]),
                ParseErrorKind::UnterminatedComment,
            )),
        }
    }

    /// Parses the directive whose `{` is at `open` and returns the offset
    /// just past its `}`.
    fn directive(&mut self, open: usize) -> std::result::Result<usize, ParseError> {
        let source = self.source;
        let bytes = source.as_bytes();
        let rest = &bytes[open + 1..];
        // A directive never spans lines or contains another brace.
        let stop = memchr::memchr3(b'}', b'{', b'\n', rest);
        let close = match stop {
            Some(x) if rest[x] == b'}' => open + 1 + x,
            Some(x) => {
                return Err(self.error(
                    open,
                    truncate(&source[open..open + 1 + x]),
                    ParseErrorKind::UnterminatedDirective,
                ));
            }
            None => {
                return Err(self.error(
                    open,
                    truncate(&source[open..]),
                    ParseErrorKind::UnterminatedDirective,
                ));
            }
        };

        let token = &source[open..=close];
        let body = &source[open + 1..close];
        let (name, arg) = match body.split_once(':') {
            Some((name, arg)) => (name.trim(), Some(arg.trim())),
            None => (body.trim(), None),
        };

        match name {
            "field" => {
                let width = self.argument(open, token, arg)?;
                if width == 0 {
                    return Err(self.error(open, token.to_string(), ParseErrorKind::ZeroWidth));
                }
                self.flush_literal();
                self.current().push(Instruction::CopyField { width });
            }
            "repeat" => {
                let count = self.argument(open, token, arg)?;
                self.flush_literal();
                self.groups.push(Group {
                    count,
                    position: open,
                    token: token.to_string(),
                    body: Vec::new(),
                });
            }
            "end" => {
                if arg.is_some() {
                    return Err(self.error(
                        open,
                        token.to_string(),
                        ParseErrorKind::UnexpectedArgument,
                    ));
                }
                self.flush_literal();
                let group = self.groups.pop().ok_or_else(|| {
                    self.error(open, token.to_string(), ParseErrorKind::UnmatchedEnd)
                })?;
                self.current().push(Instruction::RepeatGroup {
                    count: group.count,
                    body: group.body,
                });
            }
            "" => {
                return Err(self.error(open, token.to_string(), ParseErrorKind::EmptyDirective));
            }
            _ => {
                return Err(self.error(
                    open,
                    token.to_string(),
                    ParseErrorKind::UnknownDirective,
                ));
            }
        }

        Ok(close + 1)
    }

    fn argument(
        &self,
        open: usize,
        token: &str,
        arg: Option<&str>,
    ) -> std::result::Result<u32, ParseError> {
        let arg = match arg {
            Some(arg) if !arg.is_empty() => arg,
            _ => {
                return Err(self.error(
                    open,
                    token.to_string(),
                    ParseErrorKind::MissingArgument,
                ));
            }
        };
        if !arg.bytes().all(|b| b.is_ascii_digit()) {
            return Err(self.error(
                open,
                token.to_string(),
                ParseErrorKind::InvalidArgument,
            ));
        }
        arg.parse()
            .map_err(|_| self.error(open, token.to_string(), ParseErrorKind::InvalidArgument))
    }

    fn current(&mut self) -> &mut Vec<Instruction> {
        match self.groups.last_mut() {
            Some(group) => &mut group.body,
            None => &mut self.root,
        }
    }

    fn flush_literal(&mut self) {
        if self.literal.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.literal);
        self.current().push(Instruction::Literal(text));
    }

    fn error(&self, position: usize, token: String, kind: ParseErrorKind) -> ParseError {
        let (line, column) = locate(self.source, position);
        ParseError {
            position,
            line,
            column,
            token,
            kind,
        }
    }
}

/// 1-based line and character column of a byte offset
fn locate(source: &str, position: usize) -> (usize, usize) {
    let before = &source[..position];
    let line = before.bytes().filter(|&b| b == b'\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

fn truncate(text: &str) -> String {
    match text.char_indices().nth(MAX_TOKEN_LEN) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(source: &str) -> std::result::Result<Vec<Instruction>, ParseError> {
        Parser::new().parse("test", source).map(|p| p.instructions)
    }

    fn lit(text: &str) -> Instruction {
        Instruction::Literal(text.to_string())
    }

    fn field(width: u32) -> Instruction {
        Instruction::CopyField { width }
    }

    #[test]
    fn test_parse_literal_only() {
        assert_eq!(parse("<a>plain</a>").unwrap(), vec![lit("<a>plain</a>")]);
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_fields() {
        let ir = parse("<id>{field:6}</id><n>{ field : 20 }</n>").unwrap();
        assert_eq!(
            ir,
            vec![
                lit("<id>"),
                field(6),
                lit("</id><n>"),
                field(20),
                lit("</n>"),
            ]
        );
    }

    #[test]
    fn test_adjacent_fields() {
        assert_eq!(
            parse("{field:1}{field:2}").unwrap(),
            vec![field(1), field(2)]
        );
    }

    #[test]
    fn test_parse_repeat_group() {
        let ir = parse("<r>{repeat:3}<i>{field:2}</i>{end}</r>").unwrap();
        assert_eq!(
            ir,
            vec![
                lit("<r>"),
                Instruction::RepeatGroup {
                    count: 3,
                    body: vec![lit("<i>"), field(2), lit("</i>")],
                },
                lit("</r>"),
            ]
        );
    }

    #[test]
    fn test_parse_nested_groups() {
        let ir = parse("{repeat:2}[{repeat:3}{field:1}{end}]{end}").unwrap();
        assert_eq!(
            ir,
            vec![Instruction::RepeatGroup {
                count: 2,
                body: vec![
                    lit("["),
                    Instruction::RepeatGroup {
                        count: 3,
                        body: vec![field(1)],
                    },
                    lit("]"),
                ],
            }]
        );
    }

    #[test]
    fn test_zero_count_group_is_allowed() {
        let ir = parse("{repeat:0}{field:5}{end}").unwrap();
        assert_eq!(
            ir,
            vec![Instruction::RepeatGroup {
                count: 0,
                body: vec![field(5)],
            }]
        );
    }

    #[test]
    fn test_escaped_brace_and_lone_close() {
        assert_eq!(parse("a{{b}c").unwrap(), vec![lit("a{b}c")]);
    }

    #[test]
    fn test_comment_merges_literals() {
        assert_eq!(
            parse("<a>{# header #}</a>").unwrap(),
            vec![lit("<a></a>")]
        );
    }

    #[test]
    fn test_comment_may_contain_braces() {
        assert_eq!(
            parse("x{# {field:1} #}y").unwrap(),
            vec![lit("xy")]
        );
    }

    #[test]
    fn test_non_ascii_literals() {
        assert_eq!(
            parse("<naïve>{field:1}</naïve>").unwrap(),
            vec![lit("<naïve>"), field(1), lit("</naïve>")]
        );
    }

    #[rstest]
    #[case("{field:3", ParseErrorKind::UnterminatedDirective)]
    #[case("{field:3\n}", ParseErrorKind::UnterminatedDirective)]
    #[case("{field:3 {field:2}", ParseErrorKind::UnterminatedDirective)]
    #[case("{}", ParseErrorKind::EmptyDirective)]
    #[case("{ }", ParseErrorKind::EmptyDirective)]
    #[case("{text:3}", ParseErrorKind::UnknownDirective)]
    #[case("{Field:3}", ParseErrorKind::UnknownDirective)]
    #[case("{field}", ParseErrorKind::MissingArgument)]
    #[case("{field:}", ParseErrorKind::MissingArgument)]
    #[case("{repeat}", ParseErrorKind::MissingArgument)]
    #[case("{field:abc}", ParseErrorKind::InvalidArgument)]
    #[case("{field:-1}", ParseErrorKind::InvalidArgument)]
    #[case("{field:+1}", ParseErrorKind::InvalidArgument)]
    #[case("{field:4294967296}", ParseErrorKind::InvalidArgument)]
    #[case("{field:0}", ParseErrorKind::ZeroWidth)]
    #[case("{end:1}", ParseErrorKind::UnexpectedArgument)]
    #[case("{end}", ParseErrorKind::UnmatchedEnd)]
    #[case("{repeat:2}{field:1}", ParseErrorKind::UnterminatedGroup)]
    #[case("{# never closed", ParseErrorKind::UnterminatedComment)]
    fn test_parse_errors(#[case] source: &str, #[case] kind: ParseErrorKind) {
        let err = parse(source).unwrap_err();
        assert_eq!(err.kind, kind);
        assert_eq!(err.position, 0);
        assert_eq!((err.line, err.column), (1, 1));
    }

    #[test]
    fn test_error_location() {
        let err = parse("<a>\n  <é>{bogus:1}</é>\n</a>").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnknownDirective);
        assert_eq!(err.token, "{bogus:1}");
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 6);
        assert_eq!(err.position, "<a>\n  <é>".len());
    }

    #[test]
    fn test_unterminated_group_points_at_innermost_open() {
        let err = parse("{repeat:2}{repeat:3}{field:1}{end}x{repeat:4}y").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedGroup);
        assert_eq!(err.token, "{repeat:4}");
        assert_eq!(err.position, 35);
    }

    #[test]
    fn test_long_token_is_truncated() {
        let source = format!("{{field:{}", "9".repeat(100));
        let err = parse(&source).unwrap_err();
        assert!(err.token.ends_with("..."));
        assert!(err.token.len() < 40);
    }

    #[test]
    fn test_error_display() {
        let err = parse("ab{end}").unwrap_err();
        assert_eq!(
            err.to_string(),
            "`end` without a matching `repeat` at line 1, column 3: `{end}`"
        );
    }

    #[test]
    fn test_parse_file_names_program() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoice.fwt");
        std::fs::write(&path, "<i>{field:2}</i>").unwrap();
        let program = Parser::new().parse_file(&path).unwrap();
        assert_eq!(program.name, "invoice");
        assert_eq!(program.field_count(), 1);
    }

    #[test]
    fn test_parse_file_missing() {
        let err = Parser::new().parse_file("/nonexistent/x.fwt").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
