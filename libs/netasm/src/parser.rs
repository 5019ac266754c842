//! Program parser.

use std::fmt::Display;

use arcstr::ArcStr;
use chipdef::Position;
use diagnostics::{Diagnostic, IssueSet, Severity};
use nom::bytes::complete::{take_till, take_while};
use serde::{Deserialize, Serialize};
use tracing::{span, Level};

use crate::{InstanceDecl, Program, Statement, WireDecl, WirePins, WIRE};

/// Parses programs.
#[derive(Clone, Default, Debug)]
pub struct Parser {
    program: Program,
    issues: IssueSet<ParseIssue>,
    line: usize,
}

/// The output of [`Parser::parse`].
#[derive(Clone, Default, Debug)]
pub struct ParsedProgram {
    /// The statements that parsed successfully.
    pub program: Program,
    /// The lines that were skipped or partially understood.
    pub issues: IssueSet<ParseIssue>,
}

/// An issue identified while parsing a program.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct ParseIssue {
    line: usize,
    cause: Cause,
    severity: Severity,
}

/// The cause of a [`ParseIssue`].
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Cause {
    /// A line had too few tokens to form any statement. The line was skipped.
    TooFewTokens {
        /// The offending line.
        text: ArcStr,
    },
    /// An instantiation had coordinates that were missing or not integers.
    /// The instance was created without a position.
    InvalidCoordinates {
        /// The offending line.
        text: ArcStr,
    },
}

impl ParseIssue {
    /// Creates a new parse issue and logs it immediately.
    pub(crate) fn new_and_log(line: usize, cause: Cause, severity: Severity) -> Self {
        let result = Self {
            line,
            cause,
            severity,
        };
        diagnostics::log_issue(&result);
        result
    }

    /// The 1-based line number of the issue.
    #[inline]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Gets the underlying cause of this issue.
    #[inline]
    pub fn cause(&self) -> &Cause {
        &self.cause
    }
}

impl Diagnostic for ParseIssue {
    fn severity(&self) -> Severity {
        self.severity
    }
}

impl Display for ParseIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.cause)
    }
}

impl Display for Cause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooFewTokens { text } => {
                write!(f, "skipped line `{text}`: too few tokens")
            }
            Self::InvalidCoordinates { text } => write!(
                f,
                "invalid coordinates in `{text}`: expected two integers; the instance has no position"
            ),
        }
    }
}

impl Parser {
    /// Parses the given program source.
    ///
    /// Parsing never fails. Lines that cannot be understood are skipped
    /// and reported in [`ParsedProgram::issues`].
    pub fn parse(src: &str) -> ParsedProgram {
        let _guard = span!(Level::INFO, "parsing program").entered();
        let mut parser = Self::default();
        for line in src.lines() {
            parser.line += 1;
            parser.parse_line(line);
        }
        tracing::debug!(
            statements = parser.program.statements.len(),
            issues = parser.issues.len(),
            "parsed program"
        );
        ParsedProgram {
            program: parser.program,
            issues: parser.issues,
        }
    }

    fn parse_line(&mut self, line: &str) {
        let tokens = Tokenizer::new(line).collect::<Vec<_>>();
        match tokens.as_slice() {
            [] => (),
            [_] => self.issue(Cause::TooFewTokens { text: line.into() }),
            [keyword, rest @ ..] if keyword.eq_ignore_ascii_case(WIRE) => {
                self.parse_wire(line, rest)
            }
            [chip, id, coords @ ..] => self.parse_instance(line, chip, id, coords),
        }
    }

    fn parse_wire(&mut self, line: &str, args: &[&str]) {
        let (from, to, pins) = match args {
            [] | [_] => {
                self.issue(Cause::TooFewTokens { text: line.into() });
                return;
            }
            [from, to] => (from, to, WirePins::Implicit),
            [from, to, pin] => (from, to, WirePins::Ambiguous((*pin).into())),
            [from, to, from_pin, to_pin, ..] => (
                from,
                to,
                WirePins::Both {
                    from_pin: (*from_pin).into(),
                    to_pin: (*to_pin).into(),
                },
            ),
        };
        self.program.statements.push(Statement::Wire(WireDecl {
            from: (*from).into(),
            to: (*to).into(),
            pins,
        }));
    }

    fn parse_instance(&mut self, line: &str, chip: &str, id: &str, coords: &[&str]) {
        let position = match coords {
            [] => None,
            [x, y, ..] => match (x.parse::<i64>(), y.parse::<i64>()) {
                (Ok(x), Ok(y)) => Some(Position::new(x, y)),
                _ => None,
            },
            [_] => None,
        };
        if !coords.is_empty() && position.is_none() {
            self.issue(Cause::InvalidCoordinates { text: line.into() });
        }
        self.program.statements.push(Statement::Instance(InstanceDecl {
            chip: chip.to_ascii_uppercase().into(),
            id: id.into(),
            position,
        }));
    }

    fn issue(&mut self, cause: Cause) {
        self.issues
            .add(ParseIssue::new_and_log(self.line, cause, Severity::Info));
    }
}

/// Splits a single line into whitespace-separated tokens.
struct Tokenizer<'a> {
    rem: &'a str,
}

impl<'a> Tokenizer<'a> {
    fn new(line: &'a str) -> Self {
        Self { rem: line }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let (rem, _) = take_while::<_, _, ()>(char::is_whitespace)(self.rem).ok()?;
        let (rem, token) = take_till::<_, _, ()>(char::is_whitespace)(rem).ok()?;
        self.rem = rem;
        if token.is_empty() {
            None
        } else {
            Some(token)
        }
    }
}
