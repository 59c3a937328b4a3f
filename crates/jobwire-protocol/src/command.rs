//! Request decoding for single-command exchanges.
//!
//! A request line is `REQUEST:` followed by a verb and whitespace-separated
//! decimal operands. Decoding is strict: surplus operands, missing operands,
//! and non-integer tokens are all rejected before any work is admitted.

use std::fmt;
use std::str::FromStr;

use crate::error::ProtocolError;
use crate::handle::JobHandle;

/// Prefix carried by every request line.
pub const REQUEST_PREFIX: &str = "REQUEST:";

/// Methods understood by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Bounded counting loop.
    Foo,
    /// Integer addition.
    Add,
    /// Ascending integer sort.
    Sort,
    /// Poll for a previously submitted job.
    GetResult,
}

impl Verb {
    /// Resolves a wire token to a verb.
    ///
    /// Matching is case-sensitive, mirroring the tokens clients send.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "foo" => Some(Self::Foo),
            "add" => Some(Self::Add),
            "sort" => Some(Self::Sort),
            "getResult" => Some(Self::GetResult),
            _ => None,
        }
    }

    /// Returns the wire token for this verb.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Foo => "foo",
            Self::Add => "add",
            Self::Sort => "sort",
            Self::GetResult => "getResult",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Unit of work named by a submitting verb.
///
/// Shared by single-command submissions and batch body lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// `foo <iterations>`: sums `0..iterations`.
    Count {
        /// Loop bound.
        iterations: u64,
    },
    /// `add <lhs> <rhs>`.
    Add {
        /// Left operand.
        lhs: i64,
        /// Right operand.
        rhs: i64,
    },
    /// `sort <values...>`.
    Sort {
        /// Values to order.
        values: Vec<i64>,
    },
}

impl Operation {
    /// Returns the verb that names this operation.
    #[must_use]
    pub const fn verb(&self) -> Verb {
        match self {
            Self::Count { .. } => Verb::Foo,
            Self::Add { .. } => Verb::Add,
            Self::Sort { .. } => Verb::Sort,
        }
    }

    fn push_operands(&self, line: &mut String) {
        match self {
            Self::Count { iterations } => push_operand(line, iterations),
            Self::Add { lhs, rhs } => {
                push_operand(line, lhs);
                push_operand(line, rhs);
            }
            Self::Sort { values } => {
                for value in values {
                    push_operand(line, value);
                }
            }
        }
    }
}

/// Decoded single-command request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `foo`, `add`, or `sort`: admit a job.
    Submit(Operation),
    /// `getResult <handle>`.
    Poll {
        /// Handle returned by an earlier submission.
        handle: JobHandle,
    },
}

impl Command {
    /// Decodes a request line.
    ///
    /// Trailing line terminators are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MalformedRequest`] when the prefix or verb is
    /// missing, [`ProtocolError::UnknownMethod`] for unrecognised verbs, and
    /// [`ProtocolError::InvalidOperand`] for wrong arity or non-integer
    /// operands.
    pub fn parse_request(line: &str) -> Result<Self, ProtocolError> {
        let body = line
            .trim_end()
            .strip_prefix(REQUEST_PREFIX)
            .ok_or_else(|| ProtocolError::malformed("missing REQUEST: prefix"))?;
        let mut tokens = body.split_whitespace();
        let token = tokens
            .next()
            .ok_or_else(|| ProtocolError::malformed("missing method"))?;
        let verb = Verb::from_token(token).ok_or_else(|| ProtocolError::unknown_method(token))?;
        let operands: Vec<&str> = tokens.collect();

        let operation = match verb {
            Verb::Foo => {
                let [iterations] = exact_operands::<1>(verb, &operands)?;
                Operation::Count {
                    iterations: parse_operand(verb, iterations)?,
                }
            }
            Verb::Add => {
                let [lhs, rhs] = exact_operands::<2>(verb, &operands)?;
                Operation::Add {
                    lhs: parse_operand(verb, lhs)?,
                    rhs: parse_operand(verb, rhs)?,
                }
            }
            Verb::Sort => Operation::Sort {
                values: operands
                    .iter()
                    .map(|token| parse_operand(verb, token))
                    .collect::<Result<Vec<i64>, _>>()?,
            },
            Verb::GetResult => {
                let [handle] = exact_operands::<1>(verb, &operands)?;
                return Ok(Self::Poll {
                    handle: JobHandle::new(parse_operand(verb, handle)?),
                });
            }
        };
        Ok(Self::Submit(operation))
    }

    /// Returns the verb this command was decoded from.
    #[must_use]
    pub const fn verb(&self) -> Verb {
        match self {
            Self::Submit(operation) => operation.verb(),
            Self::Poll { .. } => Verb::GetResult,
        }
    }

    /// Encodes the command as a request line without the trailing newline.
    #[must_use]
    pub fn to_request_line(&self) -> String {
        let mut line = format!("{REQUEST_PREFIX} {}", self.verb());
        match self {
            Self::Submit(operation) => operation.push_operands(&mut line),
            Self::Poll { handle } => push_operand(&mut line, handle),
        }
        line
    }
}

impl From<Operation> for Command {
    fn from(operation: Operation) -> Self {
        Self::Submit(operation)
    }
}

fn push_operand(line: &mut String, operand: &impl fmt::Display) {
    line.push(' ');
    line.push_str(&operand.to_string());
}

fn exact_operands<'a, const N: usize>(
    verb: Verb,
    operands: &[&'a str],
) -> Result<[&'a str; N], ProtocolError> {
    <[&str; N]>::try_from(operands).map_err(|_| {
        ProtocolError::invalid_operand(
            verb.as_str(),
            format!("expected {N} operand(s), got {}", operands.len()),
        )
    })
}

fn parse_operand<T: FromStr>(verb: Verb, token: &str) -> Result<T, ProtocolError> {
    token.parse::<T>().map_err(|_| {
        ProtocolError::invalid_operand(verb.as_str(), format!("'{token}' is not an integer"))
    })
}
