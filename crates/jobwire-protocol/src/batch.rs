//! Body-line codec for batch requests.
//!
//! Batch bodies reuse the submitting verbs without the `REQUEST:` prefix. The
//! sort form carries an explicit element count ahead of its values:
//!
//! ```text
//! REQUEST: BATCH
//! foo 100000
//! add 2 3
//! sort 2 9 1
//! END
//! ```

use thiserror::Error;

use crate::command::{Operation, Verb};

/// First line of every batch request.
pub const BATCH_HEADER: &str = "REQUEST: BATCH";

/// Line that terminates a batch body.
pub const BATCH_SENTINEL: &str = "END";

/// Failure to decode one batch body line.
///
/// The display form is the error line written into the aggregated reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchLineError {
    /// `foo` without a loop bound.
    #[error("ERROR(foo): missing iterations")]
    MissingIterations,
    /// `add` with fewer than two operands.
    #[error("ERROR(add): missing operands")]
    MissingOperands,
    /// `sort` without a count.
    #[error("ERROR(sort): missing array size")]
    MissingArraySize,
    /// The `sort` count is not an integer.
    #[error("ERROR(sort): invalid array size")]
    InvalidArraySize,
    /// The `sort` count is below one or disagrees with the supplied values.
    #[error("ERROR(sort): array size mismatch")]
    ArraySizeMismatch {
        /// Count written on the line.
        declared: i64,
        /// Number of values actually supplied.
        supplied: usize,
    },
    /// An operand is not an integer.
    #[error("ERROR({verb}): invalid number format")]
    InvalidNumber {
        /// Verb whose operand was rejected.
        verb: Verb,
    },
    /// The verb is not a batch operation.
    #[error("ERROR: Unknown command {verb}")]
    UnknownCommand {
        /// Verb as received.
        verb: String,
    },
}

impl Operation {
    /// Decodes a trimmed, non-empty body line that is not the sentinel.
    ///
    /// Surplus `foo` and `add` operands are ignored; the `sort` count must
    /// match the number of values exactly.
    ///
    /// # Errors
    ///
    /// Returns the [`BatchLineError`] describing the first problem found.
    pub fn parse_body_line(line: &str) -> Result<Self, BatchLineError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((&token, operands)) = tokens.split_first() else {
            return Err(BatchLineError::UnknownCommand {
                verb: String::new(),
            });
        };

        match Verb::from_token(token) {
            Some(Verb::Foo) => {
                let iterations = operands.first().ok_or(BatchLineError::MissingIterations)?;
                Ok(Self::Count {
                    iterations: parse_number(Verb::Foo, iterations)?,
                })
            }
            Some(Verb::Add) => match operands {
                [lhs, rhs, ..] => Ok(Self::Add {
                    lhs: parse_number(Verb::Add, lhs)?,
                    rhs: parse_number(Verb::Add, rhs)?,
                }),
                _ => Err(BatchLineError::MissingOperands),
            },
            Some(Verb::Sort) => parse_sort(operands),
            Some(Verb::GetResult) | None => Err(BatchLineError::UnknownCommand {
                verb: token.to_owned(),
            }),
        }
    }

    /// Encodes the operation as a batch body line without the trailing
    /// newline. Sort lines carry their element count ahead of the values.
    #[must_use]
    pub fn to_body_line(&self) -> String {
        match self {
            Self::Count { iterations } => format!("foo {iterations}"),
            Self::Add { lhs, rhs } => format!("add {lhs} {rhs}"),
            Self::Sort { values } => {
                let mut line = format!("sort {}", values.len());
                for value in values {
                    line.push(' ');
                    line.push_str(&value.to_string());
                }
                line
            }
        }
    }
}

fn parse_sort(operands: &[&str]) -> Result<Operation, BatchLineError> {
    let (count, values) = operands
        .split_first()
        .ok_or(BatchLineError::MissingArraySize)?;
    let declared = count
        .parse::<i64>()
        .map_err(|_| BatchLineError::InvalidArraySize)?;
    let matches_supplied = usize::try_from(declared).is_ok_and(|n| n >= 1 && n == values.len());
    if !matches_supplied {
        return Err(BatchLineError::ArraySizeMismatch {
            declared,
            supplied: values.len(),
        });
    }
    let values = values
        .iter()
        .map(|token| parse_number(Verb::Sort, token))
        .collect::<Result<Vec<i64>, _>>()?;
    Ok(Operation::Sort { values })
}

fn parse_number<T: std::str::FromStr>(verb: Verb, token: &str) -> Result<T, BatchLineError> {
    token
        .parse::<T>()
        .map_err(|_| BatchLineError::InvalidNumber { verb })
}
