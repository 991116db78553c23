//! The karma expression scanner.
//!
//! A karma expression is an operand (a bare token or a quoted phrase)
//! immediately followed by a run of increment (`+`) or decrement (`-`)
//! operators, closed by a word boundary, with an optional `(notify)`
//! marker requesting an acknowledgement reply:
//!
//! ```text
//! widget++            one up-vote for "widget"
//! widget+++           three up-votes
//! "coffee machine"--  one down-vote for a multi-word term
//! cake++ (notify)     up-vote and announce the new score
//! ```
//!
//! The scanner walks the whole message: anything that is not a karma
//! expression is consumed one character at a time and dropped, so ordinary
//! chat text yields an empty event list rather than an error.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till, take_while1},
    character::complete::{anychar, char as pchar, multispace0, one_of, satisfy},
    combinator::{eof, map, opt, peek, value, verify},
    multi::{fold_many0, fold_many1},
    sequence::{delimited, preceded, tuple},
    IResult,
};
use thiserror::Error;

use crate::change::{ChangeKind, Direction, KarmaChange};

/// Raised when the message cannot be tokenized at all.
///
/// Recoverable at the message boundary: the caller logs it and treats the
/// message as contributing zero karma changes.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("message does not tokenize: {0}")]
    Tokenize(String),
}

/// Scan a message for karma expressions, in source order.
///
/// Expressions whose operand trims to the empty string (e.g. `""++` or a
/// quoted run of spaces) are filtered out here and never reach the caller.
pub fn parse_message(input: &str) -> Result<Vec<KarmaChange>, ParseError> {
    let (rest, changes) = line(input).map_err(|err| ParseError::Tokenize(err.to_string()))?;
    if !rest.is_empty() {
        return Err(ParseError::Tokenize(format!(
            "trailing input at byte {}",
            input.len() - rest.len()
        )));
    }
    Ok(changes
        .into_iter()
        .filter(|change| !change.term.is_empty())
        .collect())
}

fn line(input: &str) -> IResult<&str, Vec<KarmaChange>> {
    fold_many0(element, Vec::new, |mut acc, elem| {
        if let Some(elem) = elem {
            acc.push(elem);
        }
        acc
    })(input)
}

fn element(input: &str) -> IResult<&str, Option<KarmaChange>> {
    alt((map(karma_expr, Some), value(None, anychar)))(input)
}

fn karma_expr(input: &str) -> IResult<&str, KarmaChange> {
    let (input, term) = operand(input)?;
    let (input, direction) = operator_run(input)?;
    let (input, _) = word_boundary(input)?;
    let (input, marker) = opt(notify_marker)(input)?;
    let kind = match marker {
        Some(_) => ChangeKind::Notify,
        None => ChangeKind::Vote,
    };
    Ok((input, KarmaChange::new(&term, direction, kind)))
}

fn operand(input: &str) -> IResult<&str, String> {
    alt((quoted_phrase, bare_token))(input)
}

/// A double-quoted phrase; the quotes are not part of the term.
fn quoted_phrase(input: &str) -> IResult<&str, String> {
    map(
        delimited(pchar('"'), take_till(|c| c == '"'), pchar('"')),
        str::to_string,
    )(input)
}

/// A contiguous token. Interior single dashes are allowed (`e-mail--`)
/// but a dash run is left for the operator parser to claim.
fn bare_token(input: &str) -> IResult<&str, String> {
    fold_many1(
        tuple((opt(pchar('-')), satisfy(is_token_char))),
        String::new,
        |mut acc, (dash, c)| {
            if dash.is_some() {
                acc.push('-');
            }
            acc.push(c);
            acc
        },
    )(input)
}

fn is_token_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '+' | '-' | '"')
}

fn operator_run(input: &str) -> IResult<&str, Direction> {
    alt((
        map(run_of('+'), Direction::Up),
        map(run_of('-'), Direction::Down),
    ))(input)
}

fn run_of(op: char) -> impl FnMut(&str) -> IResult<&str, u32> {
    move |input| {
        let (input, run) = verify(take_while1(move |c| c == op), |run: &str| run.len() >= 2)(input)?;
        Ok((input, run_magnitude(run.len())))
    }
}

/// A bare `++`/`--` is the conventional single vote; a longer run counts
/// one vote per operator character (`+++` is three up-votes).
fn run_magnitude(len: usize) -> u32 {
    if len == 2 {
        1
    } else {
        len as u32
    }
}

/// The operator run must end the word: whitespace, common punctuation or
/// end of input. This keeps `c++` inside `c++The language` from voting.
fn word_boundary(input: &str) -> IResult<&str, ()> {
    peek(alt((
        value((), satisfy(char::is_whitespace)),
        value((), one_of(",.;:!?()")),
        value((), eof),
    )))(input)
}

fn notify_marker(input: &str) -> IResult<&str, &str> {
    preceded(multispace0, tag("(notify)"))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_expression_embedded_in_text() {
        let changes = parse_message("I think widget++ deserves it").unwrap();
        assert_eq!(
            changes,
            vec![KarmaChange::new(
                "widget",
                Direction::Up(1),
                ChangeKind::Vote
            )]
        );
    }

    #[test]
    fn operator_run_must_close_a_word() {
        assert!(parse_message("c++rocks").unwrap().is_empty());
    }
}
