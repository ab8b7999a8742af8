//! Splits a multi-statement SQL script into executable fragments.
//!
//! `;` ends a fragment unless it sits inside a quoted literal, a quoted
//! identifier, a `$tag$` dollar-quoted body or a comment. Comments are
//! dropped; empty fragments are skipped.

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_until, take_while},
    character::complete::{anychar, char},
    combinator::{map, opt, recognize},
    multi::{many0, many0_count},
    sequence::{delimited, pair},
    IResult,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("Failed to split SQL script: {0}")]
    Parse(String),
    #[error("Failed to split SQL script near: {0}")]
    Trailing(String),
}

enum Piece<'a> {
    Text(&'a str),
    Comment,
    Terminator,
}

fn single_quoted(input: &str) -> IResult<&str, &str> {
    recognize(delimited(
        char('\''),
        many0_count(alt((tag("''"), is_not("'")))),
        char('\''),
    ))(input)
}

fn double_quoted(input: &str) -> IResult<&str, &str> {
    recognize(delimited(
        char('"'),
        many0_count(alt((tag("\"\""), is_not("\"")))),
        char('"'),
    ))(input)
}

fn line_comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(tag("--"), opt(is_not("\n"))))(input)
}

fn block_comment(input: &str) -> IResult<&str, &str> {
    recognize(delimited(tag("/*"), take_until("*/"), tag("*/")))(input)
}

fn dollar_quoted(input: &str) -> IResult<&str, &str> {
    let (rest, opening) = recognize(delimited(
        char('$'),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
        char('$'),
    ))(input)?;
    let (rest, _) = take_until(opening)(rest)?;
    let (rest, _) = tag(opening)(rest)?;
    let consumed = input.len() - rest.len();
    Ok((rest, &input[..consumed]))
}

fn piece(input: &str) -> IResult<&str, Piece<'_>> {
    alt((
        map(char(';'), |_| Piece::Terminator),
        map(line_comment, |_| Piece::Comment),
        map(block_comment, |_| Piece::Comment),
        map(single_quoted, Piece::Text),
        map(double_quoted, Piece::Text),
        map(dollar_quoted, Piece::Text),
        map(is_not(";'\"-/$"), Piece::Text),
        map(recognize(anychar), Piece::Text),
    ))(input)
}

/// Splits `script` into trimmed, non-empty statements in source order.
pub fn split_script(script: &str) -> Result<Vec<String>, ScriptError> {
    let (rest, pieces) = many0(piece)(script).map_err(|e| ScriptError::Parse(e.to_string()))?;
    if !rest.is_empty() {
        return Err(ScriptError::Trailing(rest.chars().take(20).collect()));
    }

    let mut fragments = Vec::new();
    let mut current = String::new();
    for piece in pieces {
        match piece {
            Piece::Text(text) => current.push_str(text),
            Piece::Comment => current.push(' '),
            Piece::Terminator => flush(&mut current, &mut fragments),
        }
    }
    flush(&mut current, &mut fragments);
    Ok(fragments)
}

fn flush(current: &mut String, fragments: &mut Vec<String>) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        fragments.push(trimmed.to_string());
    }
    current.clear();
}
