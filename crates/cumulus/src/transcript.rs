//! Line-based transcript of word events.
//!
//! A transcript replays a listening session into a cloud. Each line is one
//! of:
//!
//! ```text
//! # a comment
//! !clear
//! !exclude the a an
//! !include the
//! hello world hello*3 -world
//! ```
//!
//! Items on a plain line are `word` (add one occurrence), `word*N` (add a
//! signed weight) and `-word` (remove the word). Blank lines are ignored.
//! Words are passed to the engine as written; normalization happens there.

use std::ops::Range;

use thiserror::Error;
use winnow::{
    Parser as _,
    ascii::dec_int,
    combinator::{alt, cut_err, eof, fail, opt, peek, preceded, repeat, terminated},
    error::{ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location},
    token::{one_of, take_while},
};

/// One event of a transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Add `delta` occurrences of `word`; negative values shrink it.
    Add { word: String, delta: i64 },
    /// Remove `word` regardless of its count.
    Remove(String),
    /// Remove every word.
    Clear,
    /// Add words to the exclusion list.
    Exclude(Vec<String>),
    /// Remove words from the exclusion list.
    Include(Vec<String>),
}

/// A transcript syntax error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at line {line}, column {column}")]
pub struct TranscriptError {
    message: String,
    span: Range<usize>,
    line: usize,
    column: usize,
}

impl TranscriptError {
    fn new(source: &str, message: impl Into<String>, span: Range<usize>) -> Self {
        let before = &source[..span.start];
        let line = before.matches('\n').count() + 1;
        let column = before
            .rsplit('\n')
            .next()
            .map_or(0, |text| text.chars().count())
            + 1;

        Self {
            message: message.into(),
            span,
            line,
            column,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Byte offset of the start of the error.
    pub fn offset(&self) -> usize {
        self.span.start
    }

    /// Byte range of the offending text.
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    /// 1-based line of the error.
    pub fn line(&self) -> usize {
        self.line
    }

    /// 1-based column of the error, in characters.
    pub fn column(&self) -> usize {
        self.column
    }
}

/// What the parser expected, attached to cut errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Expected {
    message: &'static str,
    /// The error span covers from `start` to the error position.
    start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type PResult<O> = ModalResult<O, ContextError<Expected>>;

/// Horizontal whitespace, including a stray `\r`.
fn blank(input: &mut Input<'_>) -> PResult<()> {
    take_while(0.., |c: char| c.is_whitespace() && c != '\n')
        .void()
        .parse_next(input)
}

fn blank1(input: &mut Input<'_>) -> PResult<()> {
    take_while(1.., |c: char| c.is_whitespace() && c != '\n')
        .void()
        .parse_next(input)
}

fn word<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    take_while(1.., |c: char| !c.is_whitespace() && c != '*').parse_next(input)
}

fn comment(input: &mut Input<'_>) -> PResult<()> {
    preceded('#', take_while(0.., |c: char| c != '\n'))
        .void()
        .parse_next(input)
}

/// `*N` suffix of a weighted item.
fn weight(input: &mut Input<'_>) -> PResult<i64> {
    let start = input.current_token_start();
    preceded(
        '*',
        cut_err(dec_int::<_, i64, _>).context(Expected {
            message: "expected an integer weight after `*`",
            start,
        }),
    )
    .parse_next(input)
}

/// Requires whitespace or the end of input after an item.
fn item_end(input: &mut Input<'_>) -> PResult<()> {
    let start = input.current_token_start();
    cut_err(peek(alt((
        eof.void(),
        one_of(|c: char| c.is_whitespace()).void(),
    ))))
    .context(Expected {
        message: "unexpected character after item",
        start,
    })
    .parse_next(input)
}

fn item(input: &mut Input<'_>) -> PResult<Command> {
    let start = input.current_token_start();
    alt((
        preceded(
            '-',
            cut_err(word).context(Expected {
                message: "expected a word after `-`",
                start,
            }),
        )
        .map(|word| Command::Remove(word.to_string())),
        (word, opt(weight)).map(|(word, delta)| Command::Add {
            word: word.to_string(),
            delta: delta.unwrap_or(1),
        }),
    ))
    .parse_next(input)
}

fn items(input: &mut Input<'_>) -> PResult<Vec<Command>> {
    repeat(0.., terminated(item, (item_end, blank))).parse_next(input)
}

fn word_list(input: &mut Input<'_>) -> PResult<Vec<String>> {
    repeat(0.., preceded(blank1, word.map(str::to_string))).parse_next(input)
}

fn directive(input: &mut Input<'_>) -> PResult<Command> {
    let start = input.current_token_start();
    '!'.parse_next(input)?;

    let name = cut_err(take_while(1.., |c: char| c.is_ascii_alphabetic()))
        .context(Expected {
            message: "expected a directive name after `!`",
            start,
        })
        .parse_next(input)?;

    match name {
        "clear" => Ok(Command::Clear),
        "exclude" => word_list.map(Command::Exclude).parse_next(input),
        "include" => word_list.map(Command::Include).parse_next(input),
        _ => cut_err(fail)
            .context(Expected {
                message: "unknown directive",
                start,
            })
            .parse_next(input),
    }
}

fn line_end(input: &mut Input<'_>) -> PResult<()> {
    let start = input.current_token_start();
    cut_err(alt(('\n'.void(), eof.void())))
        .context(Expected {
            message: "expected end of line",
            start,
        })
        .parse_next(input)
}

fn line(input: &mut Input<'_>) -> PResult<Vec<Command>> {
    let commands = preceded(
        blank,
        alt((
            comment.map(|()| Vec::new()),
            directive.map(|command| vec![command]),
            items,
        )),
    )
    .parse_next(input)?;
    blank.parse_next(input)?;
    line_end.parse_next(input)?;
    Ok(commands)
}

fn convert_err_mode(
    source: &str,
    err: ErrMode<ContextError<Expected>>,
    error_pos: usize,
) -> TranscriptError {
    let context_error = match err {
        ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
        ErrMode::Incomplete(_) => ContextError::new(),
    };

    let (message, start) = context_error
        .context()
        .next()
        .map_or(("unexpected character", error_pos), |expected| {
            (expected.message, expected.start)
        });

    let end = if error_pos > start {
        error_pos
    } else {
        source[start..]
            .chars()
            .next()
            .map_or(start, |c| start + c.len_utf8())
    };
    TranscriptError::new(source, message, start..end)
}

/// Parses a whole transcript.
///
/// # Errors
///
/// Returns the first syntax error: an unknown directive, a malformed
/// weight, a dangling `-`, or trailing text after a directive.
pub fn parse(source: &str) -> Result<Vec<Command>, TranscriptError> {
    let mut input = LocatingSlice::new(source);
    let mut commands = Vec::new();

    while !input.is_empty() {
        match line(&mut input) {
            Ok(parsed) => commands.extend(parsed),
            Err(err) => {
                let error_pos = input.current_token_start();
                return Err(convert_err_mode(source, err, error_pos));
            }
        }
    }
    Ok(commands)
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    fn check_arbitrary_input_never_panics(source: &str) -> Result<(), TestCaseError> {
        if let Err(err) = parse(source) {
            prop_assert!(err.span().end <= source.len());
            prop_assert!(source.is_char_boundary(err.span().start));
            prop_assert!(source.is_char_boundary(err.span().end));
        }
        Ok(())
    }

    fn check_plain_words_parse(words: Vec<String>) -> Result<(), TestCaseError> {
        let source = words.join(" ");
        let commands = parse(&source).map_err(|e| TestCaseError::fail(e.to_string()))?;

        prop_assert_eq!(commands.len(), words.len());
        for (command, word) in commands.iter().zip(&words) {
            prop_assert_eq!(
                command,
                &Command::Add {
                    word: word.clone(),
                    delta: 1
                }
            );
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn arbitrary_input_never_panics(source in "\\PC{0,40}") {
            check_arbitrary_input_never_panics(&source)?;
        }

        #[test]
        fn plain_words_parse(words in prop::collection::vec("[a-z][a-z']{0,8}", 0..10)) {
            check_plain_words_parse(words)?;
        }
    }
}
