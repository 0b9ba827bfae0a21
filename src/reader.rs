use crate::environment::Environment;
use crate::interpreter::Interpreter;
use crate::symbols::Symbol;
use crate::tokens::Lexeme;
use crate::types::Sexpr;
use std::fmt;
use std::rc::Rc;

pub type Result = std::result::Result<Sexpr, Error>;

#[derive(Debug, PartialEq)]
pub enum Error {
    UnexpectedCharacter { found: char, offset: usize },
    UnexpectedEndOfInput { offset: usize },
    UnexpectedClose { offset: usize },
    TrailingInput { offset: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Error::*;
        write!(f, "Read error: ")?;
        match self {
            UnexpectedCharacter { found, offset } => {
                write!(f, "unexpected character {:?} at offset {}", found, offset)
            }
            UnexpectedEndOfInput { offset } => write!(
                f,
                "ran out of input at offset {} while scanning for a form",
                offset
            ),
            UnexpectedClose { offset } => {
                write!(f, "unexpected closing token at offset {}", offset)
            }
            TrailingInput { offset } => write!(f, "trailing input at offset {}", offset),
        }
    }
}

/// Parse exactly one S-expression from `input`, then require end of input.
/// Tokens come from the interpreter's lexer and intern through `env`'s
/// provider.
pub fn read_str<I>(interp: &I, env: &Rc<Environment>, input: &str) -> Result
where
    I: Interpreter + ?Sized,
{
    let mut offset = 0;
    let form = read_form(interp, env, input, &mut offset)?;
    log::debug!("read_form produced {:?}", form);
    match interp.next_token(env, input, &mut offset) {
        Lexeme::End => Ok(form),
        _ => Err(Error::TrailingInput { offset }),
    }
}

fn read_form<I>(interp: &I, env: &Rc<Environment>, input: &str, offset: &mut usize) -> Result
where
    I: Interpreter + ?Sized,
{
    let (token, length) = match interp.next_token(env, input, offset) {
        Lexeme::End => return Err(Error::UnexpectedEndOfInput { offset: *offset }),
        Lexeme::Unknown => return Err(unexpected_character(input, *offset)),
        Lexeme::Token { token, length } => (token, length),
    };
    *offset += length;
    let (open, close, quote) = {
        let symbols = env.symbols().borrow();
        (
            symbols.open().clone(),
            symbols.close().clone(),
            symbols.quote().clone(),
        )
    };
    if token.as_symbol() == Some(&open) {
        return read_sequence(interp, env, input, offset, &close);
    }
    if token.as_symbol() == Some(&close) {
        return Err(Error::UnexpectedClose {
            offset: *offset - length,
        });
    }
    if token.as_symbol() == Some(&quote) {
        let inner = read_form(interp, env, input, offset)?;
        return Ok(Sexpr::wrap_list(vec![token, inner]));
    }
    Ok(token)
}

fn read_sequence<I>(
    interp: &I,
    env: &Rc<Environment>,
    input: &str,
    offset: &mut usize,
    close: &Symbol,
) -> Result
where
    I: Interpreter + ?Sized,
{
    let mut elements = Vec::new();
    // opening token already consumed
    loop {
        let mark = *offset;
        match interp.next_token(env, input, offset) {
            Lexeme::End => return Err(Error::UnexpectedEndOfInput { offset: *offset }),
            Lexeme::Unknown => return Err(unexpected_character(input, *offset)),
            Lexeme::Token { token, length } => {
                if token.as_symbol() == Some(close) {
                    *offset += length;
                    break;
                }
                // Not ours to consume: rewind and let read_form take the
                // whole next form.
                *offset = mark;
                elements.push(read_form(interp, env, input, offset)?);
            }
        }
    }
    Ok(Sexpr::wrap_list(elements))
}

fn unexpected_character(input: &str, offset: usize) -> Error {
    let found = input[offset..]
        .chars()
        .next()
        .unwrap_or(char::REPLACEMENT_CHARACTER);
    Error::UnexpectedCharacter { found, offset }
}
