use crate::environment::Environment;
use crate::types::{Int, Sexpr};
use bimap::BiMap;
use regex::Regex;
use std::rc::Rc;

/// One tokenizer report: an accepted atom plus the length of input it
/// matched, an unrecognized character (zero length), or end of input.
/// Tokenizers skip whitespace by bumping the offset before reporting; the
/// parser adds `length` only when it accepts the token.
#[derive(Debug)]
pub enum Lexeme {
    Token { token: Sexpr, length: usize },
    Unknown,
    End,
}

lazy_static! {
    static ref TOKEN_RE: Regex = Regex::new(
        r#"(?x)                        # ignore whitespace in this pattern
        ^(?:
            (?P<paren>[()`])           # structural characters
          | (?P<int>[+-]?[0-9]+)       # integer literals
          | (?P<string>"(?:            # string literal contents:
                \\.                    #   escapes
               |[^\\"]                 #   anything that is not a backslash or quote
              )*")
          | (?P<ident>[^\s()`"]+)      # bare identifier runs
        )"#
    )
    .unwrap();

    // Escapes a string literal understands, in both directions: the lexer
    // decodes by the left column, the printer re-encodes by the right.
    static ref ESCAPES: BiMap<char, char> = {
        let mut m = BiMap::new();
        m.insert('\\', '\\');
        m.insert('"', '"');
        m.insert('n', '\n');
        m
    };
}

/// The bundled lexer: whitespace, parens, backtick quoting, integers, string
/// literals, `nil` and bare identifiers. Identifiers intern as user symbols
/// through `env`'s provider; the structural characters report the reserved
/// core symbols.
pub fn next_token(env: &Rc<Environment>, input: &str, offset: &mut usize) -> Lexeme {
    skip_whitespace(input, offset);
    let rest = &input[*offset..];
    if rest.is_empty() {
        return Lexeme::End;
    }
    let caps = match TOKEN_RE.captures(rest) {
        Some(caps) => caps,
        None => return Lexeme::Unknown,
    };
    let length = caps.get(0).unwrap().end();
    let token = if let Some(m) = caps.name("paren") {
        let symbols = env.symbols().borrow();
        let symbol = match m.as_str() {
            "(" => symbols.open().clone(),
            ")" => symbols.close().clone(),
            _ => symbols.quote().clone(),
        };
        Sexpr::Symbol(symbol)
    } else if let Some(m) = caps.name("int") {
        match m.as_str().parse::<Int>() {
            Ok(value) => Sexpr::Integer(value),
            Err(_) => return Lexeme::Unknown,
        }
    } else if let Some(m) = caps.name("string") {
        let payload = m.as_str();
        match build_string(&payload[1..payload.len() - 1]) {
            Ok(decoded) => Sexpr::String(decoded),
            Err(_) => return Lexeme::Unknown,
        }
    } else {
        match caps.name("ident").unwrap().as_str() {
            "nil" => Sexpr::Nil,
            name => Sexpr::Symbol(env.symbols().borrow_mut().intern(name, false)),
        }
    };
    Lexeme::Token { token, length }
}

fn skip_whitespace(input: &str, offset: &mut usize) {
    let rest = &input[*offset..];
    *offset += rest.len() - rest.trim_start().len();
}

#[derive(Debug)]
pub enum BuildError {
    UnknownEscape(char),
    TrailingBackslash,
}

/// Decode the escapes in a string literal's payload (quotes stripped).
pub(crate) fn build_string(payload: &str) -> Result<String, BuildError> {
    let mut output = String::with_capacity(payload.len());
    let mut chars = payload.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            output.push(c);
            continue;
        }
        match chars.next() {
            None => return Err(BuildError::TrailingBackslash),
            Some(escape) => match ESCAPES.get_by_left(&escape) {
                Some(&decoded) => output.push(decoded),
                None => return Err(BuildError::UnknownEscape(escape)),
            },
        }
    }
    Ok(output)
}

/// Re-escape a string payload for display, surrounding quotes included.
pub(crate) fn string_repr(payload: &str) -> String {
    let mut output = String::with_capacity(payload.len() + 2);
    output.push('"');
    for c in payload.chars() {
        match ESCAPES.get_by_right(&c) {
            Some(&escape) => {
                output.push('\\');
                output.push(escape);
            }
            None => output.push(c),
        }
    }
    output.push('"');
    output
}
