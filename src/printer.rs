use crate::interpreter;
use crate::symbols::SymbolProvider;
use crate::tokens;
use crate::types::Sexpr;
use itertools::Itertools;

pub type Result = std::result::Result<Outcome, String>;

pub enum Outcome {
    String(String),
    Empty,
}

/// Render an S-expression, resolving symbol literals through `symbols`.
pub fn pr_str(object: &Sexpr, symbols: &SymbolProvider) -> String {
    match object {
        Sexpr::Nil => String::from("nil"),
        Sexpr::Integer(value) => value.to_string(),
        Sexpr::String(payload) => tokens::string_repr(payload),
        Sexpr::Symbol(symbol) => String::from(symbols.name_of(symbol)),
        Sexpr::List(elements) => format!(
            "({})",
            elements.borrow().iter().map(|e| pr_str(e, symbols)).join(" ")
        ),
        Sexpr::Closure(_) => String::from("#<closure>"),
        Sexpr::Primitive(p) => format!("#<{}>", p.name),
        Sexpr::Memoized(cell) => pr_str(&cell.callable, symbols),
    }
}

/// Adapt an evaluation outcome for the REPL.
pub fn print(result: &interpreter::Result, symbols: &SymbolProvider) -> Result {
    match result {
        Ok(object) => Ok(Outcome::String(pr_str(object, symbols))),
        Err(e) => Err(e.to_string()),
    }
}
