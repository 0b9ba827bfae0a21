use crate::environment::Environment;
use crate::special_forms::LetError;
use crate::symbols::Symbol;
use crate::types::{callable, BadArgCount, BadFormals, Closure, MemoCell, Sexpr};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

pub type Result<T = Sexpr> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    BadArgCount(BadArgCount),
    Let(LetError),
    Lambda(BadFormals),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Evaluation error: ")?;
        match self {
            Error::BadArgCount(e) => write!(f, "{}", e),
            Error::Let(e) => write!(f, "let: {:?}", e),
            Error::Lambda(e) => write!(f, "=>: {:?}", e),
        }
    }
}

/// Reduce `ast` in `env`.
#[allow(non_snake_case)]
pub fn EVAL(ast: &Sexpr, env: &Rc<Environment>) -> Result {
    log::debug!("EVAL {:?}", ast);
    match ast {
        Sexpr::Symbol(s) => Ok(fetch_symbol(s, env)),
        Sexpr::List(list) => evaluate_list(list, env),
        _ => Ok(ast.clone()),
    }
}

/// Unbound symbols reduce to the `Unknown` sentinel, never an error.
fn fetch_symbol(s: &Symbol, env: &Rc<Environment>) -> Sexpr {
    env.get(s).unwrap_or_else(|| unknown(env))
}

pub(crate) fn unknown(env: &Rc<Environment>) -> Sexpr {
    Sexpr::Symbol(env.symbols().borrow().unknown().clone())
}

fn evaluate_list(list: &Rc<RefCell<Vec<Sexpr>>>, env: &Rc<Environment>) -> Result {
    let argv: Vec<Sexpr> = list.borrow().clone();
    if argv.is_empty() {
        return Ok(Sexpr::List(list.clone()));
    }

    let (quote, threshold) = {
        let symbols = env.symbols().borrow();
        (symbols.quote().clone(), symbols.builtin_threshold())
    };

    if argv.len() >= 2 {
        if let Some(head) = argv[0].as_symbol() {
            if *head == quote {
                return Ok(argv[1].clone());
            }
        }
    }

    // A memoized slot short-circuits everything: the whole list is handed
    // over as the argument vector.
    for slot in 0..argv.len().min(2) {
        if let Sexpr::Memoized(cell) = &argv[slot] {
            return apply(&cell.callable, env, &argv);
        }
    }

    // Operator builtins resolve once, then live on in the slot they were
    // found in.
    for slot in 0..argv.len().min(2) {
        if let Some(symbol) = argv[slot].as_symbol() {
            if symbol.index < threshold {
                let resolved = fetch_symbol(symbol, env);
                if callable(&resolved) {
                    let cell = MemoCell {
                        callable: resolved.clone(),
                    };
                    list.borrow_mut()[slot] = Sexpr::Memoized(Rc::new(cell));
                    return apply(&resolved, env, &argv);
                }
            }
        }
    }

    // Head position: a callable directly, or after one round of evaluation.
    let head = &argv[0];
    let (resolved, resolved_by_eval) = if callable(head) {
        (head.clone(), false)
    } else {
        (EVAL(head, env)?, true)
    };
    if callable(&resolved) {
        if resolved_by_eval {
            list.borrow_mut()[0] = resolved.clone();
        }
        let mut args = Vec::with_capacity(argv.len() - 1);
        for expr in &argv[1..] {
            args.push(EVAL(expr, env)?);
        }
        return apply(&resolved, env, &args);
    }

    // Sequence fallback: everything evaluates in order and the last value
    // wins. The head has already been evaluated above.
    let mut last = resolved;
    for expr in &argv[1..] {
        last = EVAL(expr, env)?;
    }
    Ok(last)
}

/// Invoke a callable. Builtins reached through a dispatch or memoized slot
/// receive the entire list as `args`; applicative calls pass the evaluated
/// arguments only. Closures scope to their defining environment, not `env`.
pub fn apply(callable: &Sexpr, env: &Rc<Environment>, args: &[Sexpr]) -> Result {
    match callable {
        Sexpr::Primitive(p) => {
            p.arity
                .validate_for(args.len(), p.name)
                .map_err(Error::BadArgCount)?;
            (p.fn_ptr)(env, args)
        }
        Sexpr::Closure(c) => apply_closure(c, args),
        _ => Ok(callable.clone()),
    }
}

fn apply_closure(closure: &Rc<Closure>, args: &[Sexpr]) -> Result {
    let scope = Environment::spawn_from(&closure.parent);
    let parameters = &closure.parameters;
    for (i, symbol) in parameters.positional.iter().enumerate() {
        let value = match args.get(i) {
            Some(arg) => arg.clone(),
            None => unknown(&scope),
        };
        scope.set(symbol.clone(), value);
    }
    if let Some(rest) = &parameters.variadic {
        let value = if args.len() > parameters.positional.len() {
            Sexpr::wrap_list(args[parameters.positional.len()..].to_vec())
        } else {
            unknown(&scope)
        };
        scope.set(rest.clone(), value);
    }
    let (this, params) = {
        let symbols = scope.symbols().borrow();
        (symbols.this().clone(), symbols.params().clone())
    };
    scope.set(this, Sexpr::Closure(closure.clone()));
    scope.set(params, Sexpr::wrap_list(args.to_vec()));
    EVAL(&closure.body, &scope)
}
