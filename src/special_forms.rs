use crate::environment::Environment;
use crate::evaluator::{Error, Result, EVAL};
use crate::types::{Arity, Closure, ClosureParameters, PrimitiveFn, Sexpr};
use std::rc::Rc;

pub static LET: PrimitiveFn = PrimitiveFn {
    name: "let",
    arity: Arity::at_least(2),
    fn_ptr: apply_let,
};

pub static LAMBDA: PrimitiveFn = PrimitiveFn {
    name: "=>",
    arity: Arity::exactly(3),
    fn_ptr: apply_lambda,
};

/// Bind `let` and `=>` in `env` unless something there already shadows
/// them. Interpreters overriding the install hook call this first, then
/// chain their own `set` calls.
pub fn install(env: &Rc<Environment>) {
    let (let_symbol, lambda_symbol) = {
        let symbols = env.symbols().borrow();
        (symbols.let_().clone(), symbols.lambda().clone())
    };
    if !env.contains(&let_symbol) {
        env.set(let_symbol, Sexpr::Primitive(&LET));
    }
    if !env.contains(&lambda_symbol) {
        env.set(lambda_symbol, Sexpr::Primitive(&LAMBDA));
    }
}

#[derive(Debug)]
pub enum LetError {
    BindingsNotAList,
    BindingNotAPair,
    BindToNonSymbol,
}

/// `(let ((a expr) (b expr)) body…)`. Receives the entire list; `list[0]`
/// is the operator slot. Binding expressions evaluate in the new scope, so
/// later bindings see earlier ones.
fn apply_let(env: &Rc<Environment>, list: &[Sexpr]) -> Result {
    let bindings = match &list[1] {
        Sexpr::List(entries) => entries.borrow().clone(),
        _ => return Err(Error::Let(LetError::BindingsNotAList)),
    };
    let scope = Environment::spawn_from(env);
    for entry in &bindings {
        let pair = match entry {
            Sexpr::List(pair) => pair.borrow().clone(),
            _ => return Err(Error::Let(LetError::BindingNotAPair)),
        };
        let (key, expr) = match pair.as_slice() {
            [Sexpr::Symbol(key), expr] => (key.clone(), expr),
            [_, _] => return Err(Error::Let(LetError::BindToNonSymbol)),
            _ => return Err(Error::Let(LetError::BindingNotAPair)),
        };
        let value = EVAL(expr, &scope)?;
        scope.set(key, value);
    }
    let mut result = Sexpr::Nil;
    for body in &list[2..] {
        result = EVAL(body, &scope)?;
    }
    Ok(result)
}

/// `(=> formals body)`. The closure captures the defining environment;
/// `this` and `params` are bound at invocation time, not here.
fn apply_lambda(env: &Rc<Environment>, list: &[Sexpr]) -> Result {
    let parameters = ClosureParameters::from_formals(&list[1]).map_err(Error::Lambda)?;
    let closure = Closure {
        parameters,
        body: list[2].clone(),
        parent: env.clone(),
    };
    Ok(Sexpr::Closure(Rc::new(closure)))
}
