use crate::environment::Environment;
use crate::evaluator;
use crate::reader;
use crate::special_forms;
use crate::symbols::SymbolProvider;
use crate::tokens::{self, Lexeme};
use crate::types::Sexpr;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

pub type Result = std::result::Result<Sexpr, Error>;

#[derive(Debug)]
pub enum Error {
    Read(reader::Error),
    Eval(evaluator::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Read(e) => write!(f, "{}", e),
            Error::Eval(e) => write!(f, "{}", e),
        }
    }
}

/// A concrete interpreter over the evaluator core. Implementations supply
/// the symbol table and the lexer; the provided methods are the public face
/// of the core and normally stay untouched, except for `install_builtins`
/// which extending interpreters override to add their own operators.
pub trait Interpreter {
    /// The ambient symbol table shared by every environment this
    /// interpreter touches.
    fn symbols(&self) -> &Rc<RefCell<SymbolProvider>>;

    /// The tokenizer seam. Implementations intern literals through `env`'s
    /// provider, silently bump `offset` past whitespace, and report one
    /// atom at a time.
    fn next_token(&self, env: &Rc<Environment>, input: &str, offset: &mut usize) -> Lexeme;

    /// Populate builtins at the scope of evaluation. The default guarantees
    /// `let` and `=>`; overriders call `special_forms::install` themselves
    /// and chain their own `set` calls after it.
    fn install_builtins(&self, env: &Rc<Environment>) {
        special_forms::install(env);
    }

    fn root_environment(&self) -> Rc<Environment> {
        Environment::new(self.symbols().clone())
    }

    fn parse(&self, input: &str) -> reader::Result {
        self.parse_in(&self.root_environment(), input)
    }

    fn parse_in(&self, env: &Rc<Environment>, input: &str) -> reader::Result {
        reader::read_str(self, env, input)
    }

    fn evaluate(&self, input: &str) -> Result {
        self.evaluate_in(&self.root_environment(), input)
    }

    /// Parse and reduce `input` in a child scope of `env`. The freshly
    /// parsed tree is deep-copied before reduction, so the parse artifact
    /// never carries evaluation rewrites.
    fn evaluate_in(&self, env: &Rc<Environment>, input: &str) -> Result {
        let scope = Environment::spawn_from(env);
        let parsed = reader::read_str(self, &scope, input).map_err(Error::Read)?;
        let tree = parsed.deep_copy();
        self.install_builtins(&scope);
        evaluator::EVAL(&tree, &scope).map_err(Error::Eval)
    }

    /// Reduce an already-parsed tree in a child scope of `env`. Slots of
    /// `expr` may be rewritten with memoized builtins as evaluation runs;
    /// its shape is preserved. Pass a `deep_copy` to keep a tree pristine.
    fn evaluate_expr(&self, env: &Rc<Environment>, expr: &Sexpr) -> Result {
        let scope = Environment::spawn_from(env);
        self.install_builtins(&scope);
        evaluator::EVAL(expr, &scope).map_err(Error::Eval)
    }

    /// The exact two-slot quote form around `expr`.
    fn quote(&self, expr: Sexpr) -> Sexpr {
        let quote = Sexpr::Symbol(self.symbols().borrow().quote().clone());
        Sexpr::wrap_list(vec![quote, expr])
    }
}

/// The bundled interpreter: the default core table and the regex lexer.
pub struct Lisp {
    symbols: Rc<RefCell<SymbolProvider>>,
}

impl Lisp {
    pub fn new() -> Self {
        Lisp {
            symbols: Rc::new(RefCell::new(SymbolProvider::new())),
        }
    }
}

impl Default for Lisp {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter for Lisp {
    fn symbols(&self) -> &Rc<RefCell<SymbolProvider>> {
        &self.symbols
    }

    fn next_token(&self, env: &Rc<Environment>, input: &str, offset: &mut usize) -> Lexeme {
        tokens::next_token(env, input, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_builds_the_exact_two_slot_shape() {
        let lisp = Lisp::new();
        let quoted = lisp.quote(Sexpr::Integer(1));
        match &quoted {
            Sexpr::List(items) => {
                let items = items.borrow();
                assert_eq!(items.len(), 2);
                assert_eq!(
                    items[0],
                    Sexpr::Symbol(lisp.symbols().borrow().quote().clone())
                );
                assert_eq!(items[1], Sexpr::Integer(1));
            }
            other => panic!("wanted a list, got {:?}", other),
        }
    }

    #[test]
    fn evaluating_a_quoted_list_returns_the_original_node() {
        let lisp = Lisp::new();
        let env = lisp.root_environment();
        let original = Sexpr::wrap_list(vec![Sexpr::Integer(1), Sexpr::Integer(2)]);
        let value = lisp
            .evaluate_expr(&env, &lisp.quote(original.clone()))
            .unwrap();
        match (&original, &value) {
            (Sexpr::List(a), Sexpr::List(b)) => assert!(Rc::ptr_eq(a, b)),
            other => panic!("wanted two lists, got {:?}", other),
        }
    }

    #[test]
    fn evaluating_a_quoted_atom_returns_an_equal_atom() {
        let lisp = Lisp::new();
        let env = lisp.root_environment();
        let value = lisp
            .evaluate_expr(&env, &lisp.quote(Sexpr::Integer(5)))
            .unwrap();
        assert_eq!(value, Sexpr::Integer(5));
    }

    #[test]
    fn repeated_evaluation_of_one_parse_is_stable() {
        let lisp = Lisp::new();
        let env = lisp.root_environment();
        let parsed = lisp.parse_in(&env, "(let ((a 1) (b a)) b)").unwrap();
        let pristine = parsed.deep_copy();
        let first = lisp.evaluate_expr(&env, &parsed).unwrap();
        let second = lisp.evaluate_expr(&env, &parsed).unwrap();
        assert_eq!(first, Sexpr::Integer(1));
        assert_eq!(first, second);
        // Slots may now hold memoized cells, but the shape is untouched.
        assert_same_shape(&parsed, &pristine);
    }

    fn assert_same_shape(a: &Sexpr, b: &Sexpr) {
        if let (Sexpr::List(x), Sexpr::List(y)) = (a, b) {
            let (x, y) = (x.borrow(), y.borrow());
            assert_eq!(x.len(), y.len());
            for (u, v) in x.iter().zip(y.iter()) {
                assert_same_shape(u, v);
            }
        }
    }

    #[test]
    fn string_evaluation_leaves_the_parse_artifact_untouched() {
        let lisp = Lisp::new();
        let env = lisp.root_environment();
        let first = lisp.evaluate_in(&env, "(let ((a 1)) a)").unwrap();
        let second = lisp.evaluate_in(&env, "(let ((a 1)) a)").unwrap();
        assert_eq!(first, Sexpr::Integer(1));
        assert_eq!(first, second);
    }

    #[test]
    fn evaluate_in_sees_caller_bindings() {
        let lisp = Lisp::new();
        let env = lisp.root_environment();
        let x = lisp.symbols().borrow_mut().intern("x", false);
        env.set(x, Sexpr::Integer(5));
        assert_eq!(lisp.evaluate_in(&env, "x").unwrap(), Sexpr::Integer(5));
    }

    #[test]
    fn parse_errors_surface_through_evaluate() {
        let lisp = Lisp::new();
        match lisp.evaluate("(a b") {
            Err(Error::Read(reader::Error::UnexpectedEndOfInput { offset: 4 })) => {}
            other => panic!("wanted a read error, got {:?}", other),
        }
    }
}
