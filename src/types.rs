use crate::environment::Environment;
use crate::evaluator;
use crate::symbols::Symbol;
use std::cell::RefCell;
use std::fmt;
use std::fmt::Formatter;
use std::ops::{RangeFrom, RangeInclusive};
use std::rc::Rc;

pub type Int = i64;

/// A node of the heterogeneous S-expression tree. Everything except `List`
/// is an atom; list slots are mutable in place (the evaluator rewrites them
/// to memoize resolved builtins) but a list's length and nesting never
/// change after parsing.
#[derive(Debug, Clone)]
pub enum Sexpr {
    Nil,
    Integer(Int),
    String(String),
    Symbol(Symbol),
    List(Rc<RefCell<Vec<Sexpr>>>),
    Closure(Rc<Closure>),
    Primitive(&'static PrimitiveFn),
    Memoized(Rc<MemoCell>),
}

impl Sexpr {
    pub fn wrap_list(elements: Vec<Sexpr>) -> Self {
        Sexpr::List(Rc::new(RefCell::new(elements)))
    }

    /// A copy of this tree with fresh list spines. Atoms are shared, so
    /// symbols keep their identity across the copy.
    pub fn deep_copy(&self) -> Sexpr {
        match self {
            Sexpr::List(items) => {
                let copied = items.borrow().iter().map(Sexpr::deep_copy).collect();
                Sexpr::wrap_list(copied)
            }
            other => other.clone(),
        }
    }

    pub(crate) fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Sexpr::Symbol(s) => Some(s),
            _ => None,
        }
    }
}

pub(crate) fn callable(obj: &Sexpr) -> bool {
    match obj {
        Sexpr::Closure(_) | Sexpr::Primitive(_) => true,
        Sexpr::Nil
        | Sexpr::Integer(_)
        | Sexpr::String(_)
        | Sexpr::Symbol(_)
        | Sexpr::List(_)
        | Sexpr::Memoized(_) => false,
    }
}

/// Wrapper dropped into a list slot once the builtin there has been looked
/// up, so later evaluations of the same physical list skip the resolution.
/// Slot 0 is the prefix position, slot 1 the infix one. Only the evaluator
/// produces these; the parser never does.
#[derive(Debug)]
pub struct MemoCell {
    pub callable: Sexpr,
}

#[derive(Debug, Clone)]
pub struct ClosureParameters {
    pub positional: Vec<Symbol>,
    pub variadic: Option<Symbol>,
}

#[derive(Debug, PartialEq)]
pub enum BadFormals {
    NotSymbolOrList,
    FormalNotASymbol,
    VariadicNotASymbol,
    VariadicNotLast,
}

impl ClosureParameters {
    /// `formals` is a lone symbol (a one-element parameter list) or a list
    /// of symbols; a final entry wrapped in a one-element list is the
    /// variadic parameter.
    pub fn from_formals(formals: &Sexpr) -> Result<Self, BadFormals> {
        let items: Vec<Sexpr> = match formals {
            Sexpr::Symbol(s) => {
                return Ok(ClosureParameters {
                    positional: vec![s.clone()],
                    variadic: None,
                });
            }
            Sexpr::List(items) => items.borrow().clone(),
            _ => return Err(BadFormals::NotSymbolOrList),
        };
        let mut positional = Vec::with_capacity(items.len());
        let mut variadic = None;
        let last = items.len().checked_sub(1);
        for (i, entry) in items.iter().enumerate() {
            match entry {
                Sexpr::Symbol(s) => positional.push(s.clone()),
                Sexpr::List(group) => {
                    if Some(i) != last {
                        return Err(BadFormals::VariadicNotLast);
                    }
                    let group = group.borrow();
                    match group.as_slice() {
                        [Sexpr::Symbol(s)] => variadic = Some(s.clone()),
                        _ => return Err(BadFormals::VariadicNotASymbol),
                    }
                }
                _ => return Err(BadFormals::FormalNotASymbol),
            }
        }
        Ok(ClosureParameters {
            positional,
            variadic,
        })
    }
}

#[derive(Clone)]
pub struct Closure {
    pub parameters: ClosureParameters,
    pub body: Sexpr,
    pub parent: Rc<Environment>,
}

impl fmt::Debug for Closure {
    // Not derived because we want to skip the parent: the parent may well
    // hold this closure.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Closure{{parameters: {:?}, body: {:?}}}",
            self.parameters, self.body
        )
    }
}

pub struct PrimitiveFn {
    pub name: &'static str,
    pub arity: Arity,
    pub fn_ptr: fn(&Rc<Environment>, &[Sexpr]) -> evaluator::Result,
}

impl fmt::Debug for PrimitiveFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "primitive function #<{}>", self.name)
    }
}

#[derive(Debug, Clone)]
pub enum Arity {
    Between(RangeInclusive<usize>),
    AtLeast(RangeFrom<usize>),
}

impl Arity {
    pub const fn exactly(n: usize) -> Self {
        Self::Between(n..=n)
    }

    pub const fn at_least(n: usize) -> Self {
        Self::AtLeast(n..)
    }

    pub(crate) fn contains(&self, n: usize) -> bool {
        match self {
            Self::Between(range) => range.contains(&n),
            Self::AtLeast(range) => range.contains(&n),
        }
    }

    pub fn validate_for(&self, n: usize, name: &'static str) -> Result<(), BadArgCount> {
        match self.contains(n) {
            true => Ok(()),
            false => Err(BadArgCount {
                name,
                expected: self.clone(),
                got: n,
            }),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Between(r) => {
                if r.start() == r.end() {
                    write!(f, "exactly {}", r.start())
                } else {
                    write!(f, "from {} to {}", r.start(), r.end())
                }
            }
            Arity::AtLeast(r) => write!(f, "at least {}", r.start),
        }
    }
}

#[derive(Debug)]
pub struct BadArgCount {
    name: &'static str,
    expected: Arity,
    got: usize,
}

impl fmt::Display for BadArgCount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "when evaluating {} expected {} arguments, but received {}",
            self.name, self.expected, self.got
        )
    }
}

impl PartialEq for Sexpr {
    fn eq(&self, other: &Self) -> bool {
        use Sexpr::*;
        match (self, other) {
            (Nil, Nil) => true,
            (Integer(x), Integer(y)) => x == y,
            (String(x), String(y)) => x == y,
            (Symbol(x), Symbol(y)) => x == y,
            (List(x), List(y)) => Rc::ptr_eq(x, y) || equal_slices(&x.borrow(), &y.borrow()),
            (Closure(x), Closure(y)) => Rc::ptr_eq(x, y),
            (Primitive(x), Primitive(y)) => std::ptr::eq(*x, *y),
            (Memoized(x), Memoized(y)) => Rc::ptr_eq(x, y),
            _ => false,
        }
    }
}

impl Eq for Sexpr {}

fn equal_slices(xs: &[Sexpr], ys: &[Sexpr]) -> bool {
    xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| x == y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolProvider;

    #[test]
    fn deep_copy_refreshes_list_spines_and_shares_atoms() {
        let mut provider = SymbolProvider::new();
        let a = provider.intern("a", false);
        let inner = Sexpr::wrap_list(vec![Sexpr::Symbol(a)]);
        let outer = Sexpr::wrap_list(vec![inner, Sexpr::Integer(3)]);
        let copy = outer.deep_copy();
        assert_eq!(copy, outer);
        match (&outer, &copy) {
            (Sexpr::List(x), Sexpr::List(y)) => {
                assert!(!Rc::ptr_eq(x, y));
                match (&x.borrow()[0], &y.borrow()[0]) {
                    (Sexpr::List(u), Sexpr::List(v)) => assert!(!Rc::ptr_eq(u, v)),
                    _ => unreachable!(),
                }
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn a_lone_symbol_is_a_one_element_parameter_list() {
        let mut provider = SymbolProvider::new();
        let x = provider.intern("x", false);
        let parameters = ClosureParameters::from_formals(&Sexpr::Symbol(x.clone())).unwrap();
        assert_eq!(parameters.positional, vec![x]);
        assert!(parameters.variadic.is_none());
    }

    #[test]
    fn a_final_singleton_group_is_the_variadic() {
        let mut provider = SymbolProvider::new();
        let a = provider.intern("a", false);
        let rest = provider.intern("rest", false);
        let formals = Sexpr::wrap_list(vec![
            Sexpr::Symbol(a.clone()),
            Sexpr::wrap_list(vec![Sexpr::Symbol(rest.clone())]),
        ]);
        let parameters = ClosureParameters::from_formals(&formals).unwrap();
        assert_eq!(parameters.positional, vec![a]);
        assert_eq!(parameters.variadic, Some(rest));
    }

    #[test]
    fn the_variadic_group_must_come_last() {
        let mut provider = SymbolProvider::new();
        let a = provider.intern("a", false);
        let b = provider.intern("b", false);
        let rest = provider.intern("rest", false);
        let formals = Sexpr::wrap_list(vec![
            Sexpr::Symbol(a),
            Sexpr::wrap_list(vec![Sexpr::Symbol(rest)]),
            Sexpr::Symbol(b),
        ]);
        assert_eq!(
            ClosureParameters::from_formals(&formals).unwrap_err(),
            BadFormals::VariadicNotLast
        );
    }

    #[test]
    fn non_symbol_formals_are_rejected() {
        let formals = Sexpr::wrap_list(vec![Sexpr::Integer(1)]);
        assert_eq!(
            ClosureParameters::from_formals(&formals).unwrap_err(),
            BadFormals::FormalNotASymbol
        );
        assert_eq!(
            ClosureParameters::from_formals(&Sexpr::Integer(1)).unwrap_err(),
            BadFormals::NotSymbolOrList
        );
    }

    #[test]
    fn list_equality_is_elementwise_and_symbol_equality_is_identity() {
        let mut provider = SymbolProvider::new();
        let a = provider.intern("a", false);
        let left = Sexpr::wrap_list(vec![Sexpr::Symbol(a.clone()), Sexpr::Integer(1)]);
        let right = Sexpr::wrap_list(vec![Sexpr::Symbol(a), Sexpr::Integer(1)]);
        assert_eq!(left, right);
        let imposter = Sexpr::wrap_list(vec![
            Sexpr::Symbol(crate::symbols::Symbol::new(8)),
            Sexpr::Integer(1),
        ]);
        assert_ne!(left, imposter);
    }
}
