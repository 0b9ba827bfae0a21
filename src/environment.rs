use crate::symbols::{Symbol, SymbolProvider};
use crate::types::Sexpr;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One scope in a chain. Bindings live in a local map; anything not found
/// locally is looked up through the parent. Every environment in a chain
/// shares the same symbol provider.
pub struct Environment {
    bindings: RefCell<HashMap<Symbol, Sexpr>>,
    parent: Option<Rc<Environment>>,
    symbols: Rc<RefCell<SymbolProvider>>,
}

impl Environment {
    /// A root scope. Roots have no parent, so the provider is mandatory.
    pub fn new(symbols: Rc<RefCell<SymbolProvider>>) -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
            symbols,
        })
    }

    pub fn spawn_from(parent: &Rc<Environment>) -> Rc<Environment> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent.clone()),
            symbols: parent.symbols.clone(),
        })
    }

    pub fn symbols(&self) -> &Rc<RefCell<SymbolProvider>> {
        &self.symbols
    }

    /// Bind in this scope, shadowing any ancestor binding. Never touches a
    /// parent. Chainable.
    pub fn set(&self, key: Symbol, value: Sexpr) -> &Self {
        self.bindings.borrow_mut().insert(key, value);
        self
    }

    /// Walk the chain for `key`. A hit found in an ancestor is copied into
    /// this scope on the way out, so later rebinding of the ancestor is no
    /// longer observed from here.
    pub fn get(&self, key: &Symbol) -> Option<Sexpr> {
        if let Some(value) = self.bindings.borrow().get(key) {
            return Some(value.clone());
        }
        let inherited = self.parent.as_ref()?.get(key)?;
        self.bindings
            .borrow_mut()
            .insert(key.clone(), inherited.clone());
        Some(inherited)
    }

    pub fn get_named(&self, literal: &str) -> Option<Sexpr> {
        let key = self.symbols.borrow().lookup(literal)?;
        self.get(&key)
    }

    pub fn contains(&self, key: &Symbol) -> bool {
        self.bindings.borrow().contains_key(key)
            || self.parent.as_ref().map_or(false, |p| p.contains(key))
    }

    pub fn contains_named(&self, literal: &str) -> bool {
        match self.symbols.borrow().lookup(literal) {
            Some(key) => self.contains(&key),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Rc<Environment> {
        Environment::new(Rc::new(RefCell::new(SymbolProvider::new())))
    }

    #[test]
    fn set_then_get_is_transparent() {
        let env = fresh();
        let key = env.symbols().borrow_mut().intern("x", false);
        env.set(key.clone(), Sexpr::Integer(1));
        assert_eq!(env.get(&key), Some(Sexpr::Integer(1)));
        assert!(env.contains(&key));
        assert_eq!(env.get_named("x"), Some(Sexpr::Integer(1)));
    }

    #[test]
    fn set_chains() {
        let env = fresh();
        let (a, b) = {
            let mut symbols = env.symbols().borrow_mut();
            (symbols.intern("a", false), symbols.intern("b", false))
        };
        env.set(a.clone(), Sexpr::Integer(1))
            .set(b.clone(), Sexpr::Integer(2));
        assert_eq!(env.get(&a), Some(Sexpr::Integer(1)));
        assert_eq!(env.get(&b), Some(Sexpr::Integer(2)));
    }

    #[test]
    fn lookup_walks_parents_and_caches_at_the_leaf() {
        let parent = fresh();
        let key = parent.symbols().borrow_mut().intern("x", false);
        parent.set(key.clone(), Sexpr::Integer(7));
        let child = Environment::spawn_from(&parent);
        assert_eq!(child.get(&key), Some(Sexpr::Integer(7)));
        // The hit was snapshotted into the child, so rebinding the ancestor
        // is invisible from here on.
        parent.set(key.clone(), Sexpr::Integer(8));
        assert_eq!(child.get(&key), Some(Sexpr::Integer(7)));
        assert_eq!(parent.get(&key), Some(Sexpr::Integer(8)));
    }

    #[test]
    fn shadowing_never_touches_the_parent() {
        let parent = fresh();
        let key = parent.symbols().borrow_mut().intern("x", false);
        parent.set(key.clone(), Sexpr::Integer(1));
        let child = Environment::spawn_from(&parent);
        child.set(key.clone(), Sexpr::Integer(2));
        assert_eq!(child.get(&key), Some(Sexpr::Integer(2)));
        assert_eq!(parent.get(&key), Some(Sexpr::Integer(1)));
    }

    #[test]
    fn missing_bindings_are_not_found() {
        let env = fresh();
        let key = env.symbols().borrow_mut().intern("ghost", false);
        assert_eq!(env.get(&key), None);
        assert!(!env.contains(&key));
        assert!(env.get_named("ghost").is_none());
        assert!(!env.contains_named("never-interned"));
    }

    #[test]
    fn grandparent_bindings_are_reachable() {
        let root = fresh();
        let key = root.symbols().borrow_mut().intern("x", false);
        root.set(key.clone(), Sexpr::Integer(3));
        let mid = Environment::spawn_from(&root);
        let leaf = Environment::spawn_from(&mid);
        assert_eq!(leaf.get(&key), Some(Sexpr::Integer(3)));
    }
}
