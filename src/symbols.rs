use bimap::BiMap;
use derive_more::Deref;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

#[derive(Debug)]
pub struct SymbolCell {
    pub index: i32,
}

/// An interned atom. Two symbols are equal only when they are the same
/// allocation; a fresh symbol that happens to share an index with a reserved
/// one does not compare equal to it.
#[derive(Debug, Clone, Deref)]
pub struct Symbol(Rc<SymbolCell>);

impl Symbol {
    pub fn new(index: i32) -> Self {
        Symbol(Rc::new(SymbolCell { index }))
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.index.hash(state);
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Symbol({})]", self.index)
    }
}

/// How many core symbols every provider starts with: Unknown, Open, Close,
/// Quote, Params, This, Let, Lambda.
const RESERVED: usize = 8;

/// The append-only, bijective literal <-> symbol table. Symbols are never
/// removed or rebound once interned.
pub struct SymbolProvider {
    table: BiMap<String, Symbol>,
    core: Vec<Symbol>,
}

impl SymbolProvider {
    pub fn new() -> Self {
        Self::with_core(default_core())
    }

    /// Seed a provider from `(literal, symbol)` pairs. The seed must be the
    /// exact builtin prefix: the i-th symbol's index must be `-i`, and the
    /// eight reserved roles must all be covered. Anything else is a
    /// programming error, not a recoverable condition.
    pub fn with_core<I>(seed: I) -> Self
    where
        I: IntoIterator<Item = (String, Symbol)>,
    {
        let mut table = BiMap::new();
        let mut core = Vec::new();
        for (literal, symbol) in seed {
            let expected = -(table.len() as i32);
            if symbol.index != expected {
                panic!(
                    "core symbol {:?} has index {}, expected {}",
                    literal, symbol.index, expected
                );
            }
            table.insert(literal, symbol.clone());
            core.push(symbol);
        }
        if core.len() < RESERVED {
            panic!(
                "core seed supplies {} symbols; all {} reserved roles are required",
                core.len(),
                RESERVED
            );
        }
        SymbolProvider { table, core }
    }

    pub fn contains(&self, literal: &str) -> bool {
        self.table.contains_left(literal)
    }

    /// Find the symbol for `literal` without interning it.
    pub fn lookup(&self, literal: &str) -> Option<Symbol> {
        self.table.get_by_left(literal).cloned()
    }

    /// Return the symbol for `literal`, allocating one if absent. Builtins
    /// take the next index below zero, user symbols the next one above.
    pub fn intern(&mut self, literal: &str, as_builtin: bool) -> Symbol {
        if let Some(symbol) = self.table.get_by_left(literal) {
            return symbol.clone();
        }
        let count = self.table.len() as i32;
        let symbol = Symbol::new(if as_builtin { -count } else { count });
        self.table.insert(literal.to_string(), symbol.clone());
        symbol
    }

    /// The literal a symbol was interned under. Asking about a symbol this
    /// provider never minted is an invariant violation.
    pub fn name_of(&self, symbol: &Symbol) -> &str {
        match self.table.get_by_right(symbol) {
            Some(literal) => literal,
            None => panic!("no literal interned for {}", symbol),
        }
    }

    pub fn unknown(&self) -> &Symbol {
        &self.core[0]
    }
    pub fn open(&self) -> &Symbol {
        &self.core[1]
    }
    pub fn close(&self) -> &Symbol {
        &self.core[2]
    }
    pub fn quote(&self) -> &Symbol {
        &self.core[3]
    }
    pub fn params(&self) -> &Symbol {
        &self.core[4]
    }
    pub fn this(&self) -> &Symbol {
        &self.core[5]
    }
    pub fn let_(&self) -> &Symbol {
        &self.core[6]
    }
    pub fn lambda(&self) -> &Symbol {
        &self.core[7]
    }

    /// Symbols with an index strictly below this dispatch as operator
    /// builtins; Open, Close, Quote, Params and This sit on or above it.
    pub fn builtin_threshold(&self) -> i32 {
        self.this().index
    }
}

impl Default for SymbolProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// The conventional core table. Callers wanting unforgeable `params`/`this`
/// literals can build their own seed and go through `with_core`.
pub fn default_core() -> Vec<(String, Symbol)> {
    ["", "(", ")", "`", "params", "this", "let", "=>"]
        .iter()
        .enumerate()
        .map(|(i, literal)| (literal.to_string(), Symbol::new(-(i as i32))))
        .collect()
}
