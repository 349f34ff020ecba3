//! Instance sets: insertion-ordered, structurally deduplicated.

use std::fmt;
use std::hash::Hash;

use rustc_hash::FxHashSet;

use fgg_syntax::Type;

/// A method instantiation: receiver type, method name, method type
/// arguments.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethInst {
    pub recv: Type,
    pub meth: String,
    pub targs: Vec<Type>,
}

impl MethInst {
    pub fn new(recv: Type, meth: impl Into<String>, targs: Vec<Type>) -> Self {
        MethInst { recv, meth: meth.into(), targs }
    }

    /// The receiver's declared type name, if it is a named type.
    pub fn recv_decl(&self) -> Option<&str> {
        self.recv.as_named().map(|n| n.name.as_str())
    }
}

impl fmt::Display for MethInst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.recv, self.meth)?;
        if !self.targs.is_empty() {
            let targs: Vec<String> = self.targs.iter().map(Type::to_string).collect();
            write!(f, "({})", targs.join(", "))?;
        }
        write!(f, "()")
    }
}

/// A monotonically growing set that remembers insertion order.
#[derive(Clone, Debug)]
pub struct InstanceSet<T> {
    items: Vec<T>,
    seen: FxHashSet<T>,
}

impl<T> Default for InstanceSet<T> {
    fn default() -> Self {
        InstanceSet { items: Vec::new(), seen: FxHashSet::default() }
    }
}

impl<T: Clone + Eq + Hash> InstanceSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `item`, returning whether it was new.
    pub fn insert(&mut self, item: T) -> bool {
        if self.seen.contains(&item) {
            return false;
        }
        self.seen.insert(item.clone());
        self.items.push(item);
        true
    }

    pub fn contains(&self, item: &T) -> bool {
        self.seen.contains(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// A copy of the current contents, for iterating while inserting.
    pub fn snapshot(&self) -> Vec<T> {
        self.items.clone()
    }
}

impl<'a, T> IntoIterator for &'a InstanceSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
