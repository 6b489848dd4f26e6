//! Argument specifications for cost functions.
//!
//! A cost function over a product manifold may spread one logical variable
//! across several positional slots (e.g. a point on `Sphere x Stiefel` is
//! two tensors). The argument specification records how the positional
//! slots are named and grouped so that backends know the arity and
//! structure of their inputs.
//!
//! Entries are either names (tracing backends bind arguments by name),
//! backend-specific symbolic placeholders (graph backends), or nested
//! groups of either.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// One entry of an argument specification.
#[derive(Clone)]
pub enum Arg {
    /// A named positional slot.
    Name(String),
    /// A backend-specific symbolic placeholder standing in for a slot.
    Placeholder(Rc<dyn Any>),
    /// Several entries grouped into one logical variable.
    Group(Vec<Arg>),
}

impl Arg {
    /// Creates a named entry.
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Creates a placeholder entry from a backend-specific object.
    pub fn placeholder<P: Any>(value: P) -> Self {
        Self::Placeholder(Rc::new(value))
    }

    /// Creates a group of named entries.
    pub fn group<I>(names: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::Group(names.into_iter().map(Arg::name).collect())
    }

    /// Returns the placeholder object, if this entry is a placeholder.
    pub fn as_placeholder(&self) -> Option<&Rc<dyn Any>> {
        match self {
            Self::Placeholder(value) => Some(value),
            _ => None,
        }
    }

    /// Number of positional slots covered by this entry.
    pub fn flat_len(&self) -> usize {
        match self {
            Self::Name(_) | Self::Placeholder(_) => 1,
            Self::Group(entries) => entries.iter().map(Arg::flat_len).sum(),
        }
    }

    fn flatten_into(&self, flat: &mut Vec<Arg>) {
        match self {
            Self::Group(entries) => {
                for entry in entries {
                    entry.flatten_into(flat);
                }
            }
            leaf => flat.push(leaf.clone()),
        }
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.debug_tuple("Name").field(name).finish(),
            Self::Placeholder(_) => f.write_str("Placeholder(..)"),
            Self::Group(entries) => f.debug_tuple("Group").field(entries).finish(),
        }
    }
}

impl PartialEq for Arg {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Name(a), Self::Name(b)) => a == b,
            // Placeholders are backend objects without structural equality;
            // compare by identity.
            (Self::Placeholder(a), Self::Placeholder(b)) => Rc::ptr_eq(a, b),
            (Self::Group(a), Self::Group(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for Arg {
    fn from(name: &str) -> Self {
        Self::name(name)
    }
}

impl From<String> for Arg {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

/// An ordered, possibly nested, description of a cost function's logical
/// parameters.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ArgSpec {
    entries: Vec<Arg>,
}

impl ArgSpec {
    /// Creates a specification from explicit entries.
    pub fn new(entries: Vec<Arg>) -> Self {
        Self { entries }
    }

    /// Creates a flat specification from parameter names.
    pub fn from_names<I>(names: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            entries: names.into_iter().map(Arg::name).collect(),
        }
    }

    /// Number of logical variables (top-level entries).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the specification has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of positional slots, counting group members.
    pub fn flat_len(&self) -> usize {
        self.entries.iter().map(Arg::flat_len).sum()
    }

    /// The top-level entries in order.
    pub fn entries(&self) -> &[Arg] {
        &self.entries
    }
}

/// Flattens a specification into its leaf entries in depth-first order.
///
/// Groups are dissolved; the result has exactly `spec.flat_len()` entries,
/// one per positional slot. This is the binding step used by the graph
/// decorator to hand placeholder objects to the build closure in the order
/// the compiled function will later receive its tensors.
pub fn flatten_arguments(spec: &ArgSpec) -> Vec<Arg> {
    let mut flat = Vec::with_capacity(spec.flat_len());
    for entry in spec.entries() {
        entry.flatten_into(&mut flat);
    }
    flat
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_names() {
        let spec = ArgSpec::from_names(["x", "y"]);
        assert_eq!(spec.len(), 2);
        assert_eq!(spec.flat_len(), 2);
        assert_eq!(
            spec.entries(),
            &[Arg::name("x"), Arg::name("y")]
        );
    }

    #[test]
    fn test_grouped_spec_arity() {
        let spec = ArgSpec::new(vec![Arg::group(["x1", "x2"]), Arg::name("y")]);
        assert_eq!(spec.len(), 2);
        assert_eq!(spec.flat_len(), 3);
    }

    #[test]
    fn test_flatten_preserves_order() {
        let spec = ArgSpec::new(vec![
            Arg::group(["x1", "x2"]),
            Arg::name("y"),
            Arg::Group(vec![Arg::name("z"), Arg::group(["w1", "w2"])]),
        ]);
        let flat = flatten_arguments(&spec);
        let names: Vec<_> = flat
            .iter()
            .map(|entry| match entry {
                Arg::Name(name) => name.as_str(),
                _ => panic!("expected names only"),
            })
            .collect();
        assert_eq!(names, ["x1", "x2", "y", "z", "w1", "w2"]);
    }

    #[test]
    fn test_placeholder_identity_equality() {
        let a = Arg::placeholder(7_usize);
        let b = a.clone();
        let c = Arg::placeholder(7_usize);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_empty_spec() {
        let spec = ArgSpec::default();
        assert!(spec.is_empty());
        assert_eq!(spec.flat_len(), 0);
        assert!(flatten_arguments(&spec).is_empty());
    }
}
