//! Constant groups
//!
//! A [`ConstGroup`] is the namespace that is live while a block of constants is
//! being declared. Assigning a [`Formula`] remembers it; every member that is
//! later referenced without a value is derived from the remembered formula at
//! the next counter position. Every assigned formula starts a new run with the
//! counter back at zero. Once the block is complete the group is frozen into a
//! [`ConstSet`].
use std::collections::HashMap;

use log::{debug, trace};

use crate::{
    formula::{Counter, Formula, Operand},
    utils::{ConstResult, Error},
    value::Value,
};

/// Name that bootstraps a fresh counter leaf inside a group.
pub const COUNTER_SEED: &str = "iota";

/// Prefix of internal names that are never derived from a formula.
pub const RESERVED_PREFIX: &str = "__";

/// Namespace of a constant group under construction.
#[derive(Debug, Clone)]
pub struct ConstGroup {
    name: String,
    members: Vec<(String, Value)>,
    index: HashMap<String, usize>,
    formula: Option<Formula>,
    counter: Counter,
}

impl ConstGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            index: HashMap::new(),
            formula: None,
            counter: Counter::START,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The formula that unassigned members are derived from, if any.
    pub fn formula(&self) -> Option<&Formula> {
        self.formula.as_ref()
    }

    /// Current counter position.
    pub fn counter(&self) -> Counter {
        self.counter
    }

    /// Assigns `term` to the member `name`.
    ///
    /// A formula becomes the remembered formula and is evaluated right away
    /// with a counter starting over at zero; a plain value is stored as is.
    pub fn assign(&mut self, name: &str, term: impl Into<Operand>) -> ConstResult<&Value> {
        match term.into() {
            Operand::Formula(formula) => {
                let (value, next) = formula.evaluate(Counter::START)?;
                self.counter = next;
                self.formula = Some(formula);
                Ok(self.store(name, value))
            }
            Operand::Value(value) => Ok(self.store(name, value)),
        }
    }

    /// Looks up the member `name`.
    ///
    /// Existing members are returned without touching the counter. The counter
    /// seed yields a fresh counter leaf. Any other name is derived from the
    /// remembered formula and memoized.
    pub fn lookup(&mut self, name: &str) -> ConstResult<Operand> {
        if let Some(value) = self.get(name) {
            return Ok(Operand::Value(value.clone()));
        }

        if name == COUNTER_SEED {
            return Ok(Operand::Formula(Formula::Counter));
        }

        self.resolve(name).map(|value| Operand::Value(value.clone()))
    }

    /// Looks up the member `name` as a concrete value, deriving it if needed.
    ///
    /// Unlike [`ConstGroup::lookup`] the counter seed is not special here.
    pub fn resolve(&mut self, name: &str) -> ConstResult<&Value> {
        if let Some(&position) = self.index.get(name) {
            return Ok(&self.members[position].1);
        }

        if name.starts_with(RESERVED_PREFIX) {
            return Err(Error::ReservedName {
                group: self.name.clone(),
                name: name.to_string(),
            });
        }

        let Some(formula) = self.formula.clone() else {
            return Err(Error::UndefinedMember {
                group: self.name.clone(),
                name: name.to_string(),
            });
        };

        let value = self.draw(&formula)?;
        Ok(self.store(name, value))
    }

    /// Returns an already resolved member.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.index.get(name).map(|&position| &self.members[position].1)
    }

    /// Freezes the group into an immutable set of constants.
    pub fn finish(self) -> ConstSet {
        debug!(
            "Constant group `{}` finished with {} member(s)",
            self.name,
            self.members.len()
        );

        ConstSet {
            name: self.name,
            members: self.members,
            index: self.index,
        }
    }

    fn draw(&mut self, formula: &Formula) -> ConstResult<Value> {
        let (value, next) = formula.evaluate(self.counter)?;
        self.counter = next;
        Ok(value)
    }

    fn store(&mut self, name: &str, value: Value) -> &Value {
        trace!("{}.{} = {}", self.name, name, value);

        let position = match self.index.get(name) {
            Some(&position) => {
                self.members[position].1 = value;
                position
            }
            None => {
                self.members.push((name.to_string(), value));
                self.index.insert(name.to_string(), self.members.len() - 1);
                self.members.len() - 1
            }
        };

        &self.members[position].1
    }
}

/// Finalized constants of a group, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstSet {
    name: String,
    members: Vec<(String, Value)>,
    index: HashMap<String, usize>,
}

impl ConstSet {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.index.get(name).map(|&position| &self.members[position].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Iterates over members in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.members
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|(name, _)| name.as_str())
    }
}

impl std::ops::Index<&str> for ConstSet {
    type Output = Value;

    fn index(&self, name: &str) -> &Value {
        match self.get(name) {
            Some(value) => value,
            None => panic!("constant group `{}` has no member `{}`", self.name, name),
        }
    }
}

/// Declares a constant group and freezes it into a
/// [`ConstSet`](crate::group::ConstSet).
///
/// Members with a value are assigned; bare members are derived from the last
/// formula. Evaluates to a `ConstResult<ConstSet>`.
///
/// ```
/// use goconst::{const_group, iota};
///
/// let flags = const_group! {
///     Flags {
///         A = 1 << iota,
///         B,
///         C,
///     }
/// }
/// .unwrap();
///
/// assert_eq!(flags["C"], 4);
/// ```
#[macro_export]
macro_rules! const_group {
    (@member $group:ident, $member:ident = $value:expr) => {
        $group.assign(stringify!($member), $value)?;
    };
    (@member $group:ident, $member:ident) => {
        $group.resolve(stringify!($member))?;
    };
    ($name:ident { $( $member:ident $( = $value:expr )? ),* $(,)? }) => {
        (|| -> $crate::utils::ConstResult<$crate::group::ConstSet> {
            let mut group = $crate::group::ConstGroup::new(stringify!($name));
            $( $crate::const_group!(@member group, $member $( = $value )?); )*
            Ok(group.finish())
        })()
    };
}
