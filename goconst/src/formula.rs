//! Formula trees
//!
//! A [`Formula`] is an unevaluated arithmetic expression over the group
//! counter. Formulas are built with ordinary Rust operators starting from the
//! [`iota`] leaf (`1 << iota`, `iota * 10 + 5`) and evaluated against an
//! explicit [`Counter`], which keeps evaluation a pure function.
use log::trace;
use num_bigint::BigInt;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::{EnumIs, EnumIter, IntoEnumIterator};

use crate::{utils::ConstResult, value::Value};

/// Binary operators available inside a formula.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, EnumIter)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    /// True division, always produces a float.
    Div,
    FloorDiv,
    Pow,
    LShift,
    RShift,
}

impl BinaryOp {
    /// Creates a [`BinaryOp`] from its operator symbol.
    pub fn from_str(s: &str) -> Option<Self> {
        BinaryOp::iter().find(|op| op.to_str() == s)
    }

    /// Returns the operator symbol of the [`BinaryOp`].
    pub fn to_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Pow => "**",
            BinaryOp::LShift => "<<",
            BinaryOp::RShift => ">>",
        }
    }

    /// Shift operators are only defined for integers.
    pub fn is_shift(&self) -> bool {
        matches!(self, BinaryOp::LShift | BinaryOp::RShift)
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

/// Position of the group counter.
///
/// The counter starts at zero and only moves forward. Each evaluation of a
/// formula that references the counter consumes exactly one position.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Counter(pub u64);

impl Counter {
    pub const START: Counter = Counter(0);

    pub fn next(self) -> Counter {
        Counter(self.0 + 1)
    }
}

/// One step of a constant-generation expression.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Formula {
    /// The group counter.
    Counter,
    Binary {
        op: BinaryOp,
        lhs: Box<Operand>,
        rhs: Box<Operand>,
    },
}

/// The counter-seed leaf every formula grows from.
#[allow(non_upper_case_globals)]
pub const iota: Formula = Formula::Counter;

/// Either side of a formula node, or a term assigned to a group member.
#[derive(Debug, Clone, PartialEq, EnumIs)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Operand {
    Value(Value),
    Formula(Formula),
}

impl Operand {
    fn value_at(&self, counter: Counter) -> ConstResult<Value> {
        match self {
            Operand::Value(value) => Ok(value.clone()),
            Operand::Formula(formula) => formula.value_at(counter),
        }
    }
}

impl Formula {
    /// Builds a new node. Operands are not checked; mismatches surface on evaluation.
    pub fn binary(op: BinaryOp, lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> Formula {
        Formula::Binary {
            op,
            lhs: Box::new(lhs.into()),
            rhs: Box::new(rhs.into()),
        }
    }

    /// Returns true if any leaf of the tree is the counter.
    pub fn uses_counter(&self) -> bool {
        match self {
            Formula::Counter => true,
            Formula::Binary { lhs, rhs, .. } => [&**lhs, &**rhs].into_iter().any(
                |operand| matches!(operand, Operand::Formula(formula) if formula.uses_counter()),
            ),
        }
    }

    /// Evaluates the tree with every counter leaf bound to `counter`.
    pub fn value_at(&self, counter: Counter) -> ConstResult<Value> {
        match self {
            Formula::Counter => Ok(Value::from(counter.0)),
            Formula::Binary { op, lhs, rhs } => {
                let lhs = lhs.value_at(counter)?;
                let rhs = rhs.value_at(counter)?;
                Value::apply(*op, &lhs, &rhs)
            }
        }
    }

    /// Evaluates the tree at `counter` and returns the counter to use for the
    /// next evaluation.
    pub fn evaluate(&self, counter: Counter) -> ConstResult<(Value, Counter)> {
        let value = self.value_at(counter)?;
        let next = if self.uses_counter() {
            counter.next()
        } else {
            counter
        };
        trace!("Evaluated `{}` at counter {} to {}", self, counter.0, value);
        Ok((value, next))
    }

    pub fn floor_div(self, rhs: impl Into<Operand>) -> Formula {
        Formula::binary(BinaryOp::FloorDiv, self, rhs)
    }

    /// `lhs // self`
    pub fn rfloor_div(self, lhs: impl Into<Operand>) -> Formula {
        Formula::binary(BinaryOp::FloorDiv, lhs, self)
    }

    pub fn pow(self, rhs: impl Into<Operand>) -> Formula {
        Formula::binary(BinaryOp::Pow, self, rhs)
    }

    /// `lhs ** self`
    pub fn rpow(self, lhs: impl Into<Operand>) -> Formula {
        Formula::binary(BinaryOp::Pow, lhs, self)
    }
}

impl std::fmt::Display for Formula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Formula::Counter => write!(f, "iota"),
            Formula::Binary { op, lhs, rhs } => write!(f, "({} {} {})", lhs, op, rhs),
        }
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Value(Value::Str(s)) => write!(f, "{:?}", s),
            Operand::Value(value) => write!(f, "{}", value),
            Operand::Formula(formula) => write!(f, "{}", formula),
        }
    }
}

impl From<Formula> for Operand {
    fn from(value: Formula) -> Self {
        Operand::Formula(value)
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Value(value)
    }
}

macro_rules! impl_operand_from {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for Operand {
                fn from(value: $ty) -> Self {
                    Operand::Value(Value::from(value))
                }
            }
        )+
    };
}

impl_operand_from!(i32, i64, u32, u64, usize, bool, f64, BigInt, &str, String);

macro_rules! impl_formula_ops {
    (@reflected $trait:ident, $method:ident, $op:ident: $($ty:ty),+) => {
        $(
            impl std::ops::$trait<Formula> for $ty {
                type Output = Formula;

                fn $method(self, rhs: Formula) -> Formula {
                    Formula::binary(BinaryOp::$op, self, rhs)
                }
            }
        )+
    };
    ($($trait:ident, $method:ident => $op:ident);+ $(;)?) => {
        $(
            impl<T: Into<Operand>> std::ops::$trait<T> for Formula {
                type Output = Formula;

                fn $method(self, rhs: T) -> Formula {
                    Formula::binary(BinaryOp::$op, self, rhs)
                }
            }

            impl_formula_ops!(@reflected $trait, $method, $op: i32, i64, u32, u64, f64, BigInt, Value);
        )+
    };
}

impl_formula_ops! {
    Add, add => Add;
    Sub, sub => Sub;
    Mul, mul => Mul;
    Div, div => Div;
    Shl, shl => LShift;
    Shr, shr => RShift;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_order_is_preserved() {
        assert_eq!(
            1 << iota,
            Formula::binary(BinaryOp::LShift, 1, Formula::Counter)
        );
        assert_eq!(
            iota - 1,
            Formula::binary(BinaryOp::Sub, Formula::Counter, 1)
        );
        assert_eq!((10_i32 - iota).to_string(), "(10 - iota)");
    }

    #[test]
    fn evaluation_is_pure_and_advances_counter_once() {
        let formula = iota * iota + 1;
        let (value, next) = formula.evaluate(Counter(3)).unwrap();
        assert_eq!(value, 10);
        assert_eq!(next, Counter(4));

        // Same input, same output.
        assert_eq!(formula.evaluate(Counter(3)).unwrap(), (Value::from(10), Counter(4)));
    }

    #[test]
    fn floor_div_and_pow_builders() {
        assert_eq!(iota.floor_div(2).value_at(Counter(7)).unwrap(), 3);
        assert_eq!(iota.pow(2).value_at(Counter(5)).unwrap(), 25);
        assert_eq!(iota.rpow(2).value_at(Counter(5)).unwrap(), 32);
        assert_eq!(iota.rfloor_div(100).value_at(Counter(7)).unwrap(), 14);
    }

    #[test]
    fn type_errors_surface_at_evaluation() {
        let formula = iota + "suffix";
        assert!(
            formula
                .evaluate(Counter::START)
                .unwrap_err()
                .is_unsupported_operands()
        );
    }

    #[test]
    fn operator_symbols_round_trip() {
        for op in BinaryOp::iter() {
            assert_eq!(BinaryOp::from_str(op.to_str()), Some(op));
        }
    }
}
