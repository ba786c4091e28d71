//! Concrete constant values
//!
//! Constants produced by a group are arbitrary-precision integers, floats or
//! strings. Arithmetic between them mirrors the numeric tower of a dynamic
//! language: integers never overflow, `/` always produces a float, `//` floors
//! and mixing an integer with a float promotes to float.
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, ToPrimitive, Zero};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::EnumIs;

use crate::{
    formula::BinaryOp,
    utils::{ConstResult, Error},
};

/// A resolved constant.
#[derive(Debug, Clone, EnumIs)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Value {
    Int(BigInt),
    Float(f64),
    Str(String),
}

impl Value {
    /// Name of the value kind, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
        }
    }

    pub fn as_int(&self) -> Option<&BigInt> {
        match self {
            Value::Int(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the value as an `i64` if it is an integer that fits.
    pub fn to_i64(&self) -> Option<i64> {
        self.as_int().and_then(ToPrimitive::to_i64)
    }

    /// Returns the value as a float, promoting integers.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Int(value) => value.to_f64().filter(|f| f.is_finite()),
            Value::Float(value) => Some(*value),
            Value::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Applies `op` to `lhs` and `rhs`.
    pub fn apply(op: BinaryOp, lhs: &Value, rhs: &Value) -> ConstResult<Value> {
        match (lhs, rhs) {
            (Value::Int(a), Value::Int(b)) => int_op(op, a, b),
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                if op.is_shift() {
                    return Err(unsupported(op, lhs, rhs));
                }
                let a = lhs.to_f64().ok_or(Error::Overflow { op })?;
                let b = rhs.to_f64().ok_or(Error::Overflow { op })?;
                float_op(op, a, b)
            }
            (Value::Str(a), Value::Str(b)) if op == BinaryOp::Add => {
                Ok(Value::Str(format!("{a}{b}")))
            }
            (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s))
                if op == BinaryOp::Mul =>
            {
                repeat(s, n)
            }
            _ => Err(unsupported(op, lhs, rhs)),
        }
    }
}

fn unsupported(op: BinaryOp, lhs: &Value, rhs: &Value) -> Error {
    Error::UnsupportedOperands {
        op,
        lhs: lhs.type_name(),
        rhs: rhs.type_name(),
    }
}

fn int_op(op: BinaryOp, a: &BigInt, b: &BigInt) -> ConstResult<Value> {
    let value = match op {
        BinaryOp::Add => Value::Int(a + b),
        BinaryOp::Sub => Value::Int(a - b),
        BinaryOp::Mul => Value::Int(a * b),
        BinaryOp::Div => {
            if b.is_zero() {
                return Err(Error::ZeroDivision { op });
            }
            let lhs = a.to_f64().filter(|f| f.is_finite());
            let rhs = b.to_f64().filter(|f| f.is_finite());
            match (lhs, rhs) {
                (Some(lhs), Some(rhs)) => Value::Float(lhs / rhs),
                _ => return Err(Error::Overflow { op }),
            }
        }
        BinaryOp::FloorDiv => {
            if b.is_zero() {
                return Err(Error::ZeroDivision { op });
            }
            Value::Int(a.div_floor(b))
        }
        BinaryOp::Pow => {
            if b.is_negative() {
                if a.is_zero() {
                    return Err(Error::ZeroDivision { op });
                }
                let base = a.to_f64().ok_or(Error::Overflow { op })?;
                let exp = b.to_f64().ok_or(Error::Overflow { op })?;
                Value::Float(base.powf(exp))
            } else {
                let exp = b.to_u32().ok_or(Error::Overflow { op })?;
                Value::Int(a.pow(exp))
            }
        }
        BinaryOp::LShift => {
            if b.is_negative() {
                return Err(Error::NegativeShiftCount { op });
            }
            let count = b.to_usize().ok_or(Error::Overflow { op })?;
            Value::Int(a << count)
        }
        BinaryOp::RShift => {
            if b.is_negative() {
                return Err(Error::NegativeShiftCount { op });
            }
            match b.to_usize() {
                Some(count) => Value::Int(a >> count),
                // Shifted past every significant bit.
                None if a.is_negative() => Value::Int(BigInt::from(-1)),
                None => Value::Int(BigInt::zero()),
            }
        }
    };

    Ok(value)
}

fn float_op(op: BinaryOp, a: f64, b: f64) -> ConstResult<Value> {
    let value = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(Error::ZeroDivision { op });
            }
            a / b
        }
        BinaryOp::FloorDiv => {
            if b == 0.0 {
                return Err(Error::ZeroDivision { op });
            }
            float_floor_div(a, b)
        }
        BinaryOp::Pow => {
            if a == 0.0 && b < 0.0 {
                return Err(Error::ZeroDivision { op });
            }
            if a < 0.0 && b.fract() != 0.0 {
                // Would be a complex number.
                return Err(Error::UnsupportedOperands {
                    op,
                    lhs: "float",
                    rhs: "float",
                });
            }
            let result = a.powf(b);
            if result.is_infinite() && a.is_finite() && b.is_finite() {
                return Err(Error::Overflow { op });
            }
            result
        }
        BinaryOp::LShift | BinaryOp::RShift => unreachable!("shifts are rejected for floats"),
    };

    Ok(Value::Float(value))
}

/// Floor division derived from the remainder, so `1.0 // 0.1` is `9.0` rather
/// than the `10.0` that flooring the rounded quotient gives.
fn float_floor_div(a: f64, b: f64) -> f64 {
    let rem = a % b;
    let mut div = (a - rem) / b;
    if rem != 0.0 && (b < 0.0) != (rem < 0.0) {
        div -= 1.0;
    }

    if div == 0.0 {
        return (0.0_f64).copysign(a / b);
    }

    let floored = div.floor();
    if div - floored > 0.5 {
        floored + 1.0
    } else {
        floored
    }
}

fn repeat(s: &str, n: &BigInt) -> ConstResult<Value> {
    if !n.is_positive() {
        return Ok(Value::Str(String::new()));
    }
    let count = n.to_usize().ok_or(Error::Overflow { op: BinaryOp::Mul })?;
    Ok(Value::Str(s.repeat(count)))
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                a.to_f64().is_some_and(|a| a == *b)
            }
            _ => false,
        }
    }
}

macro_rules! impl_eq_int {
    ($($ty:ty),+) => {
        $(
            impl PartialEq<$ty> for Value {
                fn eq(&self, other: &$ty) -> bool {
                    *self == Value::from(*other)
                }
            }
        )+
    };
}

impl_eq_int!(i32, i64, u64);

impl PartialEq<f64> for Value {
    fn eq(&self, other: &f64) -> bool {
        *self == Value::Float(*other)
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(value) => write!(f, "{}", value),
            Value::Float(value) if value.is_nan() => write!(f, "nan"),
            Value::Float(value) if value.is_infinite() => {
                write!(f, "{}", if *value > 0.0 { "inf" } else { "-inf" })
            }
            Value::Float(value) => write!(f, "{:?}", value),
            Value::Str(value) => write!(f, "{}", value),
        }
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Int(BigInt::from(value))
                }
            }
        )+
    };
}

impl_from_int!(i32, i64, u32, u64, usize);

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Int(BigInt::from(value as u8))
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}
