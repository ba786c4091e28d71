use strum::EnumIs;
use thiserror::Error;

use crate::formula::BinaryOp;

#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIs, Error)]
pub enum Error {
    /// A member was referenced before any formula was established for its group.
    #[error(
        "Constant group `{group}` has no member named `{name}` and no formula to derive it from."
    )]
    UndefinedMember { group: String, name: String },

    /// Internal names are never derived from the remembered formula.
    #[error("The name `{name}` is reserved and cannot be derived in constant group `{group}`.")]
    ReservedName { group: String, name: String },

    /// Division, floor division or a negative power of zero.
    #[error("Division by zero while evaluating `{op}`.")]
    ZeroDivision { op: BinaryOp },

    /// Shift operators reject a negative shift amount.
    #[error("Negative shift count while evaluating `{op}`.")]
    NegativeShiftCount { op: BinaryOp },

    /// The result (or an intermediate conversion) does not fit the value model.
    #[error("Numeric overflow while evaluating `{op}`.")]
    Overflow { op: BinaryOp },

    /// The operator is not defined for the operand kinds.
    #[error("Unsupported operand types for `{op}`: `{lhs}` and `{rhs}`.")]
    UnsupportedOperands {
        op: BinaryOp,
        lhs: &'static str,
        rhs: &'static str,
    },
}

pub type ConstResult<T> = Result<T, Error>;
