//! The operand model (C1): a uniform, immutable representation of IR
//! values. Construction and rendering are both total — there is no way to
//! build an `Operand` that fails to print.

use derive_more::Display;

use crate::common::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Operand {
    /// A signed 32-bit literal.
    #[display("{_0}")]
    Constant(i32),
    /// The n-th SSA register allocated in the current function (n >= 1).
    #[display("%{_0}")]
    NumberedReg(u32),
    /// A named local/parameter register.
    #[display("%{_0}")]
    NamedReg(Id),
    /// A module-level variable or array.
    #[display("@{_0}")]
    GlobalVar(Id),
}

impl Operand {
    pub fn is_constant(&self) -> bool {
        matches!(self, Operand::Constant(_))
    }

    /// The literal value, if this operand is a constant.
    pub fn as_constant(&self) -> Option<i32> {
        match self {
            Operand::Constant(v) => Some(*v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renderings_match_spec_exactly() {
        assert_eq!(Operand::Constant(-7).to_string(), "-7");
        assert_eq!(Operand::NumberedReg(3).to_string(), "%3");
        assert_eq!(Operand::NamedReg(Id::new("y".into())).to_string(), "%y");
        assert_eq!(Operand::GlobalVar(Id::new("x".into())).to_string(), "@x");
    }
}
