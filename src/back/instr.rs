//! The IR instruction model (C2): a closed set of LLVM instruction forms
//! with bit-exact textual rendering. Adding an opcode means adding a
//! variant and a match arm — there is no open-ended escape hatch.

use derive_more::Display;
use std::fmt;

use crate::common::Id;

use super::operand::Operand;

/// A function-local basic-block name. Defined once (`Lk:`) and referenced
/// by branches (`%Lk`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display("L{_0}")]
pub struct Label(pub u32);

impl Label {
    /// The `%Lk` form used as a branch target.
    pub fn as_target(&self) -> String {
        format!("%{self}")
    }
}

/// The `icmp` predicates this language's relational operators map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CmpOp {
    #[display("eq")]
    Eq,
    #[display("ne")]
    Ne,
    #[display("sgt")]
    Sgt,
    #[display("sge")]
    Sge,
    #[display("slt")]
    Slt,
    #[display("sle")]
    Sle,
}

/// A single LLVM IR instruction (or basic-block label) inside a function
/// body. Every variant's `Display` impl matches its template in the
/// language reference character for character.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    LabelDef(Label),
    Alloca {
        dst: Id,
    },
    Store {
        val: Operand,
        ptr: Operand,
    },
    Load {
        dst: Operand,
        ptr: Operand,
    },
    Add {
        dst: Operand,
        lhs: Operand,
        rhs: Operand,
    },
    Sub {
        dst: Operand,
        lhs: Operand,
        rhs: Operand,
    },
    Mul {
        dst: Operand,
        lhs: Operand,
        rhs: Operand,
    },
    Sdiv {
        dst: Operand,
        lhs: Operand,
        rhs: Operand,
    },
    Shl {
        dst: Operand,
        lhs: Operand,
        rhs: Operand,
    },
    Ashr {
        dst: Operand,
        lhs: Operand,
        rhs: Operand,
    },
    Sext {
        dst: Operand,
        src: Operand,
    },
    Getelementptr {
        dst: Operand,
        size: i32,
        array: Id,
        index: Operand,
    },
    Icmp {
        dst: Operand,
        cond: CmpOp,
        lhs: Operand,
        rhs: Operand,
    },
    Br {
        target: Label,
    },
    CondBr {
        cond: Operand,
        if_true: Label,
        if_false: Label,
    },
    RetVoid,
    Ret {
        val: Operand,
    },
    Call {
        dst: Operand,
        callee: Id,
        args: Vec<Operand>,
    },
    CallVoid {
        callee: Id,
        args: Vec<Operand>,
    },
    CallPrintf {
        dst: Operand,
        arg: Operand,
    },
    CallScanf {
        dst: Operand,
        ptr: Operand,
    },
}

fn fmt_args(args: &[Operand]) -> String {
    args.iter()
        .map(|a| format!("i32 {a}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::LabelDef(l) => write!(f, "{l}:"),
            Instruction::Alloca { dst } => write!(f, "%{dst} = alloca i32, align 4"),
            Instruction::Store { val, ptr } => {
                write!(f, "store i32 {val}, i32* {ptr}, align 4")
            }
            Instruction::Load { dst, ptr } => {
                write!(f, "{dst} = load i32, i32* {ptr}, align 4")
            }
            Instruction::Add { dst, lhs, rhs } => write!(f, "{dst} = add nsw i32 {lhs}, {rhs}"),
            Instruction::Sub { dst, lhs, rhs } => write!(f, "{dst} = sub nsw i32 {lhs}, {rhs}"),
            Instruction::Mul { dst, lhs, rhs } => write!(f, "{dst} = mul nsw i32 {lhs}, {rhs}"),
            Instruction::Sdiv { dst, lhs, rhs } => write!(f, "{dst} = sdiv i32 {lhs}, {rhs}"),
            Instruction::Shl { dst, lhs, rhs } => write!(f, "{dst} = shl i32 {lhs}, {rhs}"),
            Instruction::Ashr { dst, lhs, rhs } => write!(f, "{dst} = ashr i32 {lhs}, {rhs}"),
            Instruction::Sext { dst, src } => write!(f, "{dst} = sext i32 {src} to i64"),
            Instruction::Getelementptr {
                dst,
                size,
                array,
                index,
            } => write!(
                f,
                "{dst} = getelementptr inbounds [{size} x i32], [{size} x i32]* @{array}, i64 0, i64 {index}"
            ),
            Instruction::Icmp {
                dst,
                cond,
                lhs,
                rhs,
            } => write!(f, "{dst} = icmp {cond} i32 {lhs}, {rhs}"),
            Instruction::Br { target } => write!(f, "br label {}", target.as_target()),
            Instruction::CondBr {
                cond,
                if_true,
                if_false,
            } => write!(
                f,
                "br i1 {cond}, label {}, label {}",
                if_true.as_target(),
                if_false.as_target()
            ),
            Instruction::RetVoid => write!(f, "ret void"),
            Instruction::Ret { val } => write!(f, "ret i32 {val}"),
            Instruction::Call { dst, callee, args } => {
                write!(f, "{dst} = call i32 @{callee}({})", fmt_args(args))
            }
            Instruction::CallVoid { callee, args } => {
                write!(f, "call void @{callee}({})", fmt_args(args))
            }
            Instruction::CallPrintf { dst, arg } => write!(
                f,
                "{dst} = call i32 (i8*, ...) @printf(i8* getelementptr inbounds ([4 x i8], [4 x i8]* @.str.w, i64 0, i64 0), i32 {arg})"
            ),
            Instruction::CallScanf { dst, ptr } => write!(
                f,
                "{dst} = call i32 (i8*, ...) @scanf(i8* getelementptr inbounds ([3 x i8], [3 x i8]* @.str.r, i64 0, i64 0), i32* {ptr})"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::back::operand::Operand::*;

    #[test]
    fn arithmetic_renders_with_nsw() {
        let i = Instruction::Add {
            dst: NumberedReg(2),
            lhs: NumberedReg(1),
            rhs: Constant(4),
        };
        assert_eq!(i.to_string(), "%2 = add nsw i32 %1, 4");
    }

    #[test]
    fn shift_and_ashr_render_without_nsw() {
        assert_eq!(
            Instruction::Shl {
                dst: NumberedReg(1),
                lhs: NumberedReg(0),
                rhs: Constant(2)
            }
            .to_string(),
            "%1 = shl i32 %0, 2"
        );
        assert_eq!(
            Instruction::Ashr {
                dst: NumberedReg(1),
                lhs: NumberedReg(0),
                rhs: Constant(3)
            }
            .to_string(),
            "%1 = ashr i32 %0, 3"
        );
    }

    #[test]
    fn getelementptr_shape() {
        let i = Instruction::Getelementptr {
            dst: NumberedReg(3),
            size: 3,
            array: Id::new("a".into()),
            index: NumberedReg(2),
        };
        assert_eq!(
            i.to_string(),
            "%3 = getelementptr inbounds [3 x i32], [3 x i32]* @a, i64 0, i64 %2"
        );
    }

    #[test]
    fn branch_and_label_forms() {
        assert_eq!(Instruction::Br { target: Label(1) }.to_string(), "br label %L1");
        assert_eq!(
            Instruction::CondBr {
                cond: NumberedReg(1),
                if_true: Label(2),
                if_false: Label(3)
            }
            .to_string(),
            "br i1 %1, label %L2, label %L3"
        );
        assert_eq!(Instruction::LabelDef(Label(4)).to_string(), "L4:");
    }

    #[test]
    fn printf_and_scanf_calls() {
        assert_eq!(
            Instruction::CallPrintf {
                dst: NumberedReg(5),
                arg: Constant(7)
            }
            .to_string(),
            "%5 = call i32 (i8*, ...) @printf(i8* getelementptr inbounds ([4 x i8], [4 x i8]* @.str.w, i64 0, i64 0), i32 7)"
        );
        assert_eq!(
            Instruction::CallScanf {
                dst: NumberedReg(5),
                ptr: GlobalVar(Id::new("x".into()))
            }
            .to_string(),
            "%5 = call i32 (i8*, ...) @scanf(i8* getelementptr inbounds ([3 x i8], [3 x i8]* @.str.r, i64 0, i64 0), i32* @x)"
        );
    }
}
