//! The syntax-directed emitter (C5c): walks the AST exactly once, in the
//! same left-to-right order the grammar's reductions would fire in a
//! combined parser/emitter, and lowers it into LLVM IR. This is the only
//! place identifiers get resolved through the symbol table and the only
//! place registers, labels, and instructions get allocated.

use derive_more::Display;

use crate::back::function::RetType;
use crate::back::instr::{CmpOp, Instruction, Label};
use crate::back::module::{GlobalDecl, Module};
use crate::back::operand::Operand;
use crate::common::Id;
use crate::front::ast::*;

use super::symtab::{Scope, SymbolTable};

/// A semantic error raised during emission.
#[derive(Debug, Display)]
pub enum EmitError {
    #[display("Line {line}: name error: '{name}' is not declared")]
    UnresolvedName { name: Id, line: u32 },
    #[display("Line {line}: '{name}' names an array/procedure and cannot be used as a plain value")]
    NotAScalar { name: Id, line: u32 },
}

impl std::error::Error for EmitError {}

/// The declaration scope new `id_list` entries are inserted under. Tracks
/// the same three-way state the original grammar's global `varscope`
/// variable does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeclScope {
    GlobalVar,
    Param,
    LocalVar,
}

struct Compiler {
    symtab: SymbolTable,
    functions: Vec<crate::back::function::Function>,
    decl_scope: DeclScope,
    use_write: bool,
    use_read: bool,
}

impl Compiler {
    fn new() -> Self {
        Compiler {
            symtab: SymbolTable::new(),
            functions: Vec::new(),
            decl_scope: DeclScope::GlobalVar,
            use_write: false,
            use_read: false,
        }
    }

    fn current_fn(&mut self) -> &mut crate::back::function::Function {
        self.functions.last_mut().expect("no active function")
    }

    fn append(&mut self, instr: Instruction) {
        self.current_fn().append(instr);
    }

    fn new_register(&mut self) -> Operand {
        self.current_fn().new_register()
    }

    fn new_label(&mut self) -> Label {
        self.current_fn().new_label()
    }

    /// Declare every id_list entry under the current `decl_scope`.
    fn declare_id_list(&mut self, items: &[IdItem]) {
        for item in items {
            match item {
                IdItem::Scalar(name) => {
                    let scope = match self.decl_scope {
                        DeclScope::GlobalVar => Scope::GlobalVar,
                        DeclScope::Param => Scope::Param,
                        DeclScope::LocalVar => Scope::LocalVar,
                    };
                    self.symtab.insert(*name, scope);
                    if self.decl_scope == DeclScope::Param {
                        self.current_fn().add_param(*name);
                    }
                }
                IdItem::Array(name, bounds) => {
                    // An array id_item always declares Scope::Array
                    // regardless of decl_scope, matching the original
                    // grammar's unconditional `Scope.ARRAY` insertion for
                    // the bracketed id_list form (see DESIGN.md). Arrays
                    // are always addressed through the module-level
                    // global of the same name (see `array_ptr`), so one
                    // occurring in a parameter list is never added as an
                    // actual LLVM function parameter.
                    self.symtab.insert(*name, Scope::Array);
                    self.symtab.set_array_bounds(*bounds);
                }
            }
        }
    }

    fn emit_local_allocas(&mut self) {
        let names: Vec<Id> = self
            .symtab
            .rows()
            .iter()
            .filter(|s| s.scope == Scope::LocalVar)
            .map(|s| s.name)
            .collect();
        for name in names {
            self.append(Instruction::Alloca { dst: name });
        }
    }

    /// Resolve a plain (non-array) name to its lvalue/rvalue address
    /// operand, per spec.md's assignment/read contracts. Returns `None`
    /// for `Scope::Array` — callers handle arrays separately since an
    /// index expression is required.
    fn scalar_ptr(&self, name: Id, line: u32) -> Result<Option<Operand>, EmitError> {
        let sym = self
            .symtab
            .lookup(name)
            .ok_or(EmitError::UnresolvedName { name, line })?;
        Ok(match sym.scope {
            Scope::GlobalVar => Some(Operand::GlobalVar(name)),
            Scope::LocalVar | Scope::Param | Scope::Func => Some(Operand::NamedReg(name)),
            Scope::Array => None,
            Scope::Proc => None,
        })
    }

    /// Address computation for an array element: `sub`, `sext`,
    /// `getelementptr`, in that order, subtracting the array's lower bound.
    fn array_ptr(&mut self, name: Id, index: Operand, lo: i32, size: i32) -> Operand {
        let shifted = self.new_register();
        self.append(Instruction::Sub {
            dst: shifted,
            lhs: index,
            rhs: Operand::Constant(lo),
        });
        let widened = self.new_register();
        self.append(Instruction::Sext {
            dst: widened,
            src: shifted,
        });
        let ptr = self.new_register();
        self.append(Instruction::Getelementptr {
            dst: ptr,
            size,
            array: name,
            index: widened,
        });
        ptr
    }

    /// The lvalue address of `name` / `name[index]`, used by `read` (whose
    /// statement has no competing rhs to sequence against). Assignment
    /// computes its array address inline instead, since it must interleave
    /// index and value evaluation in a specific order (see `emit_assign`).
    fn lvalue(&mut self, name: Id, index: Option<&Expr>, line: u32) -> Result<Operand, EmitError> {
        if let Some(ptr) = self.scalar_ptr(name, line)? {
            return Ok(ptr);
        }
        // Scope::Array: an index expression is required. A program that
        // reads an array name with no subscript reaches here with `index`
        // absent; that is a semantic mismatch, not a crash.
        let index_expr = index.ok_or(EmitError::NotAScalar { name, line })?;
        let index_val = self.emit_expr(index_expr)?;
        let sym = self
            .symtab
            .lookup(name)
            .ok_or(EmitError::UnresolvedName { name, line })?;
        let (lo, _hi) = sym.bounds.expect("array symbol without bounds");
        let size = sym.array_size().expect("array symbol without bounds");
        Ok(self.array_ptr(name, index_val, lo, size))
    }

    fn emit_cmp_op(op: RelOp) -> CmpOp {
        match op {
            RelOp::Eq => CmpOp::Eq,
            RelOp::Ne => CmpOp::Ne,
            RelOp::Gt => CmpOp::Sgt,
            RelOp::Ge => CmpOp::Sge,
            RelOp::Lt => CmpOp::Slt,
            RelOp::Le => CmpOp::Sle,
        }
    }

    fn emit_condition(&mut self, cond: &Condition) -> Result<Operand, EmitError> {
        let lhs = self.emit_expr(&cond.lhs)?;
        let rhs = self.emit_expr(&cond.rhs)?;
        let dst = self.new_register();
        self.append(Instruction::Icmp {
            dst,
            cond: Self::emit_cmp_op(cond.op),
            lhs,
            rhs,
        });
        Ok(dst)
    }

    fn emit_args(&mut self, args: &[Expr]) -> Result<Vec<Operand>, EmitError> {
        args.iter().map(|a| self.emit_expr(a)).collect()
    }

    fn emit_expr(&mut self, expr: &Expr) -> Result<Operand, EmitError> {
        match expr {
            Expr::Const(v) => Ok(Operand::Constant(*v)),
            Expr::Var { name, line } => {
                let sym = self
                    .symtab
                    .lookup(*name)
                    .ok_or(EmitError::UnresolvedName {
                        name: *name,
                        line: *line,
                    })?;
                match sym.scope {
                    Scope::Param => Ok(Operand::NamedReg(*name)),
                    Scope::GlobalVar => {
                        let ptr = Operand::GlobalVar(*name);
                        let dst = self.new_register();
                        self.append(Instruction::Load { dst, ptr });
                        Ok(dst)
                    }
                    Scope::LocalVar | Scope::Func => {
                        let ptr = Operand::NamedReg(*name);
                        let dst = self.new_register();
                        self.append(Instruction::Load { dst, ptr });
                        Ok(dst)
                    }
                    Scope::Array | Scope::Proc => Err(EmitError::NotAScalar {
                        name: *name,
                        line: *line,
                    }),
                }
            }
            Expr::Index { name, index, line } => {
                let sym = self
                    .symtab
                    .lookup(*name)
                    .ok_or(EmitError::UnresolvedName {
                        name: *name,
                        line: *line,
                    })?;
                let (lo, _) = sym.bounds.expect("array symbol without bounds");
                let size = sym.array_size().expect("array symbol without bounds");
                let index_val = self.emit_expr(index)?;
                let ptr = self.array_ptr(*name, index_val, lo, size);
                let dst = self.new_register();
                self.append(Instruction::Load { dst, ptr });
                Ok(dst)
            }
            Expr::Unary { op, operand } => match op {
                UnOp::Neg => {
                    let v = self.emit_expr(operand)?;
                    let dst = self.new_register();
                    self.append(Instruction::Sub {
                        dst,
                        lhs: Operand::Constant(0),
                        rhs: v,
                    });
                    Ok(dst)
                }
            },
            Expr::Binary { op, lhs, rhs } => {
                let a = self.emit_expr(lhs)?;
                let b = self.emit_expr(rhs)?;
                self.emit_binop(*op, a, b)
            }
            Expr::Call { name, args, line } => {
                self.symtab
                    .lookup(*name)
                    .ok_or(EmitError::UnresolvedName {
                        name: *name,
                        line: *line,
                    })?;
                let arg_vals = self.emit_args(args)?;
                let dst = self.new_register();
                self.append(Instruction::Call {
                    dst,
                    callee: *name,
                    args: arg_vals,
                });
                Ok(dst)
            }
        }
    }

    /// Strength-reduce multiply/divide by a positive power of two;
    /// otherwise emit the plain `mul`/`sdiv`. Zero is never a power of
    /// two. When multiplying, either operand being a suitable constant
    /// triggers the rewrite (the right-hand constant is evaluated first,
    /// per spec.md, but either side may drive the rewrite).
    fn emit_binop(&mut self, op: BinOp, a: Operand, b: Operand) -> Result<Operand, EmitError> {
        let dst = self.new_register();
        match op {
            BinOp::Add => self.append(Instruction::Add { dst, lhs: a, rhs: b }),
            BinOp::Sub => self.append(Instruction::Sub { dst, lhs: a, rhs: b }),
            BinOp::Mul => {
                if let Some(shift) = a.as_constant().and_then(power_of_two_log2) {
                    self.append(Instruction::Shl {
                        dst,
                        lhs: b,
                        rhs: Operand::Constant(shift),
                    });
                } else if let Some(shift) = b.as_constant().and_then(power_of_two_log2) {
                    self.append(Instruction::Shl {
                        dst,
                        lhs: a,
                        rhs: Operand::Constant(shift),
                    });
                } else {
                    self.append(Instruction::Mul { dst, lhs: a, rhs: b });
                }
            }
            BinOp::Div => {
                if let Some(shift) = b.as_constant().and_then(power_of_two_log2) {
                    self.append(Instruction::Ashr {
                        dst,
                        lhs: a,
                        rhs: Operand::Constant(shift),
                    });
                } else {
                    self.append(Instruction::Sdiv { dst, lhs: a, rhs: b });
                }
            }
        }
        Ok(dst)
    }

    fn emit_assign(
        &mut self,
        name: Id,
        index: Option<&Expr>,
        value: &Expr,
        line: u32,
    ) -> Result<(), EmitError> {
        // A scalar lvalue's address costs no code (a direct global or named
        // register), so evaluation order against the rhs is immaterial
        // there. An array lvalue's index must run before the rhs: the
        // original reduces `IDENT '[' expression ']' ':=' expression`
        // left to right, so the index expression (and any side effects it
        // carries, e.g. a function call) is fully evaluated and its code
        // emitted before the rhs expression's.
        if let Some(ptr) = self.scalar_ptr(name, line)? {
            let val = self.emit_expr(value)?;
            self.append(Instruction::Store { val, ptr });
            return Ok(());
        }
        let index_expr = index.ok_or(EmitError::NotAScalar { name, line })?;
        let index_val = self.emit_expr(index_expr)?;
        let val = self.emit_expr(value)?;
        let sym = self
            .symtab
            .lookup(name)
            .ok_or(EmitError::UnresolvedName { name, line })?;
        let (lo, _hi) = sym.bounds.expect("array symbol without bounds");
        let size = sym.array_size().expect("array symbol without bounds");
        let ptr = self.array_ptr(name, index_val, lo, size);
        self.append(Instruction::Store { val, ptr });
        Ok(())
    }

    fn emit_stmt(&mut self, stmt: &Stmt) -> Result<(), EmitError> {
        match stmt {
            Stmt::Null => Ok(()),
            Stmt::Block(stmts) => {
                for s in stmts {
                    self.emit_stmt(s)?;
                }
                Ok(())
            }
            Stmt::Assign {
                name,
                index,
                value,
                line,
            } => self.emit_assign(*name, index.as_ref(), value, *line),
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => self.emit_if(cond, then_branch, else_branch.as_deref()),
            Stmt::While { cond, body } => self.emit_while(cond, body),
            Stmt::For {
                var,
                from,
                to,
                body,
                line,
            } => self.emit_for(*var, from, to, body, *line),
            Stmt::Call { name, args, line } => self.emit_call_stmt(*name, args, *line),
            Stmt::Read { name, index, line } => self.emit_read(*name, index.as_ref(), *line),
            Stmt::Write(e) => self.emit_write(e),
        }
    }

    fn emit_if(
        &mut self,
        cond: &Condition,
        then_branch: &Stmt,
        else_branch: Option<&Stmt>,
    ) -> Result<(), EmitError> {
        let c = self.emit_condition(cond)?;
        let l_then = self.new_label();
        let l_end = self.new_label();
        if let Some(else_stmt) = else_branch {
            let l_else = self.new_label();
            self.append(Instruction::CondBr {
                cond: c,
                if_true: l_then,
                if_false: l_else,
            });
            self.append(Instruction::LabelDef(l_then));
            self.emit_stmt(then_branch)?;
            self.append(Instruction::Br { target: l_end });
            self.append(Instruction::LabelDef(l_else));
            self.emit_stmt(else_stmt)?;
            self.append(Instruction::Br { target: l_end });
        } else {
            self.append(Instruction::CondBr {
                cond: c,
                if_true: l_then,
                if_false: l_end,
            });
            self.append(Instruction::LabelDef(l_then));
            self.emit_stmt(then_branch)?;
            self.append(Instruction::Br { target: l_end });
        }
        self.append(Instruction::LabelDef(l_end));
        Ok(())
    }

    fn emit_while(&mut self, cond: &Condition, body: &Stmt) -> Result<(), EmitError> {
        let l_head = self.new_label();
        let l_body = self.new_label();
        let l_end = self.new_label();
        self.append(Instruction::Br { target: l_head });
        self.append(Instruction::LabelDef(l_head));
        let c = self.emit_condition(cond)?;
        self.append(Instruction::CondBr {
            cond: c,
            if_true: l_body,
            if_false: l_end,
        });
        self.append(Instruction::LabelDef(l_body));
        self.emit_stmt(body)?;
        self.append(Instruction::Br { target: l_head });
        self.append(Instruction::LabelDef(l_end));
        Ok(())
    }

    fn emit_for(
        &mut self,
        var: Id,
        from: &Expr,
        to: &Expr,
        body: &Stmt,
        line: u32,
    ) -> Result<(), EmitError> {
        let ptr = self
            .scalar_ptr(var, line)?
            .ok_or(EmitError::UnresolvedName { name: var, line })?;
        let from_val = self.emit_expr(from)?;
        self.append(Instruction::Store {
            val: from_val,
            ptr,
        });
        // The upper bound is evaluated once, before the loop head, matching
        // a Pascal `for`'s fixed limit: the original reduces this
        // `expression` (and emits its code) before `for_act1` allocates the
        // head label, so its instructions sit outside the back-edge and are
        // never re-run even if the body mutates the bound.
        let to_val = self.emit_expr(to)?;

        let l_head = self.new_label();
        let l_body = self.new_label();
        let l_end = self.new_label();
        self.append(Instruction::Br { target: l_head });
        self.append(Instruction::LabelDef(l_head));

        let v = self.new_register();
        self.append(Instruction::Load { dst: v, ptr });
        let c = self.new_register();
        self.append(Instruction::Icmp {
            dst: c,
            cond: CmpOp::Sle,
            lhs: v,
            rhs: to_val,
        });
        self.append(Instruction::CondBr {
            cond: c,
            if_true: l_body,
            if_false: l_end,
        });
        self.append(Instruction::LabelDef(l_body));
        self.emit_stmt(body)?;

        let w = self.new_register();
        self.append(Instruction::Load { dst: w, ptr });
        let w2 = self.new_register();
        self.append(Instruction::Add {
            dst: w2,
            lhs: w,
            rhs: Operand::Constant(1),
        });
        self.append(Instruction::Store { val: w2, ptr });
        self.append(Instruction::Br { target: l_head });
        self.append(Instruction::LabelDef(l_end));
        Ok(())
    }

    fn emit_call_stmt(&mut self, name: Id, args: &[Expr], line: u32) -> Result<(), EmitError> {
        let sym = self
            .symtab
            .lookup(name)
            .ok_or(EmitError::UnresolvedName { name, line })?;
        let is_proc = sym.scope == Scope::Proc;
        let arg_vals = self.emit_args(args)?;
        if is_proc {
            self.append(Instruction::CallVoid {
                callee: name,
                args: arg_vals,
            });
        } else {
            let dst = self.new_register();
            self.append(Instruction::Call {
                dst,
                callee: name,
                args: arg_vals,
            });
        }
        Ok(())
    }

    fn emit_read(&mut self, name: Id, index: Option<&Expr>, line: u32) -> Result<(), EmitError> {
        self.use_read = true;
        let ptr = self.lvalue(name, index, line)?;
        let dst = self.new_register();
        self.append(Instruction::CallScanf { dst, ptr });
        Ok(())
    }

    fn emit_write(&mut self, expr: &Expr) -> Result<(), EmitError> {
        self.use_write = true;
        let arg = self.emit_expr(expr)?;
        let dst = self.new_register();
        self.append(Instruction::CallPrintf { dst, arg });
        Ok(())
    }

    fn emit_subprog(&mut self, sub: &SubprogDecl) -> Result<(), EmitError> {
        let ret_ty = match sub.kind {
            SubprogKind::Proc => RetType::Void,
            SubprogKind::Func => RetType::I32,
        };
        self.symtab.insert(
            sub.name,
            match sub.kind {
                SubprogKind::Proc => Scope::Proc,
                SubprogKind::Func => Scope::Func,
            },
        );
        self.functions
            .push(crate::back::function::Function::new(sub.name, ret_ty));

        self.decl_scope = DeclScope::Param;
        self.declare_id_list(&sub.params);

        self.decl_scope = DeclScope::LocalVar;
        self.declare_id_list(&sub.locals);
        self.emit_local_allocas();
        if sub.kind == SubprogKind::Func {
            self.append(Instruction::Alloca { dst: sub.name });
        }

        self.emit_stmt(&sub.body)?;

        match sub.kind {
            SubprogKind::Proc => self.append(Instruction::RetVoid),
            SubprogKind::Func => {
                let ptr = Operand::NamedReg(sub.name);
                let dst = self.new_register();
                self.append(Instruction::Load { dst, ptr });
                self.append(Instruction::Ret { val: dst });
            }
        }
        self.symtab.delete();
        Ok(())
    }

    fn finish(self) -> Module {
        let mut globals = Vec::new();
        for sym in self.symtab.rows() {
            match sym.scope {
                Scope::GlobalVar => globals.push(GlobalDecl::Scalar(sym.name)),
                Scope::Array => {
                    let size = sym.array_size().expect("array symbol without bounds");
                    globals.push(GlobalDecl::Array(sym.name, size));
                }
                _ => {}
            }
        }
        Module {
            globals,
            functions: self.functions,
            use_write: self.use_write,
            use_read: self.use_read,
        }
    }
}

fn power_of_two_log2(v: i32) -> Option<i32> {
    if v > 0 && (v & (v - 1)) == 0 {
        Some(v.trailing_zeros() as i32)
    } else {
        None
    }
}

/// Lower a parsed program into a complete LLVM IR module.
pub fn emit(program: &Program) -> Result<Module, EmitError> {
    let mut c = Compiler::new();

    c.decl_scope = DeclScope::GlobalVar;
    c.declare_id_list(&program.globals);

    for sub in &program.subprogs {
        c.emit_subprog(sub)?;
    }

    c.functions
        .push(crate::back::function::Function::new(Id::new("main".into()), RetType::I32));
    c.emit_stmt(&program.body)?;
    c.append(Instruction::Ret {
        val: Operand::Constant(0),
    });

    Ok(c.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::front::parse::parse;

    fn emit_src(src: &str) -> Module {
        let mut warnings = Vec::new();
        let program = parse(src, &mut warnings).unwrap_or_else(|e| panic!("{e}"));
        emit(&program).unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn scenario_write_shl_strength_reduction() {
        let m = emit_src("program p; var x; begin read(x); write(x*4) end.");
        let text = m.render();
        assert!(text.contains("@x = common global i32 0, align 4"));
        assert!(text.contains("shl i32"));
        assert!(text.contains("call i32 (i8*, ...) @printf"));
        assert!(text.contains("declare i32 @printf"));
        assert!(text.contains("declare i32 @scanf"));
        assert!(text.contains("ret i32 0"));
    }

    #[test]
    fn scenario_array_assignment() {
        let m = emit_src("program p; var a[1..3]; begin a[2] := 7 end.");
        let text = m.render();
        assert!(text.contains("@a = common global [3 x i32] zeroinitializer, align 16"));
        assert!(text.contains("sub nsw i32 2, 1"));
        assert!(text.contains("sext i32"));
        assert!(text.contains("getelementptr inbounds [3 x i32], [3 x i32]* @a, i64 0, i64"));
        assert!(text.contains("store i32 7, i32*"));
    }

    #[test]
    fn array_assignment_evaluates_index_before_value() {
        let m = emit_src(
            "program p; \
             function idx(n); begin idx := n end; \
             function val(n); begin val := n end; \
             var a[1..3]; \
             begin a[idx(1)] := val(2) end.",
        );
        let text = m.render();
        let main_body = text.split("define i32 @main").nth(1).unwrap();
        let idx_pos = main_body.find("call i32 @idx").unwrap();
        let val_pos = main_body.find("call i32 @val").unwrap();
        assert!(
            idx_pos < val_pos,
            "the index expression must be evaluated (and its code emitted) before the rhs value"
        );
    }

    #[test]
    fn scenario_procedure_uses_param_directly() {
        let m = emit_src("program p; procedure q(y); begin write(y) end; begin q(5) end.");
        let text = m.render();
        assert!(text.contains("define void @q(i32 %y) {"));
        assert!(text.contains("call i32 (i8*, ...) @printf(i8* getelementptr inbounds ([4 x i8], [4 x i8]* @.str.w, i64 0, i64 0), i32 %y)"));
        assert!(!text.contains("%y = alloca"));
        assert!(text.contains("ret void"));
    }

    #[test]
    fn scenario_function_return_slot() {
        let m = emit_src("program p; function f(n); begin f := n*n end; begin write(f(3)) end.");
        let text = m.render();
        assert!(text.contains("%f = alloca i32, align 4"));
        assert!(text.contains("mul nsw i32 %n, %n"));
        assert!(text.contains("call i32 @f(i32 3)"));
    }

    #[test]
    fn scenario_for_loop_over_global() {
        let m = emit_src("program p; var i; begin for i := 1 to 10 do write(i) end.");
        let text = m.render();
        assert!(text.contains("store i32 1, i32* @i, align 4"));
        assert!(text.contains("icmp sle i32"));
        assert!(text.contains("add nsw i32"));
    }

    #[test]
    fn for_loop_bound_is_evaluated_once_before_the_loop_head() {
        let m = emit_src("program p; var n, i; begin for i := 1 to n do write(i) end.");
        let text = m.render();
        let main_body = text.split("define i32 @main").nth(1).unwrap();
        assert_eq!(
            main_body.matches("load i32, i32* @n").count(),
            1,
            "the bound should be loaded exactly once"
        );
        let load_n_pos = main_body.find("load i32, i32* @n").unwrap();
        let head_label_pos = main_body.find("L1:").unwrap();
        assert!(
            load_n_pos < head_label_pos,
            "the bound must be evaluated before the loop head, not re-evaluated on the back-edge"
        );
    }

    #[test]
    fn scenario_if_else_has_one_icmp_two_calls_three_labels() {
        let m = emit_src("program p; var x; begin if x = 0 then write(1) else write(2) end.");
        let text = m.render();
        assert_eq!(text.matches("icmp eq").count(), 1);
        assert_eq!(text.matches("call i32 (i8*, ...) @printf").count(), 2);
        let label_defs = text
            .lines()
            .filter(|l| {
                let t = l.trim();
                t.ends_with(':') && t.starts_with('L')
            })
            .count();
        assert_eq!(label_defs, 3);
    }

    #[test]
    fn unresolved_identifier_fails_hard() {
        let mut warnings = Vec::new();
        let program = parse("program p; begin write(nope) end.", &mut warnings).unwrap();
        let err = emit(&program).unwrap_err();
        assert!(format!("{err}").contains("nope"));
    }

    #[test]
    fn array_name_without_subscript_is_a_name_error_not_a_panic() {
        let mut warnings = Vec::new();
        let program = parse(
            "program p; var a[1..3]; begin a := 7 end.",
            &mut warnings,
        )
        .unwrap();
        let err = emit(&program).unwrap_err();
        assert!(format!("{err}").contains("'a'"));
    }

    #[test]
    fn array_name_as_bare_expression_is_a_name_error_not_a_panic() {
        let mut warnings = Vec::new();
        let program = parse(
            "program p; var a[1..3]; begin write(a) end.",
            &mut warnings,
        )
        .unwrap();
        let err = emit(&program).unwrap_err();
        assert!(format!("{err}").contains("'a'"));
    }

    #[test]
    fn multiply_by_zero_is_not_rewritten() {
        let m = emit_src("program p; var x; begin write(x*0) end.");
        assert!(m.render().contains("mul nsw i32"));
    }

    #[test]
    fn multiply_by_one_emits_shift_by_zero() {
        let m = emit_src("program p; var x; begin write(x*1) end.");
        assert!(m.render().contains("shl i32"));
    }

    #[test]
    fn division_by_non_power_of_two_emits_sdiv() {
        let m = emit_src("program p; var x; begin write(x div 3) end.");
        assert!(m.render().contains("sdiv i32"));
    }
}
