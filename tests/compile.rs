//! End-to-end compile tests: whole programs in, whole `result.ll` text out.

fn compile_ok(src: &str) -> String {
    let mut warnings = Vec::new();
    pascalc::compile(src, &mut warnings).unwrap_or_else(|e| panic!("{e}"))
}

#[test]
fn hello_counter_program_uses_global_and_loop() {
    let ir = compile_ok(
        "program counter; \
         var total; \
         begin \
             total := 0; \
             for total := 1 to 5 do write(total) \
         end.",
    );
    assert!(ir.contains("@total = common global i32 0, align 4"));
    assert!(ir.contains("define i32 @main() {"));
    assert!(ir.contains("icmp sle i32"));
    assert!(ir.contains("declare i32 @printf(i8*, ...)"));
    assert!(!ir.contains("scanf"));
}

#[test]
fn array_sum_program_uses_getelementptr_and_sext() {
    let ir = compile_ok(
        "program sums; \
         var a[1..5], i, total; \
         begin \
             total := 0; \
             for i := 1 to 5 do begin read(a[i]); total := total + a[i] end; \
             write(total) \
         end.",
    );
    assert!(ir.contains("@a = common global [5 x i32] zeroinitializer, align 16"));
    assert!(ir.contains("getelementptr inbounds [5 x i32], [5 x i32]* @a"));
    assert!(ir.contains("sext i32"));
    assert!(ir.contains("declare i32 @scanf(i8*, ...)"));
    assert!(ir.contains("declare i32 @printf(i8*, ...)"));
}

#[test]
fn recursive_like_function_emits_return_slot_and_call() {
    let ir = compile_ok(
        "program squares; \
         function square(n); \
         begin square := n * n end; \
         var x; \
         begin \
             x := square(6); \
             write(x) \
         end.",
    );
    assert!(ir.contains("define i32 @square(i32 %n) {"));
    assert!(ir.contains("%square = alloca i32, align 4"));
    assert!(ir.contains("mul nsw i32 %n, %n"));
    assert!(ir.contains("call i32 @square(i32 6)"));
}

#[test]
fn procedure_with_no_return_emits_void_call_and_ret_void() {
    let ir = compile_ok(
        "program greet; \
         procedure shout(n); \
         begin write(n) end; \
         begin shout(42) end.",
    );
    assert!(ir.contains("define void @shout(i32 %n) {"));
    assert!(ir.contains("ret void"));
    assert!(ir.contains("call void @shout(i32 42)"));
}

#[test]
fn if_else_chain_and_while_loop_coexist() {
    let ir = compile_ok(
        "program classify; \
         var x, y; \
         begin \
             x := 7; \
             if x < 10 then y := 1 else y := 2; \
             while x > 0 do x := x - 1 \
         end.",
    );
    assert!(ir.contains("icmp slt i32"));
    assert!(ir.contains("icmp sgt i32"));
    let label_count = ir.matches(':').filter(|_| true).count();
    assert!(label_count > 0);
}

#[test]
fn power_of_two_multiply_and_divide_strength_reduce() {
    let ir = compile_ok(
        "program scale; \
         var x, y, z; \
         begin \
             x := 8; \
             y := x * 16; \
             z := x div 4 \
         end.",
    );
    assert!(ir.contains("shl i32"));
    assert!(ir.contains("ashr i32"));
    assert!(!ir.contains("mul nsw"));
    assert!(!ir.contains("sdiv"));
}

#[test]
fn multiply_by_non_power_of_two_and_non_positive_constants_use_mul_and_sdiv() {
    let ir = compile_ok(
        "program scale; \
         var x, y, z, w; \
         begin \
             x := 8; \
             y := x * 3; \
             z := x div 3; \
             w := x * 0 \
         end.",
    );
    assert!(ir.contains("mul nsw i32"));
    assert!(ir.contains("sdiv i32"));
}

#[test]
fn unresolved_name_is_a_fatal_emit_error_not_a_warning() {
    let mut warnings = Vec::new();
    let err = pascalc::compile(
        "program p; begin write(ghost) end.",
        &mut warnings,
    )
    .unwrap_err();
    assert!(warnings.is_empty());
    assert!(format!("{err}").contains("ghost"));
}

#[test]
fn syntax_error_is_fatal_before_any_ir_is_produced() {
    let mut warnings = Vec::new();
    let result = pascalc::compile("program p; begin x := end.", &mut warnings);
    assert!(result.is_err());
}

#[test]
fn illegal_characters_and_integer_overflow_are_nonfatal_warnings() {
    let mut warnings = Vec::new();
    let ir = pascalc::compile(
        "program p; var x; begin x := 99999999999; write(x) @ end.",
        &mut warnings,
    );
    // An illegal '@' and an overflowing literal should both surface as
    // warnings rather than aborting compilation.
    assert!(ir.is_ok());
    assert!(!warnings.is_empty());
}

#[test]
fn compiling_the_same_source_twice_is_deterministic() {
    let src = "program p; var a[1..3], i; \
               begin for i := 1 to 3 do a[i] := i * 2 end.";
    let first = compile_ok(src);
    let second = compile_ok(src);
    assert_eq!(first, second);
}

#[test]
fn empty_else_branch_still_emits_a_branch_and_label() {
    let ir = compile_ok("program p; var x; begin if x = 1 then x := 2 end.");
    assert_eq!(ir.matches("icmp eq").count(), 1);
    assert_eq!(ir.matches("br i1").count(), 1);
}

#[test]
fn for_loop_with_a_variable_bound_evaluates_it_once() {
    // `n` is loaded to seed the comparison once, before the loop head; a
    // `for` has a fixed limit even though the body below mutates `n`.
    let ir = compile_ok(
        "program p; var n, i; \
         begin n := 3; for i := 1 to n do begin write(i); n := n + 10 end end.",
    );
    let main_body = ir.split("define i32 @main").nth(1).unwrap();
    let head_label_pos = main_body.find("L1:").unwrap();
    let first_n_load = main_body.find("load i32, i32* @n").unwrap();
    assert!(
        first_n_load < head_label_pos,
        "the loop bound must be read once, before the loop head"
    );
    // The body's own `n := n + 10` reads `n` again inside the loop; that
    // read is legitimate and distinct from the bound's single read above.
    let loads_from_head_onward = main_body[head_label_pos..]
        .matches("load i32, i32* @n")
        .count();
    assert_eq!(loads_from_head_onward, 1);
}

#[test]
fn array_assignment_runs_index_before_value_across_the_whole_pipeline() {
    let ir = compile_ok(
        "program p; \
         function idx(n); begin idx := n end; \
         function val(n); begin val := n end; \
         var a[1..3]; \
         begin a[idx(1)] := val(2) end.",
    );
    let main_body = ir.split("define i32 @main").nth(1).unwrap();
    let idx_pos = main_body.find("call i32 @idx").unwrap();
    let val_pos = main_body.find("call i32 @val").unwrap();
    assert!(idx_pos < val_pos);
}
