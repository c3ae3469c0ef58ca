//! Whole-program serialization: global variable/array declarations, every
//! function, and (conditionally) the `printf`/`scanf` runtime declarations.

use crate::common::Id;

use super::function::Function;

#[derive(Debug, Clone, Copy)]
pub enum GlobalDecl {
    Scalar(Id),
    Array(Id, i32),
}

impl std::fmt::Display for GlobalDecl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GlobalDecl::Scalar(name) => write!(f, "@{name} = common global i32 0, align 4"),
            GlobalDecl::Array(name, size) => write!(
                f,
                "@{name} = common global [{size} x i32] zeroinitializer, align 16"
            ),
        }
    }
}

/// The whole compiled program: global declarations, every function in
/// definition order, and whether `write`/`read` were used anywhere (which
/// governs emission of the `printf`/`scanf` declarations and their format
/// strings).
#[derive(Debug, Default)]
pub struct Module {
    pub globals: Vec<GlobalDecl>,
    pub functions: Vec<Function>,
    pub use_write: bool,
    pub use_read: bool,
}

impl Module {
    pub fn new() -> Self {
        Module::default()
    }

    /// Render the full `result.ll` contents: globals, a blank line, every
    /// function, then the runtime declarations actually used.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for g in &self.globals {
            out.push_str(&g.to_string());
            out.push('\n');
        }
        out.push('\n');
        for f in &self.functions {
            f.write_to(&mut out);
        }
        if self.use_write {
            out.push_str("declare i32 @printf(i8*, ...)\n");
            out.push_str(r#"@.str.w = private unnamed_addr constant [4 x i8] c"%d\0A\00", align 1"#);
            out.push('\n');
        }
        if self.use_read {
            out.push_str("declare i32 @scanf(i8*, ...)\n");
            out.push_str(r#"@.str.r = private unnamed_addr constant [3 x i8] c"%d\00", align 1"#);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::back::function::RetType;

    #[test]
    fn globals_render_before_functions() {
        let mut m = Module::new();
        m.globals.push(GlobalDecl::Scalar(Id::new("x".into())));
        m.globals.push(GlobalDecl::Array(Id::new("a".into()), 3));
        m.functions
            .push(Function::new(Id::new("main".into()), RetType::I32));
        let text = m.render();
        assert!(text.starts_with("@x = common global i32 0, align 4\n@a = common global [3 x i32] zeroinitializer, align 16\n\ndefine i32 @main()"));
    }

    #[test]
    fn runtime_declares_are_conditional_on_usage_flags() {
        let m = Module::new();
        assert!(!m.render().contains("printf"));
        assert!(!m.render().contains("scanf"));

        let mut m = Module::new();
        m.use_write = true;
        let text = m.render();
        assert!(text.contains("declare i32 @printf(i8*, ...)"));
        assert!(text.contains(r#"@.str.w = private unnamed_addr constant [4 x i8] c"%d\0A\00", align 1"#));
        assert!(!text.contains("scanf"));

        let mut m = Module::new();
        m.use_read = true;
        let text = m.render();
        assert!(text.contains("declare i32 @scanf(i8*, ...)"));
        assert!(text.contains(r#"@.str.r = private unnamed_addr constant [3 x i8] c"%d\00", align 1"#));
    }
}
