//! The stable three-address-code textual form from the external-interfaces
//! contract: labels print as `L<n>:`, statements are tab-indented, literal
//! and global operands print by name, temporaries as `t<n>`. This is the
//! test oracle for `-T` -- unlike [`crate::emit`], it is not a lowering to
//! any target; it is a direct, lossless rendering of the statement list.

use std::fmt::Write as _;

use tac_core::{ArithOp, Function, RelOp, Statement, SymbolTable, UnOp};

/// Renders `func`'s statement list in the stable TAC textual form.
pub fn print_function(func: &Function, symbols: &SymbolTable) -> String {
    let mut out = String::new();
    for (_, stmt) in func.stmts.iter() {
        print_statement(&mut out, stmt, symbols);
    }
    out
}

fn print_statement(out: &mut String, stmt: &Statement, symbols: &SymbolTable) {
    match stmt {
        Statement::Null => {}
        Statement::Label(label) => {
            writeln!(out, "{label}:").unwrap();
        }
        Statement::Jump { target } => {
            writeln!(out, "\tgoto {target}").unwrap();
        }
        Statement::Branch { op, left, right, target } => {
            writeln!(
                out,
                "\tif {} {} {} goto {target}",
                name(symbols, *left),
                rel_symbol(*op),
                name(symbols, *right)
            )
            .unwrap();
        }
        Statement::Call { result, func, args } => {
            let arg_list = args
                .iter()
                .map(|a| name(symbols, *a))
                .collect::<Vec<_>>()
                .join(", ");
            let func_name = name(symbols, *func);
            match result {
                Some(r) => writeln!(out, "\t{} := call {func_name}({arg_list})", name(symbols, *r)).unwrap(),
                None => writeln!(out, "\tcall {func_name}({arg_list})").unwrap(),
            }
        }
        Statement::Return { expr } => match expr {
            Some(e) => writeln!(out, "\treturn {}", name(symbols, *e)).unwrap(),
            None => writeln!(out, "\treturn").unwrap(),
        },
        Statement::Binary { op, result, left, right } => {
            writeln!(
                out,
                "\t{} := {} {} {}",
                name(symbols, *result),
                name(symbols, *left),
                bin_symbol(*op),
                name(symbols, *right)
            )
            .unwrap();
        }
        Statement::Unary { op, result, expr } => match op {
            UnOp::Negate => writeln!(out, "\t{} := -{}", name(symbols, *result), name(symbols, *expr)).unwrap(),
            UnOp::WidenByteToWord => {
                writeln!(out, "\t{} := (word) {}", name(symbols, *result), name(symbols, *expr)).unwrap()
            }
        },
        Statement::Copy { result, expr } => {
            writeln!(out, "\t{} := {}", name(symbols, *result), name(symbols, *expr)).unwrap();
        }
        Statement::Index { result, array, index } => {
            writeln!(
                out,
                "\t{} := {}[{}]",
                name(symbols, *result),
                name(symbols, *array),
                name(symbols, *index)
            )
            .unwrap();
        }
        Statement::Update { array, index, expr } => {
            writeln!(
                out,
                "\t{}[{}] := {}",
                name(symbols, *array),
                name(symbols, *index),
                name(symbols, *expr)
            )
            .unwrap();
        }
    }
}

fn name(symbols: &SymbolTable, id: tac_core::SymbolId) -> String {
    symbols.get(id).unwrap().name.clone()
}

fn bin_symbol(op: tac_core::BinOp) -> &'static str {
    use tac_core::BinOp;
    match op {
        BinOp::Arith(ArithOp::Add) => "+",
        BinOp::Arith(ArithOp::Sub) => "-",
        BinOp::Arith(ArithOp::Mul) => "*",
        BinOp::Arith(ArithOp::Div) => "/",
        BinOp::Arith(ArithOp::Mod) => "%",
        BinOp::Arith(ArithOp::And) => "&&",
        BinOp::Arith(ArithOp::Or) => "||",
        BinOp::Rel(rel) => rel_symbol(rel),
    }
}

fn rel_symbol(op: RelOp) -> &'static str {
    match op {
        RelOp::Eq => "==",
        RelOp::Ne => "!=",
        RelOp::Lt => "<",
        RelOp::Gt => ">",
        RelOp::Le => "<=",
        RelOp::Ge => ">=",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn printed(src: &str) -> String {
        let check_result = tac_frontend::compile_source(src).expect("valid program");
        let mut symbols = check_result.symbols;
        let f = &check_result.program.functions[0];
        let mut labels = tac_core::LabelAllocator::new();
        let mut func = tac_translate::translate_function(f, &mut symbols, &mut labels);
        tac_opt::optimize(&mut func, &mut symbols, &tac_opt::Options::all());
        print_function(&func, &symbols)
    }

    #[test]
    fn labels_print_with_l_prefix_and_colon() {
        let text = printed("int f(){ int x; x = 2 + 3; return x; }");
        assert!(text.contains("L0:"));
    }

    #[test]
    fn statements_are_tab_indented() {
        let text = printed("int f(){ int x; x = 2 + 3; return x; }");
        assert!(text.lines().any(|l| l.starts_with('\t')));
    }

    #[test]
    fn return_prints_with_its_operand_by_name() {
        let text = printed("int f(){ int x; x = 2 + 3; return x; }");
        assert!(text.contains("return 5"));
    }

    #[test]
    fn branch_prints_condition_and_goto_target() {
        let text = printed("int f(int a){ if(a) return 1; return 0; }");
        assert!(text.lines().any(|l| l.trim_start().starts_with("if ") && l.contains("goto")));
    }

    #[test]
    fn jump_prints_as_goto() {
        let text = printed("int f(int a){ if(a) return 1; else return 2; return 0; }");
        assert!(text.contains("goto L"));
    }
}
