//! Trivial, one-statement-at-a-time lowering to a toy three-address
//! assembly text. No register allocation, no peephole
//! scheduling: every operand is addressed directly by symbol name, exactly
//! as the statement already names it. This carries no optimization of its
//! own -- it exists so `-S` (the CLI's default output mode) produces
//! something, grounded in the shape of `original_source/src/generator.cpp`
//! but reduced to the bare minimum needed to produce output.

use std::fmt::Write as _;

use tac_core::{ArithOp, Function, RelOp, Statement, SymbolTable, UnOp};

use crate::error::EmitError;

/// Lowers every statement in `func`, in sequence order, to toy assembly
/// text. Requires `func`'s CFG to already be built (so `func.entry` is
/// set) -- this mirrors the source's `generateFunction`, which rebuilds the
/// flow graph before walking blocks.
pub fn emit_function(func: &Function, symbols: &SymbolTable) -> Result<String, EmitError> {
    if func.entry.is_none() {
        return Err(EmitError::MissingEntryBlock);
    }

    let name = &symbols.get(func.name).unwrap().name;
    let mut out = String::new();
    writeln!(out, "{name}:").unwrap();

    for (_, stmt) in func.stmts.iter() {
        emit_statement(&mut out, stmt, symbols);
    }

    Ok(out)
}

fn emit_statement(out: &mut String, stmt: &Statement, symbols: &SymbolTable) {
    match stmt {
        Statement::Null => {}
        Statement::Label(label) => {
            writeln!(out, "{label}:").unwrap();
        }
        Statement::Jump { target } => {
            writeln!(out, "\tjmp\t{target}").unwrap();
        }
        Statement::Branch { op, left, right, target } => {
            writeln!(
                out,
                "\tcmpl\t{}, {}\n\t{}\t{target}",
                operand(symbols, *right),
                operand(symbols, *left),
                jump_mnemonic(*op)
            )
            .unwrap();
        }
        Statement::Call { result, func, args } => {
            let func_name = &symbols.get(*func).unwrap().name;
            let arg_list = args
                .iter()
                .map(|a| operand(symbols, *a))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(out, "\tcall\t{func_name}({arg_list})").unwrap();
            if let Some(r) = result {
                writeln!(out, "\tmovl\t%eax, {}", operand(symbols, *r)).unwrap();
            }
        }
        Statement::Return { expr } => match expr {
            Some(e) => writeln!(out, "\tmovl\t{}, %eax\n\tret", operand(symbols, *e)).unwrap(),
            None => writeln!(out, "\tret").unwrap(),
        },
        Statement::Binary { op, result, left, right } => {
            let l = operand(symbols, *left);
            let r = operand(symbols, *right);
            let d = operand(symbols, *result);
            match op_mnemonic(*op) {
                OpForm::Binary(mnemonic) => {
                    writeln!(out, "\t{mnemonic}\t{l}, {r}, {d}").unwrap();
                }
                OpForm::Compare(mnemonic) => {
                    writeln!(out, "\tcmpl\t{r}, {l}\n\t{mnemonic}\t{d}").unwrap();
                }
            }
        }
        Statement::Unary { op, result, expr } => {
            let e = operand(symbols, *expr);
            let d = operand(symbols, *result);
            match op {
                UnOp::Negate => writeln!(out, "\tnegl\t{e}, {d}").unwrap(),
                UnOp::WidenByteToWord => writeln!(out, "\tmovsbl\t{e}, {d}").unwrap(),
            }
        }
        Statement::Copy { result, expr } => {
            writeln!(out, "\tmovl\t{}, {}", operand(symbols, *expr), operand(symbols, *result)).unwrap();
        }
        Statement::Index { result, array, index } => {
            writeln!(
                out,
                "\tmovl\t{}[{}], {}",
                operand(symbols, *array),
                operand(symbols, *index),
                operand(symbols, *result)
            )
            .unwrap();
        }
        Statement::Update { array, index, expr } => {
            writeln!(
                out,
                "\tmovl\t{}, {}[{}]",
                operand(symbols, *expr),
                operand(symbols, *array),
                operand(symbols, *index)
            )
            .unwrap();
        }
    }
}

/// A literal prints with the `$` immediate prefix the source's `operand()`
/// uses; every other symbol kind prints by name, addressed directly with no
/// register or stack-offset machinery.
fn operand(symbols: &SymbolTable, id: tac_core::SymbolId) -> String {
    let sym = symbols.get(id).unwrap();
    if sym.is_number() {
        format!("${}", sym.name)
    } else {
        sym.name.clone()
    }
}

enum OpForm {
    Binary(&'static str),
    Compare(&'static str),
}

fn op_mnemonic(op: tac_core::BinOp) -> OpForm {
    use tac_core::BinOp;
    match op {
        BinOp::Arith(ArithOp::Add) => OpForm::Binary("addl"),
        BinOp::Arith(ArithOp::Sub) => OpForm::Binary("subl"),
        BinOp::Arith(ArithOp::Mul) => OpForm::Binary("imull"),
        BinOp::Arith(ArithOp::Div) => OpForm::Binary("idivl"),
        BinOp::Arith(ArithOp::Mod) => OpForm::Binary("imodl"),
        BinOp::Arith(ArithOp::And) => OpForm::Binary("andl"),
        BinOp::Arith(ArithOp::Or) => OpForm::Binary("orl"),
        BinOp::Rel(RelOp::Eq) => OpForm::Compare("sete"),
        BinOp::Rel(RelOp::Ne) => OpForm::Compare("setne"),
        BinOp::Rel(RelOp::Lt) => OpForm::Compare("setl"),
        BinOp::Rel(RelOp::Gt) => OpForm::Compare("setg"),
        BinOp::Rel(RelOp::Le) => OpForm::Compare("setle"),
        BinOp::Rel(RelOp::Ge) => OpForm::Compare("setge"),
    }
}

fn jump_mnemonic(op: RelOp) -> &'static str {
    match op {
        RelOp::Eq => "je",
        RelOp::Ne => "jne",
        RelOp::Lt => "jl",
        RelOp::Gt => "jg",
        RelOp::Le => "jle",
        RelOp::Ge => "jge",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emitted(src: &str) -> String {
        let check_result = tac_frontend::compile_source(src).expect("valid program");
        let mut symbols = check_result.symbols;
        let f = &check_result.program.functions[0];
        let mut labels = tac_core::LabelAllocator::new();
        let mut func = tac_translate::translate_function(f, &mut symbols, &mut labels);
        tac_opt::optimize(&mut func, &mut symbols, &tac_opt::Options::all());
        emit_function(&func, &symbols).unwrap()
    }

    #[test]
    fn function_name_is_the_leading_label() {
        let text = emitted("int f(){ int x; x = 2 + 3; return x; }");
        assert!(text.starts_with("f:\n"));
    }

    #[test]
    fn return_lowers_to_a_move_into_eax_and_ret() {
        let text = emitted("int f(){ int x; x = 2 + 3; return x; }");
        assert!(text.contains("movl\t$5, %eax"));
        assert!(text.contains("\tret"));
    }

    #[test]
    fn missing_entry_block_is_reported() {
        let mut symbols = tac_core::SymbolTable::new();
        let name = symbols.declare(
            "f".into(),
            tac_core::TypeSpec::scalar(tac_core::Specifier::Word),
            tac_core::SymbolKind::Global,
        );
        let func = Function::new(name, Vec::new(), tac_core::ScopeId(0));
        assert!(matches!(emit_function(&func, &symbols), Err(EmitError::MissingEntryBlock)));
    }
}
