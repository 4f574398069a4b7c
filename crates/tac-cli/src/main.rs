//! `tac`: reads one source file (or stdin), runs the front end, translator,
//! and optimizer driver, and prints the AST, TAC, or toy assembly for the
//! first function it finds.
//!
//! Each `--dce`/`--cprop`/`--lvn`/`--asimp`/`--cfold` flag is parsed and
//! applied independently -- the source this is modeled on falls through its
//! option `switch`, so enabling one silently enables every flag after it in
//! the `case` list. That is treated as a bug here, not a feature to imitate.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};

/// TAC optimizing compiler back end.
#[derive(Parser, Debug)]
#[command(name = "tac", about = "TAC optimizing compiler back end")]
#[command(group(ArgGroup::new("output").args(["ast", "tac", "asm"]).multiple(false)))]
struct Cli {
    /// Source file to compile. Reads stdin when omitted.
    input: Option<PathBuf>,

    /// Emit the parsed AST instead of TAC or assembly.
    #[arg(short = 'A')]
    ast: bool,

    /// Emit three-address code.
    #[arg(short = 'T')]
    tac: bool,

    /// Emit target assembly (default).
    #[arg(short = 'S')]
    asm: bool,

    /// Accepted and ignored, for compatibility with the original CLI.
    #[arg(short = 'O')]
    opt_compat: bool,

    /// Enable dead-code elimination.
    #[arg(long)]
    dce: bool,

    /// Enable local copy propagation.
    #[arg(long)]
    cprop: bool,

    /// Enable local value numbering.
    #[arg(long)]
    lvn: bool,

    /// Enable algebraic simplification.
    #[arg(long)]
    asimp: bool,

    /// Enable constant folding.
    #[arg(long)]
    cfold: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Ast,
    Tac,
    Asm,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        if self.ast {
            OutputMode::Ast
        } else if self.tac {
            OutputMode::Tac
        } else {
            OutputMode::Asm
        }
    }

    fn opt_options(&self) -> tac_opt::Options {
        tac_opt::Options {
            dce: self.dce,
            asimp: self.asimp,
            cfold: self.cfold,
            lvn: self.lvn,
            cprop: self.cprop,
            cse: false,
        }
    }
}

fn read_source(input: &Option<PathBuf>) -> Result<String> {
    match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("could not read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("could not read stdin")?;
            Ok(buf)
        }
    }
}

fn run(cli: Cli) -> Result<String> {
    let source = read_source(&cli.input)?;

    if cli.output_mode() == OutputMode::Ast {
        let (program, errors) = tac_frontend::parse(&source);
        if !errors.is_empty() {
            for err in &errors {
                eprintln!("{err}");
            }
            anyhow::bail!("parse failed");
        }
        return Ok(format!("{program:#?}\n"));
    }

    let check_result = tac_frontend::compile_source(&source).map_err(|errors| {
        for err in &errors {
            eprintln!("{err}");
        }
        anyhow::anyhow!("compilation failed")
    })?;

    let mut symbols = check_result.symbols;
    let funcs = tac_translate::translate_program(&check_result.program, &mut symbols);
    let opts = cli.opt_options();

    let mut out = String::new();
    for decl in &check_result.program.functions {
        let mut func = funcs[&decl.symbol].clone();
        tracing::debug!(function = %symbols.get(decl.symbol).unwrap().name, "optimizing");
        tac_opt::optimize(&mut func, &mut symbols, &opts);
        match cli.output_mode() {
            OutputMode::Ast => unreachable!("handled above"),
            OutputMode::Tac => out.push_str(&tac_emit::print_tac(&func, &symbols)),
            OutputMode::Asm => out.push_str(
                &tac_emit::emit_function(&func, &symbols)
                    .context("instruction selection failed")?,
            ),
        }
    }
    Ok(out)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(text) => {
            print!("{text}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_source(src: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(src.as_bytes()).unwrap();
        f
    }

    fn cli_with(args: &[&str], input: &tempfile::NamedTempFile) -> Cli {
        let mut full = vec!["tac"];
        full.extend_from_slice(args);
        let path = input.path().to_str().unwrap().to_string();
        full.push(Box::leak(path.into_boxed_str()));
        Cli::parse_from(full)
    }

    #[test]
    fn default_output_mode_is_assembly() {
        let f = write_source("int f(){ int x; x = 2 + 3; return x; }");
        let cli = cli_with(&[], &f);
        assert_eq!(cli.output_mode(), OutputMode::Asm);
        let text = run(cli).unwrap();
        assert!(text.contains("f:"));
    }

    #[test]
    fn dash_t_selects_tac_output() {
        let f = write_source("int f(){ int x; x = 2 + 3; return x; }");
        let cli = cli_with(&["-T", "--dce", "--cfold", "--cprop"], &f);
        assert_eq!(cli.output_mode(), OutputMode::Tac);
        let text = run(cli).unwrap();
        assert!(text.contains("return 5"));
    }

    #[test]
    fn dash_a_selects_ast_output_and_skips_optimization() {
        let f = write_source("int f(){ int x; x = 2 + 3; return x; }");
        let cli = cli_with(&["-A"], &f);
        let text = run(cli).unwrap();
        assert!(text.contains("FunctionDecl"));
    }

    #[test]
    fn enabling_one_flag_does_not_enable_the_others() {
        let cli = Cli::parse_from(["tac", "--dce"]);
        let opts = cli.opt_options();
        assert!(opts.dce);
        assert!(!opts.asimp);
        assert!(!opts.cfold);
        assert!(!opts.lvn);
        assert!(!opts.cprop);
    }

    #[test]
    fn undeclared_name_is_reported_and_fails() {
        let f = write_source("int f(){ return y; }");
        let cli = cli_with(&["-T"], &f);
        assert!(run(cli).is_err());
    }

    #[test]
    fn unreadable_input_path_fails() {
        let cli = Cli::parse_from(["tac", "/nonexistent/path/does-not-exist.c"]);
        assert!(run(cli).is_err());
    }
}
