//! `dj`: the command-line entry point. Grounded on `typhon-cli::main`
//! (`clap::Parser` args, `env_logger::init`, `anyhow::Context` on I/O) minus
//! its LLVM-emission and driver-vs-components split, which have no
//! counterpart once there is exactly one pipeline and one output format.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

/// The DJ compiler: lowers a DJ source file to x86-64 NASM.
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
struct Args {
    /// DJ source file to compile
    #[clap(value_parser)]
    input: PathBuf,

    /// Output NASM path
    #[clap(short, long, value_parser, default_value = "program.asm")]
    output: PathBuf,

    /// Mirror each pipeline phase's progress to the log
    #[clap(short, long)]
    verbose: bool,

    /// Stop after writing the NASM file (the only behavior this CLI has —
    /// assembling and linking are out of scope; kept as an explicit flag so
    /// the default is documented rather than silently assumed).
    #[clap(long)]
    emit_asm_only: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    if args.verbose {
        log::debug!("reading {}", args.input.display());
    }
    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;

    let asm = dj_driver::compile_string(&source)
        .with_context(|| format!("failed to compile {}", args.input.display()))?;
    if args.verbose {
        log::debug!("emitted {} line(s) of NASM", asm.lines().count());
    }

    fs::write(&args.output, asm)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    if args.verbose {
        log::debug!("wrote {}", args.output.display());
    }

    log::trace!("emit_asm_only={}", args.emit_asm_only);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(input: PathBuf, output: PathBuf) -> Args {
        Args { input, output, verbose: false, emit_asm_only: false }
    }

    #[test]
    fn writes_nasm_for_a_valid_program() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("prog.dj");
        let output = dir.path().join("program.asm");
        fs::write(&input, "main { printNat(1+2*3); }").expect("write fixture");

        run(&args(input, output.clone())).expect("should compile");

        let asm = fs::read_to_string(&output).expect("output should exist");
        assert!(asm.contains("_start:"));
    }

    #[test]
    fn reports_a_missing_input_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("missing.dj");
        let output = dir.path().join("program.asm");

        assert!(run(&args(input, output)).is_err());
    }

    #[test]
    fn reports_a_compile_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("prog.dj");
        let output = dir.path().join("program.asm");
        fs::write(&input, "class A extends Object {} class A extends Object {} main { 0; }")
            .expect("write fixture");

        let err = run(&args(input, output)).unwrap_err();
        assert!(format!("{err:#}").contains("duplicate class name"));
    }
}
