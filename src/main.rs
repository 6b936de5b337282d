use std::io::Read;

use anyhow::{anyhow, Context, Result};
use aurora::{report, Error, Interpreter};
use aurora_vm::VmConfig;
use clap::Parser as ClapParser;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let opt = Opt::parse();
    if let Err(e) = run(opt) {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(opt: Opt) -> Result<()> {
    let input = read_input(&opt)?;

    if opt.compile_only {
        let unit = aurora_codegen::compile_chunk(&input)
            .map_err(|e| anyhow!(report::render_compile_error(&input, &e)))?;
        print!("{}", unit.disassemble());
        return Ok(());
    }

    let config = VmConfig {
        max_call_depth: opt.max_call_depth,
    };
    let mut interpreter = Interpreter::with_config(config);
    interpreter.run(&input).map_err(|e| match e {
        Error::Compile(e) => anyhow!(report::render_compile_error(&input, &e)),
        e @ Error::Runtime(_) => anyhow!(e.to_string()),
    })?;
    Ok(())
}

fn read_input(opt: &Opt) -> Result<String> {
    if let Some(e) = &opt.eval {
        Ok(e.clone())
    } else if let Some(f) = &opt.file {
        std::fs::read_to_string(f).with_context(|| format!("Failed to read file {}", f))
    } else {
        let mut s = String::new();
        std::io::stdin()
            .lock()
            .read_to_string(&mut s)
            .context("Failed to read standard input")?;
        Ok(s)
    }
}

#[derive(clap::Parser)]
#[clap(about, version, author)]
struct Opt {
    /// Only compile the input. Outputs the disassembled bytecode.
    #[clap(long)]
    compile_only: bool,

    /// Evaluate the given string as an Aurora program.
    #[clap(short, long)]
    eval: Option<String>,

    /// Evaluate the given file as an Aurora program.
    #[clap(short, long)]
    file: Option<String>,

    /// Limit on nested function calls.
    #[clap(long)]
    max_call_depth: Option<usize>,
}
