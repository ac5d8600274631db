use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::Context;
use argh::FromArgs;
use tracing_subscriber::EnvFilter;

use lib_tally_core::backend;
use lib_tally_core::compile::{self, CompileError};
use lib_tally_core::ir;
use lib_tally_core::lower::Lower;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EmitType {
  Asm,
  Ir,
  Tree,
  Ast,
  Tokens,
}

impl fmt::Display for EmitType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      EmitType::Asm => write!(f, "asm"),
      EmitType::Ir => write!(f, "ir"),
      EmitType::Tree => write!(f, "tree"),
      EmitType::Ast => write!(f, "ast"),
      EmitType::Tokens => write!(f, "tokens"),
    }
  }
}

impl argh::FromArgValue for EmitType {
  fn from_arg_value(value: &str) -> Result<Self, String> {
    match value {
      "asm" => Ok(EmitType::Asm),
      "ir" => Ok(EmitType::Ir),
      "tree" => Ok(EmitType::Tree),
      "ast" => Ok(EmitType::Ast),
      "tokens" => Ok(EmitType::Tokens),
      other => Err(format!(
        "unknown emit type '{other}', expected one of asm, ir, tree, ast, tokens"
      )),
    }
  }
}

/// tally - compiles arithmetic statements to accumulator assembly
#[derive(FromArgs)]
struct Args {
  /// input source file, a `.ir` file is read as an ir listing
  #[argh(option, long = "in")]
  input: String,

  /// output file path, `-` writes to stdout
  #[argh(option)]
  out: String,

  /// artefact to write: asm, ir, tree, ast or tokens (default: asm)
  #[argh(option, default = "EmitType::Asm")]
  emit: EmitType,

  /// log every stage at debug level (RUST_LOG overrides)
  #[argh(switch, short = 'v')]
  verbose: bool,
}

fn init_logging(verbose: bool) {
  let default = if verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(false)
    .with_writer(io::stderr)
    .init();
}

// runs the pipeline up to the requested artefact, nothing is written on failure
fn build(source: &str, emit: EmitType) -> Result<String, CompileError> {
  match emit {
    EmitType::Tokens => {
      let tokens = compile::tokenize(source);
      Ok(tokens.iter().map(|t| format!("{t}\n")).collect())
    }
    EmitType::Ast => Ok(compile::parse(source)?.to_string()),
    EmitType::Tree => {
      let program = compile::parse(source)?;
      let tree = Lower::new().build(&program)?;
      Ok(tree.iter().map(|node| format!("{node}\n")).collect())
    }
    EmitType::Ir => {
      let program = compile::parse(source)?;
      Ok(ir::listing(&compile::lower(&program)?))
    }
    EmitType::Asm => compile::compile(source),
  }
}

fn write_output(out: &str, text: &str) -> anyhow::Result<()> {
  if out == "-" {
    io::stdout().write_all(text.as_bytes())?;
    return Ok(());
  }
  fs::write(out, text).with_context(|| format!("failed to write {out}"))
}

fn main() -> Result<(), anyhow::Error> {
  let args: Args = argh::from_env();
  init_logging(args.verbose);

  let input_path = Path::new(&args.input);
  let source = fs::read_to_string(input_path)
    .with_context(|| format!("failed to read {}", input_path.display()))?;

  let is_listing = input_path.extension().is_some_and(|ext| ext == "ir");
  let text = if is_listing {
    if args.emit != EmitType::Asm {
      anyhow::bail!("ir listings can only be emitted as asm, got --emit {}", args.emit);
    }
    backend::emit_listing(&source).map_err(|e| anyhow::anyhow!("emit error - {e}"))?
  } else {
    build(&source, args.emit).map_err(|e| anyhow::anyhow!("{} failed: {e}", e.stage()))?
  };

  write_output(&args.out, &text)?;
  tracing::info!(input = %args.input, out = %args.out, emit = %args.emit, "compiled");

  Ok(())
}
