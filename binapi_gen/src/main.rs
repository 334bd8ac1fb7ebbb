use binapi_gen::cmds;
use binapi_gen::cmds::analyze::ReportFormat;
use binapi_gen::codegen::OUTPUT_DIR;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "binapi-gen")]
#[command(about = "Rust code generator for binary API schema modules", long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /* Generate Rust sources from schema modules */
  Codegen {
    /* Input schema files (YAML or JSON) */
    #[arg(short = 'f', long = "files", value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /* Include directories for imported modules */
    #[arg(short = 'i', long = "include-dir", value_name = "DIR")]
    include_dirs: Vec<PathBuf>,

    /* Output directory for generated code */
    #[arg(short = 'o', long = "output", value_name = "DIR", default_value = OUTPUT_DIR)]
    output_dir: PathBuf,

    /* Skip writing binapi_runtime.rs */
    #[arg(long = "no-runtime")]
    no_runtime: bool,

    /* Emit unions as plain byte regions without member accessors */
    #[arg(long = "no-union-views")]
    no_union_views: bool,

    /* Enable verbose output */
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
  },

  /* Show resolved sizes, message classification and field roles */
  Analyze {
    /* Input schema files (YAML or JSON) */
    #[arg(short = 'f', long = "files", value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /* Include directories for imported modules */
    #[arg(short = 'i', long = "include-dir", value_name = "DIR")]
    include_dirs: Vec<PathBuf>,

    /* Also report imported modules */
    #[arg(short = 'a', long = "all")]
    all_modules: bool,

    /* Report a single message field by field */
    #[arg(short = 'm', long = "message", value_name = "NAME")]
    message: Option<String>,

    #[arg(long = "format", value_enum, default_value = "text")]
    format: ReportFormat,

    /* Enable verbose output */
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
  },
}

fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();

  match cli.command {
    Commands::Codegen { files, include_dirs, output_dir, no_runtime, no_union_views, verbose } => {
      cmds::common::init_logging(verbose);
      cmds::codegen::run(files, include_dirs, output_dir, no_runtime, no_union_views, verbose)?;
    }

    Commands::Analyze { files, include_dirs, all_modules, message, format, verbose } => {
      cmds::common::init_logging(verbose);
      cmds::analyze::run(files, include_dirs, all_modules, message, format)?;
    }
  }

  Ok(())
}
