use binapi_gen::cmds;
use binapi_reflect::Codec;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "binapi")]
#[command(about = "Binary API toolchain - code generation, analysis, encoding and decoding")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate Rust sources from schema modules
    Codegen {
        /// Input schema files (YAML or JSON)
        #[arg(short = 'f', long = "files", value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Include directories for imported modules
        #[arg(short = 'i', long = "include-dir", value_name = "DIR")]
        include_dirs: Vec<PathBuf>,

        /// Output directory for generated code
        #[arg(
            short = 'o',
            long = "output",
            value_name = "DIR",
            default_value = "generated"
        )]
        output_dir: PathBuf,

        /// Skip writing the runtime support module
        #[arg(long = "no-runtime")]
        no_runtime: bool,

        /// Emit unions without member accessors
        #[arg(long = "no-union-views")]
        no_union_views: bool,

        /// Enable verbose output
        #[arg(short = 'v', long = "verbose")]
        verbose: bool,
    },

    /// Show resolved sizes, message classification and field roles
    Analyze {
        /// Input schema files (YAML or JSON)
        #[arg(short = 'f', long = "files", value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Include directories for imported modules
        #[arg(short = 'i', long = "include-dir", value_name = "DIR")]
        include_dirs: Vec<PathBuf>,

        /// Also report imported modules
        #[arg(short = 'a', long = "all")]
        all_modules: bool,

        /// Report a single message field by field
        #[arg(short = 'm', long = "message", value_name = "NAME")]
        message: Option<String>,

        /// Report format
        #[arg(long = "format", value_enum, default_value = "text")]
        format: Format,

        /// Enable verbose output
        #[arg(short = 'v', long = "verbose")]
        verbose: bool,
    },

    /// Encode a JSON value of a message or type and print it as hex
    Encode {
        /// Schema file(s) to load
        #[arg(short = 'f', long = "files", value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Include directories for resolving imports
        #[arg(short = 'i', long = "include-dir", value_name = "DIR")]
        include_dirs: Vec<PathBuf>,

        /// Message or type name
        #[arg(short = 'n', long = "name", required = true)]
        name: String,

        /// JSON value given inline
        #[arg(short = 'j', long = "json", conflicts_with = "input")]
        json: Option<String>,

        /// File holding the JSON value
        #[arg(short = 'd', long = "data-file", value_name = "FILE")]
        input: Option<PathBuf>,

        /// Write the raw bytes to this file instead of printing hex
        #[arg(short = 'o', long = "output", value_name = "FILE")]
        output: Option<PathBuf>,

        /// Enable verbose output
        #[arg(short = 'v', long = "verbose")]
        verbose: bool,
    },

    /// Decode bytes of a message or type and print them as JSON
    Decode {
        /// Schema file(s) to load
        #[arg(short = 'f', long = "files", value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Include directories for resolving imports
        #[arg(short = 'i', long = "include-dir", value_name = "DIR")]
        include_dirs: Vec<PathBuf>,

        /// Message or type name
        #[arg(short = 'n', long = "name", required = true)]
        name: String,

        /// Hex encoded bytes given inline
        #[arg(short = 'x', long = "hex", conflicts_with = "input")]
        hex: Option<String>,

        /// Binary data file to decode
        #[arg(short = 'd', long = "data-file", value_name = "FILE")]
        input: Option<PathBuf>,

        /// Pretty print JSON output
        #[arg(short = 'p', long = "pretty")]
        pretty: bool,

        /// Enable verbose output
        #[arg(short = 'v', long = "verbose")]
        verbose: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum Format {
    Text,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Codegen {
            files,
            include_dirs,
            output_dir,
            no_runtime,
            no_union_views,
            verbose,
        } => {
            cmds::common::init_logging(verbose);
            cmds::codegen::run(
                files,
                include_dirs,
                output_dir,
                no_runtime,
                no_union_views,
                verbose,
            )?;
        }

        Commands::Analyze {
            files,
            include_dirs,
            all_modules,
            message,
            format,
            verbose,
        } => {
            cmds::common::init_logging(verbose);
            let format = match format {
                Format::Text => cmds::analyze::ReportFormat::Text,
                Format::Json => cmds::analyze::ReportFormat::Json,
            };
            cmds::analyze::run(files, include_dirs, all_modules, message, format)?;
        }

        Commands::Encode {
            files,
            include_dirs,
            name,
            json,
            input,
            output,
            verbose,
        } => {
            cmds::common::init_logging(verbose);
            let codec = load_codec(&files, &include_dirs)?;
            let text = match (json, input) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)?,
                (None, None) => anyhow::bail!("Either --json or --data-file is required"),
            };
            let bytes = encode_json(&codec, &name, &text)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &bytes)?;
                    println!("Wrote {} bytes to {}", bytes.len(), path.display());
                }
                None => println!("{}", hex::encode(&bytes)),
            }
        }

        Commands::Decode {
            files,
            include_dirs,
            name,
            hex,
            input,
            pretty,
            verbose,
        } => {
            cmds::common::init_logging(verbose);
            let codec = load_codec(&files, &include_dirs)?;
            let bytes = match (hex, input) {
                (Some(text), _) => parse_hex(&text)?,
                (None, Some(path)) => read_data_file(&path)?,
                (None, None) => anyhow::bail!("Either --hex or --data-file is required"),
            };
            let json = decode_bytes(&codec, &name, &bytes)?;
            if pretty {
                println!("{}", serde_json::to_string_pretty(&json)?);
            } else {
                println!("{}", serde_json::to_string(&json)?);
            }
        }
    }

    Ok(())
}

/* Codec over every module the files load, imports included */
fn load_codec(files: &[PathBuf], include_dirs: &[PathBuf]) -> anyhow::Result<Codec> {
    let schema = cmds::common::load_schema(files, include_dirs)?;
    info!(modules = schema.resolved.len(), roots = ?schema.roots, "schema loaded");
    Ok(Codec::from_modules(&schema.resolved))
}

fn encode_json(codec: &Codec, name: &str, text: &str) -> anyhow::Result<Vec<u8>> {
    let json: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| anyhow::anyhow!("Invalid JSON input: {}", e))?;
    let value = codec
        .from_json(name, &json)
        .map_err(|e| anyhow::anyhow!("Failed to build {}: {}", name, e))?;
    codec
        .encode(name, &value)
        .map_err(|e| anyhow::anyhow!("Failed to encode {}: {}", name, e))
}

fn decode_bytes(codec: &Codec, name: &str, bytes: &[u8]) -> anyhow::Result<serde_json::Value> {
    let (value, used) = codec
        .decode_with_len(name, bytes)
        .map_err(|e| anyhow::anyhow!("Failed to decode {}: {}", name, e))?;
    if used < bytes.len() {
        warn!(name, used, total = bytes.len(), "ignoring trailing bytes");
    }
    codec
        .to_json(name, &value)
        .map_err(|e| anyhow::anyhow!("Failed to render {}: {}", name, e))
}

/* Accepts an optional 0x prefix and embedded whitespace */
fn parse_hex(text: &str) -> anyhow::Result<Vec<u8>> {
    let digits: String = text.split_whitespace().collect();
    let digits = digits.strip_prefix("0x").unwrap_or(&digits);
    hex::decode(digits).map_err(|e| anyhow::anyhow!("Invalid hex input: {}", e))
}

fn read_data_file(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))
}
