//! # CharCodec CLI - Character Encoding Converter
//!
//! Command-line interface for streaming conversions between UTF-8, UTF-16,
//! US-ASCII and single-byte code pages.

#[cfg(feature = "cli")]
use std::fs::{self, File};
#[cfg(feature = "cli")]
use std::io::{self, Read, Write};
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use serde::Serialize;
#[cfg(feature = "cli")]
use tracing::{debug, info, Level};

#[cfg(feature = "cli")]
use charcodec::{Codec, Error as CodecError, Options, Registry, StreamingTranslator};

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI features disabled. Enable with --features cli");
    std::process::exit(1);
}

/// CharCodec: streaming character encoding converter
#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "charcodec")]
#[command(version, about, long_about = None)]
#[command(author = "CharCodec Contributors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Convert files between character encodings
    Convert(ConvertArgs),

    /// List all supported encodings
    List(ListArgs),

    /// Validate that a file is properly encoded
    Validate(ValidateArgs),

    /// Display detailed information about an encoding
    Info(InfoArgs),

    /// Print an Accept-Charset header value for the supported encodings
    AcceptCharset,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct ConvertArgs {
    /// Source encoding
    #[arg(short = 'f', long = "from")]
    from: EncodingArg,

    /// Target encoding
    #[arg(short = 't', long = "to")]
    to: EncodingArg,

    /// Input file (stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON file with codec options (errorFatal, replacementChar, ...)
    #[arg(long)]
    options: Option<PathBuf>,

    /// Fail on the first invalid or unmappable sequence
    #[arg(long)]
    strict: bool,

    /// Replacement character for undecodable input (default: U+FFFD)
    #[arg(long)]
    replacement: Option<char>,

    /// Substitute byte for characters the target cannot encode (default: ?)
    #[arg(long)]
    substitute: Option<char>,

    /// Drop a leading BOM from the input
    #[arg(long)]
    strip_bom: bool,

    /// Write a BOM to the output (UTF-8 and UTF-16 only)
    #[arg(long)]
    add_bom: bool,

    /// Chunk size for streaming (KB)
    #[arg(long, default_value = "64")]
    buffer_size: usize,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct ListArgs {
    /// Show only ASCII-compatible encodings
    #[arg(long)]
    ascii_compatible: bool,

    /// Show only multibyte encodings
    #[arg(long)]
    multibyte: bool,

    /// Show encoding details
    #[arg(long)]
    details: bool,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct ValidateArgs {
    /// Input file (stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Expected encoding
    #[arg(short, long)]
    encoding: EncodingArg,

    /// Show position of first error
    #[arg(long)]
    show_errors: bool,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct InfoArgs {
    /// Encoding to describe
    encoding: EncodingArg,

    /// Show character mapping samples
    #[arg(long)]
    samples: bool,
}

#[cfg(feature = "cli")]
#[derive(Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[cfg(feature = "cli")]
#[derive(Clone, Copy, Debug)]
struct EncodingArg(Codec);

#[cfg(feature = "cli")]
impl std::str::FromStr for EncodingArg {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match Registry::default().lookup(s) {
            Some(codec) => Ok(EncodingArg(codec)),
            None => anyhow::bail!("Unknown encoding: {}", s),
        }
    }
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct ConversionResult {
    success: bool,
    bytes_processed: usize,
    bytes_written: usize,
    chunks: usize,
    processing_time_ms: u64,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct EncodingInfo {
    name: &'static str,
    ascii_compatible: bool,
    multibyte: bool,
    max_sequence_length: usize,
    bom: Option<String>,
    description: &'static str,
}

#[cfg(feature = "cli")]
impl EncodingInfo {
    fn new(codec: Codec) -> Self {
        Self {
            name: codec.name(),
            ascii_compatible: codec.is_ascii_compatible(),
            multibyte: codec.is_multibyte(),
            max_sequence_length: codec.max_sequence_length(),
            bom: codec.bom().map(|bom| format!("{:02X?}", bom)),
            description: get_encoding_description(codec),
        }
    }
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Convert(ref args) => convert_command(args, &cli)?,
        Commands::List(ref args) => list_command(args, &cli)?,
        Commands::Validate(ref args) => validate_command(args, &cli)?,
        Commands::Info(ref args) => info_command(args, &cli)?,
        Commands::AcceptCharset => accept_charset_command(&cli)?,
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn open_input(input: Option<&Path>) -> Result<Box<dyn Read>> {
    match input {
        Some(path) => {
            debug!("Reading from: {}", path.display());
            let file = File::open(path)
                .with_context(|| format!("Failed to open input file: {}", path.display()))?;
            Ok(Box::new(file))
        }
        None => {
            debug!("Reading from stdin");
            Ok(Box::new(io::stdin()))
        }
    }
}

#[cfg(feature = "cli")]
fn build_options(args: &ConvertArgs) -> Result<Options> {
    let mut options = match args.options {
        Some(ref path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("Failed to read options file: {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Invalid options file: {}", path.display()))?
        }
        None => Options::default(),
    };

    if args.strict {
        options.error_fatal = true;
    }
    if let Some(ch) = args.replacement {
        let unit = u16::try_from(u32::from(ch))
            .ok()
            .context("Replacement character must be in the Basic Multilingual Plane")?;
        options.replacement_char = unit;
    }
    if let Some(ch) = args.substitute {
        let byte = u8::try_from(u32::from(ch))
            .ok()
            .filter(u8::is_ascii)
            .context("Substitute must be an ASCII character")?;
        options.substitute_byte = byte;
    }
    if args.strip_bom {
        options.drop_byte_order_mark = true;
    }
    if args.add_bom {
        options.output_byte_order_mark = true;
    }

    debug!(?options, "conversion options");
    Ok(options)
}

#[cfg(feature = "cli")]
fn convert_command(args: &ConvertArgs, cli: &Cli) -> Result<()> {
    let start_time = std::time::Instant::now();

    let EncodingArg(from) = args.from;
    let EncodingArg(to) = args.to;
    info!("Converting from {} to {}", from.name(), to.name());

    let options = build_options(args)?;
    let mut translator = StreamingTranslator::new(from, to, options);

    let mut reader = open_input(args.input.as_deref())?;
    let mut writer: Box<dyn Write> = match args.output {
        Some(ref path) => Box::new(
            File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };

    let mut buffer = vec![0u8; args.buffer_size.max(1) * 1024];
    let mut bytes_processed = 0;
    let mut bytes_written = 0;
    let mut chunks = 0;

    loop {
        let read = reader.read(&mut buffer).context("Failed to read input")?;
        if read == 0 {
            break;
        }
        let output = translator
            .process_chunk(&buffer[..read])
            .with_context(|| format!("Conversion failed after {} bytes", bytes_processed))?;
        writer.write_all(&output).context("Failed to write output")?;
        bytes_processed += read;
        bytes_written += output.len();
        chunks += 1;
    }

    let tail = translator.finish().context("Conversion failed at end of input")?;
    writer.write_all(&tail).context("Failed to write output")?;
    writer.flush().context("Failed to flush output")?;
    bytes_written += tail.len();

    let processing_time = start_time.elapsed();
    debug!(
        "Processed {} bytes -> {} bytes in {} chunks ({:?})",
        bytes_processed, bytes_written, chunks, processing_time
    );

    match cli.format {
        OutputFormat::Json => {
            let result = ConversionResult {
                success: true,
                bytes_processed,
                bytes_written,
                chunks,
                processing_time_ms: processing_time.as_millis() as u64,
            };
            eprintln!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Text => {
            if cli.verbose || args.output.is_some() {
                eprintln!("✓ Conversion completed successfully");
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn list_command(args: &ListArgs, cli: &Cli) -> Result<()> {
    let filtered: Vec<Codec> = Codec::all()
        .into_iter()
        .filter(|codec| !args.ascii_compatible || codec.is_ascii_compatible())
        .filter(|codec| !args.multibyte || codec.is_multibyte())
        .collect();

    match cli.format {
        OutputFormat::Json => {
            let infos: Vec<EncodingInfo> = filtered.into_iter().map(EncodingInfo::new).collect();
            println!("{}", serde_json::to_string_pretty(&infos)?);
        }
        OutputFormat::Text => {
            println!("Supported Encodings ({} total):", filtered.len());
            println!();

            for codec in filtered {
                println!("{:15} {}", codec.name(), get_encoding_description(codec));

                if args.details {
                    println!(
                        "                ASCII Compatible: {}",
                        yes_no(codec.is_ascii_compatible())
                    );
                    println!("                Multibyte: {}", yes_no(codec.is_multibyte()));
                    if let Some(bom) = codec.bom() {
                        println!("                BOM: {:02X?}", bom);
                    }
                    println!();
                }
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn validate_command(args: &ValidateArgs, _cli: &Cli) -> Result<()> {
    let EncodingArg(codec) = args.encoding;

    let mut input_data = Vec::new();
    open_input(args.input.as_deref())?
        .read_to_end(&mut input_data)
        .context("Failed to read input")?;

    // Decoding with fatal errors validates the whole input
    match codec.decode(&input_data, &Options::strict()) {
        Ok(_) => {
            println!("✓ File is valid {}", codec.name());
            std::process::exit(0);
        }
        Err(e) => {
            println!("✗ File is not valid {}", codec.name());

            if args.show_errors {
                match e {
                    CodecError::InvalidByteSequence {
                        byte,
                        position,
                        reason,
                    } => {
                        println!(
                            "  Error at position {}: byte 0x{:02X} ({})",
                            position, byte, reason
                        );
                    }
                    CodecError::IncompleteByteSequence { byte, position } => {
                        println!(
                            "  Error at position {}: truncated sequence starting with 0x{:02X}",
                            position, byte
                        );
                    }
                    _ => println!("  Error: {}", e),
                }
            }

            std::process::exit(1);
        }
    }
}

#[cfg(feature = "cli")]
fn info_command(args: &InfoArgs, cli: &Cli) -> Result<()> {
    let EncodingArg(codec) = args.encoding;

    match cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&EncodingInfo::new(codec))?);
        }
        OutputFormat::Text => {
            println!("Encoding Information: {}", codec.name());
            println!("Description: {}", get_encoding_description(codec));
            println!("ASCII Compatible: {}", yes_no(codec.is_ascii_compatible()));
            println!("Multibyte: {}", yes_no(codec.is_multibyte()));
            println!("Max Sequence Length: {}", codec.max_sequence_length());

            if let Some(bom) = codec.bom() {
                println!("BOM: {:02X?}", bom);
            } else {
                println!("BOM: None");
            }

            if args.samples {
                println!("\nCharacter Samples:");
                print_character_samples(codec)?;
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn accept_charset_command(cli: &Cli) -> Result<()> {
    let header = Registry::default().accept_charset();
    match cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "accept_charset": header }));
        }
        OutputFormat::Text => println!("{}", header),
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

#[cfg(feature = "cli")]
fn get_encoding_description(codec: Codec) -> &'static str {
    match codec {
        Codec::UTF8 => "Unicode Transformation Format 8-bit, variable-length encoding",
        Codec::UTF16LE => "Unicode Transformation Format 16-bit, little-endian",
        Codec::UTF16BE => "Unicode Transformation Format 16-bit, big-endian",
        Codec::ASCII => "American Standard Code for Information Interchange (7-bit)",
        Codec::CodePage(page) => match page.name() {
            "ISO-8859-1" => "Latin alphabet No. 1, Western European",
            "ISO-8859-15" => "Latin alphabet No. 9, Western European with Euro symbol",
            "Windows-1252" => "Windows code page for Western European languages",
            _ => "Single-byte code page",
        },
    }
}

#[cfg(feature = "cli")]
fn print_character_samples(codec: Codec) -> Result<()> {
    let samples = ["A", "\u{E9}", "\u{20AC}", "\u{1F600}"];

    for sample in samples {
        match codec.encode_str(sample, &Options::strict()) {
            Ok(bytes) => println!("  {} -> {:02X?}", sample, bytes),
            Err(CodecError::UnmappableCharacter { codepoint, .. }) => {
                println!("  {} -> (no mapping for U+{:04X})", sample, codepoint)
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
