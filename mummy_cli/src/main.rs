use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};

use mummy_core::tag::{COMPRESSED_FLAG, TAG_MASK};
use mummy_core::{dumps, loads, Date, Decimal, SpecialNum, Value};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "mummy",
    about = "Encode, decode, and inspect mummy binary streams",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a built-in fixture value and write it to a file
    Dump {
        /// Destination file ("-" writes to stdout)
        output: PathBuf,
        /// Which built-in fixture to encode: greeting | numbers | mixed
        #[arg(short, long, default_value = "mixed")]
        fixture: String,
        /// Wrap the result in the LZF compression envelope if it shrinks
        #[arg(long)]
        compress: bool,
    },
    /// Decode a mummy stream and print its value
    Load {
        /// Source file ("-" reads stdin)
        input: PathBuf,
    },
    /// Print envelope and tag information without fully decoding
    Inspect {
        /// Source file ("-" reads stdin)
        input: PathBuf,
    },
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn read_input(path: &PathBuf) -> anyhow::Result<Vec<u8>> {
    if path.to_str() == Some("-") {
        let mut buf = Vec::new();
        io::stdin().lock().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        let mut buf = Vec::new();
        File::open(path)
            .with_context(|| format!("opening input file {path:?}"))?
            .read_to_end(&mut buf)?;
        Ok(buf)
    }
}

fn write_output(path: &PathBuf, bytes: &[u8]) -> anyhow::Result<()> {
    if path.to_str() == Some("-") {
        io::stdout().write_all(bytes)?;
    } else {
        File::create(path)
            .with_context(|| format!("creating output file {path:?}"))?
            .write_all(bytes)?;
    }
    Ok(())
}

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{n} B")
    } else {
        format!("{v:.2} {}", UNITS[unit])
    }
}

fn tag_name(tag: u8) -> &'static str {
    use mummy_core::tag::*;
    match tag {
        NULL => "Null",
        BOOL => "Bool",
        CHAR => "Int(i8)",
        SHORT => "Int(i16)",
        INT => "Int(i32)",
        LONG => "Int(i64)",
        HUGE => "Huge",
        FLOAT => "Float",
        SHORTSTR | MEDSTR | LONGSTR => "Bytes",
        SHORTUTF8 | MEDUTF8 | LONGUTF8 => "Utf8",
        SHORTLIST | MEDLIST | LONGLIST => "List",
        SHORTTUPLE | MEDTUPLE | LONGTUPLE => "Tuple",
        SHORTSET | MEDSET | LONGSET => "Set",
        SHORTHASH | MEDHASH | LONGHASH => "Hash",
        DATE => "Date",
        TIME => "Time",
        DATETIME => "DateTime",
        TIMEDELTA => "TimeDelta",
        DECIMAL => "Decimal",
        SPECIALNUM => "SpecialNum",
        _ => "<unknown>",
    }
}

/// Built-in fixtures so `dump`/`load`/`inspect` have something to exercise
/// without needing a textual value syntax.
fn fixture(name: &str) -> anyhow::Result<Value> {
    match name {
        "greeting" => Ok(Value::Hash(vec![
            (Value::utf8("message"), Value::utf8("hello, mummy")),
            (Value::utf8("when"), Value::Date(Date { year: 2026, month: 7, day: 26 })),
        ])),
        "numbers" => Ok(Value::List(vec![
            Value::Int(0),
            Value::Int(-129),
            Value::Int(70000),
            Value::Decimal(Decimal {
                negative: false,
                exponent: -2,
                digits: vec![1, 9, 9, 9],
            }),
            Value::SpecialNum(SpecialNum::PosInfinity),
        ])),
        "mixed" => Ok(Value::Tuple(vec![
            fixture("greeting")?,
            fixture("numbers")?,
            Value::Set(vec![Value::Bool(true), Value::Null]),
        ])),
        other => anyhow::bail!("unknown fixture '{other}'. Valid options: greeting, numbers, mixed"),
    }
}

// ── Subcommand implementations ──────────────────────────────────────────────

fn run_dump(output: PathBuf, fixture_name: &str, compress: bool) -> anyhow::Result<()> {
    let value = fixture(fixture_name)?;
    let t0 = Instant::now();
    let bytes = dumps(&value, None, compress).context("encoding fixture")?;
    let elapsed = t0.elapsed();

    write_output(&output, &bytes)?;

    eprintln!("  fixture     : {fixture_name}");
    eprintln!("  compressed  : {compress}");
    eprintln!("  size        : {}", human_bytes(bytes.len() as u64));
    eprintln!("  elapsed     : {:.6}s", elapsed.as_secs_f64());
    Ok(())
}

fn run_load(input: PathBuf) -> anyhow::Result<()> {
    let bytes = read_input(&input)?;
    let t0 = Instant::now();
    let value = loads(&bytes).context("decoding stream")?;
    let elapsed = t0.elapsed();

    println!("{value:#?}");
    eprintln!("  decoded in  : {:.6}s", elapsed.as_secs_f64());
    Ok(())
}

fn run_inspect(input: PathBuf) -> anyhow::Result<()> {
    let bytes = read_input(&input)?;
    let Some(&first) = bytes.first() else {
        println!("(empty stream)");
        return Ok(());
    };
    let compressed = first & COMPRESSED_FLAG != 0;
    let outer_tag = first & TAG_MASK;

    println!("  total size     : {}", human_bytes(bytes.len() as u64));
    println!("  compressed     : {compressed}");
    println!("  outer tag      : 0x{outer_tag:02x} ({})", tag_name(outer_tag));
    if compressed {
        if bytes.len() < 5 {
            anyhow::bail!("compressed stream too short to carry a length prefix");
        }
        let declared_len = u32::from_be_bytes(bytes[1..5].try_into().unwrap());
        println!("  uncompressed   : {}", human_bytes(declared_len as u64));
        println!(
            "  ratio          : {:.2}x",
            declared_len as f64 / (bytes.len() as f64)
        );
    }
    Ok(())
}

// ── Entry point ──────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Dump {
            output,
            fixture,
            compress,
        } => run_dump(output, &fixture, compress),
        Commands::Load { input } => run_load(input),
        Commands::Inspect { input } => run_inspect(input),
    }
}
