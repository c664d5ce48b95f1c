use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use chunk_huffman::{verify_files, CodecConfig, Compressor, Result};

const USAGE: &str = "usage:
  chunk-huffman compress <input> <output> [--config <file>]
  chunk-huffman decompress <input> <output> [--config <file>]
  chunk-huffman verify <original> <decompressed>
  chunk-huffman roundtrip <input> [--config <file>]";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            eprintln!("{}", USAGE);
            ExitCode::from(2)
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Splits off a trailing `--config <file>` pair.
fn take_config(args: &[String]) -> Result<(Vec<&str>, CodecConfig)> {
    let mut positional = Vec::new();
    let mut config = CodecConfig::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            match iter.next() {
                Some(path) => config = CodecConfig::load(Path::new(path))?,
                None => {
                    return Err(chunk_huffman::HuffmanError::Config(
                        "--config needs a file".to_string(),
                    ))
                }
            }
        } else {
            positional.push(arg.as_str());
        }
    }
    Ok((positional, config))
}

fn run(args: &[String]) -> Result<bool> {
    let Some((command, rest)) = args.split_first() else {
        return Ok(false);
    };
    let (positional, config) = take_config(rest)?;
    let compressor = Compressor::new(config)?;

    match (command.as_str(), positional.as_slice()) {
        ("compress", [input, output]) => {
            let summary = compressor.compress_file(Path::new(input), Path::new(output))?;
            println!(
                "compressed {} symbols in {} chunks to {} bytes",
                summary.symbols, summary.chunks, summary.container_bytes
            );
        }
        ("decompress", [input, output]) => {
            let summary = compressor.decompress_file(Path::new(input), Path::new(output))?;
            println!("decompressed {} symbols from {} chunks", summary.symbols, summary.chunks);
            if summary.truncated {
                println!("warning: container was truncated");
            }
        }
        ("verify", [original, decompressed]) => {
            let lines = verify_files(Path::new(original), Path::new(decompressed))?;
            println!("files match ({} lines)", lines);
        }
        ("roundtrip", [input]) => {
            let input = Path::new(input);
            let compressed = with_suffix(input, "bin");
            let restored = with_suffix(input, "out");

            let packed = compressor.compress_file(input, &compressed)?;
            compressor.decompress_file(&compressed, &restored)?;
            let lines = verify_files(input, &restored)?;
            println!(
                "round trip ok: {} symbols, {} bytes compressed, {} lines verified",
                packed.symbols, packed.container_bytes, lines
            );
        }
        _ => return Ok(false),
    }
    Ok(true)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}
