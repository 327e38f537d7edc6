//! Yeller bytecode to JSON converter

use clap::Parser;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use yellerc::bytecode::StreamReader;

#[derive(Parser, Debug)]
#[command(name = "yeller2json")]
#[command(version = "0.1.0")]
#[command(about = "Convert compiled Yeller bytecode to JSON", long_about = None)]
struct Args {
    /// Input bytecode file (gzip-compressed input is detected)
    input: PathBuf,

    /// Output JSON file (writes to stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output compact JSON (default is pretty-printed)
    #[arg(short, long)]
    compact: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let data = read_stream_file(&args.input)?;
    let instructions = StreamReader::parse(&data)?;

    let json_string = if args.compact {
        serde_json::to_string(&instructions)?
    } else {
        serde_json::to_string_pretty(&instructions)?
    };

    match args.output {
        Some(path) => {
            let mut file = File::create(path)?;
            file.write_all(json_string.as_bytes())?;
            file.write_all(b"\n")?;
        }
        None => {
            println!("{}", json_string);
        }
    }

    Ok(())
}

/// Read a bytecode file, decompressing when the gzip magic is present.
fn read_stream_file(path: &PathBuf) -> io::Result<Vec<u8>> {
    let mut file = File::open(path)?;

    let mut data = Vec::new();
    file.read_to_end(&mut data)?;

    if data.len() >= 2 && data[0] == 0x1f && data[1] == 0x8b {
        let cursor = std::io::Cursor::new(data);
        let mut decoder = GzDecoder::new(cursor);
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed)?;
        Ok(decompressed)
    } else {
        Ok(data)
    }
}
