use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "yellerc")]
#[command(version = "0.1.0")]
#[command(about = "Trackerboy module to Yeller bytecode compiler", long_about = None)]
struct Args {
    /// Output bytecode file
    output: PathBuf,

    /// Input module file (reads from stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Song index to compile
    #[arg(short, long, default_value_t = 0)]
    song: usize,

    /// Write the wavetable blob to this file
    #[arg(short, long)]
    wavetable: Option<PathBuf>,
}

fn main() -> Result<(), yellerc::Error> {
    let args = Args::parse();

    let mut compiler = yellerc::Compiler::new();

    match &args.input {
        Some(path) => {
            compiler.compile_file(path, &args.output, args.song)?;
        }
        None => {
            compiler.compile(std::io::stdin(), &args.output, args.song)?;
        }
    }

    if let Some(path) = &args.wavetable {
        compiler.write_wavetable(path)?;
    }

    Ok(())
}
