use clap::Parser;
use ragmill_chunk::{SourceKind, TextSplitter};
use std::fs;
use std::io::{self, Read};

/// Chunk a text file into JSON output using ragmill-chunk.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the input text file. If not provided, reads from stdin.
    #[arg(short, long)]
    input: Option<String>,

    /// Source name recorded on each chunk.
    #[arg(short, long, default_value = "stdin")]
    source: String,

    /// Source kind: "pdf" or "web".
    #[arg(short = 'k', long, default_value = "web")]
    source_kind: SourceKind,

    /// Window size in characters.
    #[arg(short, long, default_value_t = 512)]
    chunk_size: usize,

    /// Overlap between consecutive windows, in characters.
    #[arg(short, long, default_value_t = 100)]
    overlap: usize,
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    let text = if let Some(input_path) = args.input {
        fs::read_to_string(input_path)?
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    };

    let splitter = TextSplitter::new(args.chunk_size, args.overlap)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
    let chunks = splitter.split(&text, &args.source, args.source_kind);

    let json_output = serde_json::to_string_pretty(&chunks)?;
    println!("{json_output}");

    Ok(())
}
