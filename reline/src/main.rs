use std::fs::File;
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use reline_stream::{LineEnding, ReplaceError, ReplaceFn, RewriteStream, TextEncoding};
use structopt::StructOpt;

mod error;

use error::{Error, Result};

#[derive(Debug)]
struct ParseEncodingError(String);

impl std::error::Error for ParseEncodingError {}

impl std::fmt::Display for ParseEncodingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Unknown text encoding: {} (expected one of: {})",
            self.0,
            TextEncoding::available_variants().join(", ")
        )
    }
}

fn parse_encoding(src: &str) -> std::result::Result<TextEncoding, ParseEncodingError> {
    TextEncoding::for_label(src).ok_or_else(|| ParseEncodingError(src.to_string()))
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "reline",
    about = "Rewrite text matching a pattern, line by line, while streaming.",
    usage = "reline [FLAGS|OPTIONS] <pattern> <replacement> [files]..."
)]
struct CliOpts {
    #[structopt(short, long, help = "Show verbose output")]
    verbose: bool,

    #[structopt(
        short,
        long,
        parse(try_from_str = parse_encoding),
        default_value = "ascii",
        help = "Text encoding of the input"
    )]
    encoding: TextEncoding,

    #[structopt(long, help = "Treat carriage-return + line-feed as the line terminator")]
    crlf: bool,

    #[structopt(
        short,
        long,
        parse(from_os_str),
        help = "Write output to a file instead of stdout"
    )]
    output: Option<PathBuf>,

    #[structopt(name = "pattern", help = "Regular expression applied to every line")]
    pattern: String,

    #[structopt(name = "replacement", help = "Text substituted for every match")]
    replacement: String,

    #[structopt(
        name = "files",
        parse(from_os_str),
        help = "Files to filter; stdin is filtered when none are given"
    )]
    files: Vec<PathBuf>,
}

fn rule(replacement: &str) -> ReplaceFn {
    let replacement = replacement.to_string();
    Box::new(move |_: &str| -> std::result::Result<String, ReplaceError> {
        Ok(replacement.clone())
    })
}

fn line_ending(opts: &CliOpts) -> LineEnding {
    if opts.crlf {
        LineEnding::CrLf
    } else {
        LineEnding::Lf
    }
}

fn filter_file(path: &Path, opts: &CliOpts, out: &mut dyn Write) -> Result<()> {
    let file = File::open(path).map_err(|source| Error::OpenFile {
        path: path.to_path_buf(),
        source,
    })?;

    let mut stream = RewriteStream::with_options(
        file,
        &opts.pattern,
        rule(&opts.replacement),
        opts.encoding,
        line_ending(opts),
    )
    .map_err(|source| Error::Filter { source })?;

    io::copy(&mut stream, out).map_err(|source| Error::WriteOutput { source })?;
    Ok(())
}

fn filter_stdin(opts: &CliOpts, out: &mut dyn Write) -> Result<()> {
    let mut buf = Vec::new();
    io::stdin()
        .read_to_end(&mut buf)
        .map_err(|source| Error::ReadStdin { source })?;

    let mut stream = RewriteStream::with_options(
        Cursor::new(buf),
        &opts.pattern,
        rule(&opts.replacement),
        opts.encoding,
        line_ending(opts),
    )
    .map_err(|source| Error::Filter { source })?;

    io::copy(&mut stream, out).map_err(|source| Error::WriteOutput { source })?;
    Ok(())
}

fn run(opts: CliOpts) -> anyhow::Result<()> {
    let mut out: Box<dyn Write> = match &opts.output {
        Some(path) => {
            let file = File::create(path).map_err(|source| Error::CreateOutput {
                path: path.clone(),
                source,
            })?;
            Box::new(io::BufWriter::new(file))
        }
        None => Box::new(io::stdout()),
    };

    if opts.files.is_empty() {
        filter_stdin(&opts, &mut out).context("failed to filter stdin")?;
    } else {
        for path in &opts.files {
            filter_file(path, &opts, &mut out)
                .with_context(|| format!("failed to filter `{}`", path.display()))?;
        }
    }

    out.flush()
        .map_err(|source| Error::WriteOutput { source })?;
    Ok(())
}

fn main() {
    let opts = CliOpts::from_iter(wild::args_os());

    if opts.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .init();
    }

    if let Err(e) = run(opts) {
        eprintln!("{:?}", e);
        std::process::exit(1);
    }
}
