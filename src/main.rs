// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Command-line interface for claude2html.
//!
//! This binary provides the `claude2html` command for converting exported
//! Claude conversations from JSON to self-contained HTML pages.

use claude2html::parser::{self, AttachmentMap};
use claude2html::renderer::{self, Theme};
use lexopt::prelude::*;
use snafu::{OptionExt, ensure, prelude::*};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use walkdir::WalkDir;

/// Where to write the rendered output.
#[derive(Clone)]
enum OutputTarget {
    /// Write each page to the specified directory.
    Directory(PathBuf),
    /// Write the single input's page to this file.
    File(PathBuf),
    /// Write to stdout.
    Stdout,
}

#[allow(clippy::struct_excessive_bools)]
struct Cli {
    input: Vec<PathBuf>,
    output: OutputTarget,
    attachments: Option<PathBuf>,
    show_thinking: bool,
    show_tools: bool,
    theme: Theme,
    fragment: bool,
    quiet: bool,
    verbose: bool,
    dry_run: bool,
    force: bool,
}

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to parse arguments: {source}"))]
    ParseArgs { source: lexopt::Error },

    #[snafu(display("at least one input file or directory is required"))]
    NoInputFiles,

    #[snafu(display("cannot write {count} conversations to {target}; use an output directory"))]
    MultipleFilesToSingleOutput { count: usize, target: String },

    #[snafu(display("failed to create output directory: {source}"))]
    CreateOutputDir { source: std::io::Error },

    #[snafu(display("failed to read {}: {source}", path.display()))]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to parse {}: {source}", path.display()))]
    ParseFile {
        path: PathBuf,
        source: parser::ParseError,
    },

    #[snafu(display("failed to parse attachment map {}: {source}", path.display()))]
    ParseAttachments {
        path: PathBuf,
        source: parser::ParseError,
    },

    #[snafu(display("invalid input filename: no file stem"))]
    InvalidFilename,

    #[snafu(display("failed to write {}: {source}", path.display()))]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn print_help() {
    println!(
        "\
{name} {version}
Convert exported Claude conversations to self-contained HTML

Usage: {name} [OPTIONS] -o <OUTPUT> <INPUT>...

Arguments:
  <INPUT>...  Input JSON files or directories containing exports

Options:
  -o, --output <OUTPUT>     Output directory, a .html file for a single input,
                            or - for stdout
      --attachments <FILE>  JSON object mapping file UUIDs to data URIs
      --fragment            Emit only the conversation markup, without the page
      --theme <THEME>       Initial color scheme: light or dark (default: light)

Content display (use --show-* or --hide-*):
      --show-thinking       Include thinking blocks (default: on)
      --hide-thinking       Hide thinking blocks
      --show-tools          Include tool calls and results (default: on)
      --hide-tools          Hide tool calls and results

Other options:
  -q, --quiet               Only report warnings and errors
  -v, --verbose             Report rendering details
  -n, --dry-run             Show what would be processed without writing
  -f, --force               Overwrite existing output files
  -h, --help                Print help
  -V, --version             Print version

The RUST_LOG environment variable overrides --quiet and --verbose.",
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
    );
}

fn parse_args() -> Result<Cli, lexopt::Error> {
    // Show help if no arguments provided
    if std::env::args().len() == 1 {
        print_help();
        std::process::exit(0);
    }

    let mut input = Vec::new();
    let mut output: Option<OutputTarget> = None;
    let mut attachments = None;
    let mut show_thinking = true;
    let mut show_tools = true;
    let mut theme = Theme::Light;
    let mut fragment = false;
    let mut quiet = false;
    let mut verbose = false;
    let mut dry_run = false;
    let mut force = false;

    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Short('o') | Long("output") => {
                let val: PathBuf = parser.value()?.parse()?;
                output = Some(if val == Path::new("-") {
                    OutputTarget::Stdout
                } else if val.extension().is_some_and(|ext| ext == "html") {
                    OutputTarget::File(val)
                } else {
                    OutputTarget::Directory(val)
                });
            }
            Long("attachments") => attachments = Some(parser.value()?.parse()?),
            Long("fragment") => fragment = true,
            Long("theme") => {
                let val: String = parser.value()?.parse()?;
                theme = match val.as_str() {
                    "light" => Theme::Light,
                    "dark" => Theme::Dark,
                    _ => return Err("theme must be light or dark".into()),
                };
            }
            // Show/hide flags - last one wins
            Long("show-thinking") => show_thinking = true,
            Long("hide-thinking") => show_thinking = false,
            Long("show-tools") => show_tools = true,
            Long("hide-tools") => show_tools = false,
            Short('q') | Long("quiet") => quiet = true,
            Short('v') | Long("verbose") => verbose = true,
            Short('n') | Long("dry-run") => dry_run = true,
            Short('f') | Long("force") => force = true,
            Short('h') | Long("help") => {
                print_help();
                std::process::exit(0);
            }
            Short('V') | Long("version") => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            Value(val) => input.push(val.parse()?),
            _ => return Err(arg.unexpected()),
        }
    }

    Ok(Cli {
        input,
        output: output.ok_or("missing required option: --output")?,
        attachments,
        show_thinking,
        show_tools,
        theme,
        fragment,
        quiet,
        verbose,
        dry_run,
        force,
    })
}

/// Installs a stderr log subscriber. `RUST_LOG` takes precedence over flags.
fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .init();
}

fn main() -> Result<(), Error> {
    let cli = parse_args().context(ParseArgsSnafu)?;
    init_logging(&cli);

    ensure!(!cli.input.is_empty(), NoInputFilesSnafu);

    let files = collect_input_files(&cli.input);
    let attachments = load_attachments(cli.attachments.as_deref())?;
    let opts = make_render_options(&cli);

    match &cli.output {
        OutputTarget::Stdout => {
            ensure!(
                files.len() == 1,
                MultipleFilesToSingleOutputSnafu {
                    count: files.len(),
                    target: "stdout"
                }
            );
            process_to_stdout(&files[0], &attachments, &opts, &cli)?;
        }
        OutputTarget::File(path) => {
            ensure!(
                files.len() == 1,
                MultipleFilesToSingleOutputSnafu {
                    count: files.len(),
                    target: path.display().to_string()
                }
            );
            process_file(&files[0], path, &attachments, &opts, &cli)?;
        }
        OutputTarget::Directory(dir) => {
            if !cli.dry_run {
                std::fs::create_dir_all(dir).context(CreateOutputDirSnafu)?;
            }
            for file in &files {
                let out_name = file.file_stem().context(InvalidFilenameSnafu)?;
                let out_path = dir.join(format!("{}.html", out_name.to_string_lossy()));
                process_file(file, &out_path, &attachments, &opts, &cli)?;
            }
        }
    }

    Ok(())
}

/// Collects all JSON files from the given inputs (files and directories).
fn collect_input_files(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
            {
                files.push(entry.path().to_path_buf());
            }
        } else {
            files.push(input.clone());
        }
    }
    debug!(count = files.len(), "collected input files");
    files
}

/// Reads the optional UUID-to-data-URI map for uploaded files.
fn load_attachments(path: Option<&Path>) -> Result<AttachmentMap, Error> {
    let Some(path) = path else {
        return Ok(AttachmentMap::new());
    };
    let json = std::fs::read_to_string(path).context(ReadFileSnafu { path })?;
    let map = parser::parse_attachment_map(&json).context(ParseAttachmentsSnafu { path })?;
    debug!(count = map.len(), "loaded attachment map");
    Ok(map)
}

/// Creates render options from CLI arguments.
#[allow(clippy::missing_const_for_fn)]
fn make_render_options(cli: &Cli) -> renderer::RenderOptions {
    renderer::RenderOptions {
        show_thinking: cli.show_thinking,
        show_tools: cli.show_tools,
        theme: cli.theme,
        fragment: cli.fragment,
    }
}

/// Reads, parses and renders one input file.
fn render_file(
    input: &Path,
    attachments: &AttachmentMap,
    opts: &renderer::RenderOptions,
) -> Result<String, Error> {
    let json = std::fs::read_to_string(input).context(ReadFileSnafu { path: input })?;
    let conversation =
        parser::parse_conversation(&json).context(ParseFileSnafu { path: input })?;
    debug!(
        path = %input.display(),
        messages = conversation.messages.len(),
        "parsed conversation"
    );
    Ok(renderer::render_conversation(&conversation, attachments, opts))
}

/// Processes a single file and outputs to stdout.
fn process_to_stdout(
    input: &Path,
    attachments: &AttachmentMap,
    opts: &renderer::RenderOptions,
    cli: &Cli,
) -> Result<(), Error> {
    if cli.dry_run {
        info!("Would output {}", input.display());
        return Ok(());
    }

    let html = render_file(input, attachments, opts)?;
    print!("{html}");
    Ok(())
}

/// Processes a single file and writes it to `out_path`.
fn process_file(
    input: &Path,
    out_path: &Path,
    attachments: &AttachmentMap,
    opts: &renderer::RenderOptions,
    cli: &Cli,
) -> Result<(), Error> {
    if cli.dry_run {
        info!("Would write {}", out_path.display());
        return Ok(());
    }

    if out_path.exists() && !cli.force {
        warn!(
            "Skipping {} (already exists, use --force to overwrite)",
            out_path.display()
        );
        return Ok(());
    }

    let html = render_file(input, attachments, opts)?;

    if let Some(parent) = out_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).context(CreateOutputDirSnafu)?;
    }
    std::fs::write(out_path, &html).context(WriteFileSnafu { path: out_path })?;

    info!("Wrote {}", out_path.display());
    Ok(())
}
