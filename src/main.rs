//! lectio - scripture rendering and gloss sharding

use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use lectio::index::ChapterIndex;
use lectio::render::{HtmlConfig, MarkdownConfig, render_html, render_markdown, render_segments};
use lectio::unihan::{
    CancelToken, Codepoint, PaginationPolicy, ShardConfig, ShardNaming, UnihanField,
    paginate_fields, parse_codepoint_major, parse_field_major, write_shards,
};
use lectio::usx::{ParseOptions, parse_usx};

#[derive(Parser)]
#[command(name = "lectio")]
#[command(version, about = "Scripture rendering and gloss sharding", long_about = None)]
#[command(after_help = "EXAMPLES:
    lectio render GEN.usx -f html -o gen.html     Render a book to HTML
    lectio render GEN.usx -f segments --chapter 3 Print chapter 3 as JSON segments
    lectio shard Unihan_Readings.txt out --gzip   Write paginated gloss shards
    lectio lookup Unihan_Readings.txt 中          Show every field for a character")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Render a USX book
    Render {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[arg(short, long, value_enum, default_value_t = Format::Markdown)]
        format: Format,

        /// Fail on unknown elements instead of skipping them
        #[arg(long)]
        strict: bool,

        /// ISO language tag of the text
        #[arg(long)]
        language: Option<String>,

        #[arg(long)]
        bible_version: Option<String>,

        /// Only output this chapter (segments format)
        #[arg(long)]
        chapter: Option<u32>,

        /// Output file; stdout when absent
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Split a Unihan file into paginated JSON shards
    Shard {
        #[arg(value_name = "UNIHAN")]
        input: PathBuf,

        #[arg(value_name = "OUT_DIR")]
        out_dir: PathBuf,

        #[arg(long, default_value_t = 1000)]
        page_size: u32,

        #[arg(long, value_enum, default_value_t = Policy::Key)]
        policy: Policy,

        #[arg(long, default_value = "unihan")]
        prefix: String,

        /// Only shard these fields (repeatable)
        #[arg(long = "field", value_name = "FIELD")]
        fields: Vec<String>,

        /// Write .gz sidecars
        #[arg(long)]
        gzip: bool,

        /// Write .br sidecars
        #[arg(long)]
        brotli: bool,

        /// Worker threads (defaults to all cores)
        #[arg(long)]
        threads: Option<usize>,
    },

    /// Show the gloss fields of one character
    Lookup {
        #[arg(value_name = "UNIHAN")]
        input: PathBuf,

        /// A character or U+XXXX codepoint
        #[arg(value_name = "CHAR")]
        character: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Markdown,
    Html,
    Segments,
}

#[derive(Clone, Copy, ValueEnum)]
enum Policy {
    Key,
    Ordinal,
}

impl From<Policy> for PaginationPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Key => PaginationPolicy::ByKey,
            Policy::Ordinal => PaginationPolicy::ByOrdinal,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    let result = match cli.command {
        Command::Render {
            input,
            format,
            strict,
            language,
            bible_version,
            chapter,
            output,
        } => {
            let mut options = ParseOptions::new().strict(strict);
            if let Some(language) = language {
                options = options.with_language(language);
            }
            if let Some(version) = bible_version {
                options = options.with_bible_version(version);
            }
            render(&input, format, &options, chapter, output.as_deref())
        }
        Command::Shard {
            input,
            out_dir,
            page_size,
            policy,
            prefix,
            fields,
            gzip,
            brotli,
            threads,
        } => {
            let config = ShardConfig {
                naming: ShardNaming::new(prefix),
                gzip,
                brotli,
                threads,
                ..ShardConfig::default()
            };
            shard(&input, &out_dir, page_size, policy.into(), &fields, &config)
        }
        Command::Lookup { input, character } => lookup(&input, &character),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(io::stderr)
        .init();
}

fn render(
    input: &Path,
    format: Format,
    options: &ParseOptions,
    chapter: Option<u32>,
    output: Option<&Path>,
) -> lectio::Result<()> {
    let bytes = fs::read(input)?;
    let book = parse_usx(&bytes, options)?;

    if chapter.is_some() && !matches!(format, Format::Segments) {
        return Err(lectio::Error::InvalidArgument(
            "--chapter requires --format segments".to_string(),
        ));
    }

    let text = match format {
        Format::Markdown => render_markdown(&book, &MarkdownConfig::default()).output.text,
        Format::Html => {
            let rendered = render_html(&book, &HtmlConfig::default())?;
            let mut html = rendered.output.html.clone();
            html.push_str(&rendered.output.footnotes_html());
            html
        }
        Format::Segments => {
            let segments = render_segments(&book).output;
            let slice = match chapter {
                Some(number) => ChapterIndex::build(&segments).chapter(&segments, number),
                None => &segments[..],
            };
            let mut json = serde_json::to_string_pretty(slice)?;
            json.push('\n');
            json
        }
    };

    match output {
        Some(path) => fs::write(path, text)?,
        None => io::stdout().lock().write_all(text.as_bytes())?,
    }
    Ok(())
}

fn shard(
    input: &Path,
    out_dir: &Path,
    page_size: u32,
    policy: PaginationPolicy,
    fields: &[String],
    config: &ShardConfig,
) -> lectio::Result<()> {
    let report = parse_field_major(BufReader::new(File::open(input)?))?;
    if report.skip_count() > 0 {
        tracing::warn!(skipped = report.skip_count(), "some Unihan lines were skipped");
    }

    let mut dict = report.lookup;
    if !fields.is_empty() {
        let keep: Vec<UnihanField> = fields.iter().map(|name| UnihanField::parse(name)).collect();
        dict.retain_fields(&keep);
    }

    let pages = paginate_fields(&dict, page_size, policy)?;
    let written = write_shards(&pages, out_dir, config, &CancelToken::new())?;
    println!(
        "{} shards ({} sidecars) written to {}",
        written.files.len(),
        written.sidecars,
        out_dir.display()
    );
    Ok(())
}

fn lookup(input: &Path, character: &str) -> lectio::Result<()> {
    let codepoint = if character.starts_with("U+") || character.starts_with("u+") {
        character.parse::<Codepoint>()?
    } else {
        let mut chars = character.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Codepoint::from(c),
            _ => {
                return Err(lectio::Error::InvalidArgument(format!(
                    "expected one character or U+XXXX, got {character:?}"
                )));
            }
        }
    };

    let report = parse_codepoint_major(BufReader::new(File::open(input)?))?;
    let Some(fields) = report.lookup.get(codepoint) else {
        println!("{codepoint}: no entries");
        return Ok(());
    };

    let glyph = codepoint.to_char().map(String::from).unwrap_or_default();
    println!("{codepoint} {glyph}");
    for (field, values) in fields {
        println!("  {field}: {}", values.join(" | "));
    }
    Ok(())
}
