//! quad-reader CLI: query and materialize RDF documents from the shell
//!
//! SOURCE is a local file (syntax from its extension or `--media-type`) or an
//! `http(s)://` URL. Term arguments may be compact IRIs (`foaf:name`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use quad_reader::value::properties_to_json;
use quad_reader::{Document, PojoOptions, PrefixMap, RdfFormat, Root, TermMatch};
use std::fmt::Write;
use std::path::Path;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "quad-reader", version, about = "Query and materialize RDF quads")]
struct Cli {
    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    /// Base IRI for relative references
    #[arg(long, global = true, env = "QUAD_READER_BASE")]
    base: Option<String>,

    /// Media type of SOURCE, overriding its extension
    #[arg(long, global = true)]
    media_type: Option<String>,

    /// Extra prefix for compact IRIs, as `prefix=iri`
    #[arg(long = "prefix", global = true, value_parser = parse_prefix)]
    prefixes: Vec<(String, String)>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// List quads matching a pattern
    Quads {
        source: String,

        #[arg(long, short)]
        subject: Option<String>,

        #[arg(long, short)]
        predicate: Option<String>,

        #[arg(long, short)]
        object: Option<String>,

        #[arg(long, short)]
        graph: Option<String>,
    },
    /// Predicate → objects map for a pattern
    Po {
        source: String,

        #[arg(long, short)]
        subject: Option<String>,

        #[arg(long, short)]
        predicate: Option<String>,

        /// Predicates seen once hold a bare value
        #[arg(long)]
        flatten: bool,
    },
    /// Materialize subjects as nested objects
    Pojo {
        source: String,

        /// Root subject; every named subject when omitted
        #[arg(long, short)]
        subject: Option<String>,

        /// `flatten` or `objects`; repeatable
        #[arg(long = "option")]
        options: Vec<String>,
    },
}

fn parse_prefix(text: &str) -> Result<(String, String), String> {
    text.split_once('=')
        .map(|(prefix, iri)| (prefix.to_string(), iri.to_string()))
        .ok_or_else(|| format!("expected prefix=iri, got '{}'", text))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut prefixes = PrefixMap::new();
    for (prefix, iri) in &cli.prefixes {
        prefixes.insert(prefix.as_str(), iri.as_str());
    }
    let term = |arg: &Option<String>| -> TermMatch {
        arg.as_deref().map(|text| prefixes.resolve(text)).into()
    };

    match &cli.command {
        Commands::Quads { source, subject, predicate, object, graph } => {
            let document = load(source, &cli).await?;
            let reader = document
                .reader()
                .filter(term(subject), term(predicate), term(object), term(graph));
            print_quads(&reader, &cli.format)
        }
        Commands::Po { source, subject, predicate, flatten } => {
            let document = load(source, &cli).await?;
            let reader = document
                .reader()
                .filter(term(subject), term(predicate), TermMatch::Any, TermMatch::Any);
            let properties = reader.all_po(*flatten)?;
            print_entries(&properties_to_json(&properties), "predicate", &cli.format)
        }
        Commands::Pojo { source, subject, options } => {
            // options are validated before anything is loaded
            let options = PojoOptions::parse(options)?;
            let document = load(source, &cli).await?;
            let pojo = document.reader().pojo_with(term(subject), options)?;
            let key = match pojo.root() {
                Root::Subjects(_) => "subject",
                _ => "predicate",
            };
            print_entries(&pojo.to_json(), key, &cli.format)
        }
    }
}

async fn load(source: &str, cli: &Cli) -> Result<Document> {
    if source.starts_with("http://") || source.starts_with("https://") {
        debug!(source, "fetching");
        return Ok(Document::fetch(source).await?);
    }

    let path = Path::new(source);
    if cli.base.is_none() && cli.media_type.is_none() {
        return Document::open(path).with_context(|| format!("cannot load {}", source));
    }

    let format = match &cli.media_type {
        Some(media_type) => RdfFormat::from_media_type(media_type)?,
        None => RdfFormat::from_path(path)
            .with_context(|| format!("cannot tell RDF syntax of {}, pass --media-type", source))?,
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("cannot read {}", source))?;
    Ok(Document::parse_format(&text, format, cli.base.as_deref())?)
}

fn print_quads(reader: &quad_reader::QuadReader, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = reader
                .iter()
                .map(|q| {
                    serde_json::json!({
                        "subject": q.subject.id(),
                        "predicate": q.predicate.id(),
                        "object": q.object.id(),
                        "graph": q.graph.id(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Csv => {
            println!("subject,predicate,object,graph");
            for q in reader {
                let cells = [&q.subject, &q.predicate, &q.object, &q.graph].map(|t| format_csv_value(t.id()));
                println!("{}", cells.join(","));
            }
        }
        OutputFormat::Table => {
            if reader.is_empty() {
                println!("(no results)");
                return Ok(());
            }

            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["subject", "predicate", "object", "graph"]);
            for q in reader {
                table.add_row(vec![q.subject.id(), q.predicate.id(), q.object.id(), q.graph.id()]);
            }

            println!("{}", table);
            println!("{} quad(s)", reader.len());
        }
    }
    Ok(())
}

fn print_entries(entries: &serde_json::Value, key: &str, format: &OutputFormat) -> Result<()> {
    print!("{}", render_entries(entries, key, format)?);
    Ok(())
}

/// A JSON object as key/value rows, `key` naming the first column
fn render_entries(entries: &serde_json::Value, key: &str, format: &OutputFormat) -> Result<String> {
    let serde_json::Value::Object(map) = entries else {
        return Ok(format!("{}\n", entries));
    };

    let mut out = String::new();
    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(entries)?)?,
        OutputFormat::Csv => {
            writeln!(out, "{},value", key)?;
            for (name, value) in map {
                writeln!(out, "{},{}", format_csv_value(name), format_csv_value(&format_table_value(value)))?;
            }
        }
        OutputFormat::Table => {
            if map.is_empty() {
                writeln!(out, "(no results)")?;
                return Ok(out);
            }

            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec![key, "value"]);
            for (name, value) in map {
                table.add_row(vec![name.clone(), format_table_value(value)]);
            }
            writeln!(out, "{}", table)?;
        }
    }
    Ok(out)
}

fn format_table_value(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Object(map) => match map.get("@id") {
            Some(serde_json::Value::String(id)) => id.clone(),
            _ => serde_json::to_string(v).unwrap_or_default(),
        },
        serde_json::Value::Array(items) => items.iter().map(format_table_value).collect::<Vec<_>>().join("\n"),
    }
}

fn format_csv_value(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
