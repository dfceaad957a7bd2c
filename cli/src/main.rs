use crate::cli::{Args, Command, LogFormat, QueryArgs};
use anyhow::{Context, bail};
use clap::Parser;
use oxrdf::{Literal, NamedNode, Quad, Term};
use oxrdfio::{RdfFormat, RdfParser, RdfSerializer};
use rayon_core::ThreadPoolBuilder;
use sparstep::{ObjectValue, Query, QueryBuilder, QueryProcessor};
use std::cmp::{max, min};
use std::ffi::OsStr;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, IsTerminal, Write, stdout};
use std::path::{Path, PathBuf};
use std::thread::available_parallelism;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

mod cli;

pub fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_format);
    match args.command {
        Command::Query { query } => {
            let query = build_query(&query)?;
            let mut stdout = stdout().lock();
            writeln!(stdout, "{query}")?;
            Ok(())
        }
        Command::Filter {
            file,
            format,
            query,
        } => {
            let format = format.as_deref().map(rdf_format_from_name).transpose()?;
            let query = build_query(&query)?;
            let statements = read_sources(&file, format)?;
            let selected = QueryProcessor::new().filter(&statements, &query)?;
            info!(
                sources = file.len(),
                statements = statements.len(),
                selected = selected.len(),
                "evaluated query"
            );
            let mut serializer = RdfSerializer::from_format(RdfFormat::NQuads)
                .for_writer(BufWriter::new(stdout().lock()));
            for quad in &selected {
                serializer.serialize_quad(quad)?;
            }
            serializer.finish()?.flush()?;
            Ok(())
        }
    }
}

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr);
    match format {
        LogFormat::Text => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }
}

fn build_query(args: &QueryArgs) -> anyhow::Result<Query> {
    let graphs = parse_iris(&args.graph, "graph")?;
    let subjects = parse_iris(&args.subject, "subject")?;
    let predicates = parse_iris(&args.predicate, "predicate")?;
    let mut objects = parse_iris(&args.object, "object")?
        .into_iter()
        .map(Term::from)
        .collect::<Vec<_>>();
    for literal in &args.object_literal {
        objects.push(
            Term::try_from(parse_object_literal(literal))
                .with_context(|| format!("The object literal '{literal}' is invalid"))?,
        );
    }

    let builder = QueryBuilder::new();
    let predicate_step = if args.any_graph || !graphs.is_empty() {
        builder.graphs(graphs).subjects(subjects)
    } else {
        builder.subjects(subjects)
    };
    let mut step = predicate_step
        .predicates(predicates)
        .objects(objects)
        .langs(&args.lang);
    if let Some(limit) = args.limit {
        step = step.limit(limit);
    }
    if let Some(offset) = args.offset {
        step = step.offset(offset);
    }
    if args.distinct {
        step = step.distinct();
    }
    Ok(step.build())
}

fn parse_iris(iris: &[String], role: &str) -> anyhow::Result<Vec<NamedNode>> {
    iris.iter()
        .map(|iri| {
            NamedNode::new(iri).with_context(|| format!("The {role} IRI '{iri}' is invalid"))
        })
        .collect()
}

/// Splits `VALUE@LANGUAGE` or `VALUE@DATATYPE_IRI`.
///
/// The datatype IRI may contain `@` itself, so the first split giving a valid IRI is used.
/// Otherwise the part after the last `@` is a language tag if it is a valid one,
/// or a datatype IRI if it contains a colon. If it is neither, the `@` belongs to the value.
fn parse_object_literal(literal: &str) -> ObjectValue {
    let split = literal
        .match_indices('@')
        .map(|(i, _)| (&literal[..i], &literal[i + 1..]))
        .find(|(_, suffix)| suffix.contains(':') && NamedNode::new(*suffix).is_ok())
        .or_else(|| {
            literal.rsplit_once('@').filter(|(_, suffix)| {
                suffix.contains(':') || Literal::new_language_tagged_literal("", *suffix).is_ok()
            })
        });
    match split {
        Some((value, suffix)) => ObjectValue::Literal {
            value: value.to_owned(),
            language_or_datatype: Some(suffix.to_owned()),
        },
        None => ObjectValue::Literal {
            value: literal.to_owned(),
            language_or_datatype: None,
        },
    }
}

/// Parses each file on its own thread.
///
/// A file that fails to be opened or parsed is logged and skipped.
/// The statements are returned in the files order.
fn read_sources(files: &[PathBuf], format: Option<RdfFormat>) -> anyhow::Result<Vec<Quad>> {
    let mut sources = vec![None; files.len()];
    ThreadPoolBuilder::new()
        .num_threads(max(1, min(files.len(), available_parallelism()?.get())))
        .thread_name(|i| format!("Sparstep reader thread {i}"))
        .build()?
        .scope(|s| {
            for (file, source) in files.iter().zip(&mut sources) {
                s.spawn(move |_| match read_source(file, format) {
                    Ok(statements) => {
                        info!(file = %file.display(), statements = statements.len(), "read source");
                        *source = Some(statements);
                    }
                    Err(error) => {
                        warn!(file = %file.display(), "Skipping source: {error:#}");
                    }
                })
            }
        });
    if !files.is_empty() && sources.iter().all(Option::is_none) {
        bail!("None of the {} source(s) could be read", files.len());
    }
    Ok(sources.into_iter().flatten().flatten().collect())
}

fn read_source(file: &Path, format: Option<RdfFormat>) -> anyhow::Result<Vec<Quad>> {
    let format = if let Some(format) = format {
        format
    } else {
        rdf_format_from_path(file)?
    };
    let reader = File::open(file)
        .with_context(|| format!("Error while opening file {}", file.display()))?;
    RdfParser::from_format(format)
        .for_reader(BufReader::new(reader))
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Error while parsing file {}", file.display()))
}

fn rdf_format_from_path(path: &Path) -> anyhow::Result<RdfFormat> {
    let Some(ext) = path.extension().and_then(OsStr::to_str) else {
        bail!(
            "The path {} has no extension to guess a file format from",
            path.display()
        )
    };
    RdfFormat::from_extension(ext).with_context(|| {
        format!("Not able to guess the file format from file name extension '{ext}'")
    })
}

fn rdf_format_from_name(name: &str) -> anyhow::Result<RdfFormat> {
    if let Some(t) = RdfFormat::from_extension(name) {
        return Ok(t);
    }
    if let Some(t) = RdfFormat::from_media_type(name) {
        return Ok(t);
    }
    bail!("The file format '{name}' is unknown")
}
