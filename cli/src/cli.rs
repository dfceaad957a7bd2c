use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;

#[derive(Parser)]
#[command(about, version, name = "sparstep")]
/// Builds single quad pattern SPARQL queries and evaluates them on local RDF files
pub struct Args {
    /// The format of the log lines written to stderr
    ///
    /// The verbosity is set with the RUST_LOG environment variable.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the SPARQL query text, as it would be sent to a SPARQL endpoint
    Query {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Print as N-Quads the statements of local RDF files selected by the query
    ///
    /// Each file is an independent source.
    /// A source that fails to be read is reported and skipped, the other sources are still evaluated.
    Filter {
        /// File(s) to read the statements from
        ///
        /// If multiple files are provided, they are parsed in parallel.
        /// The output keeps the files order.
        #[arg(short, long, num_args = 1.., required = true, value_hint = ValueHint::FilePath)]
        file: Vec<PathBuf>,
        /// The format of the file(s) to read
        ///
        /// It can be an extension like "nt" or a MIME type like "application/n-triples".
        ///
        /// By default, the format is guessed from each file extension.
        #[arg(long)]
        format: Option<String>,
        #[command(flatten)]
        query: QueryArgs,
    },
}

/// The constraints of the built query
///
/// Repeating an option allows several values.
/// An option that is not set does not constrain the matching statements.
#[derive(ClapArgs)]
pub struct QueryArgs {
    /// Only match statements in the given named graph(s)
    #[arg(long, value_hint = ValueHint::Url)]
    pub graph: Vec<String>,
    /// Only match statements in named graphs, whatever their name
    #[arg(long, conflicts_with = "graph")]
    pub any_graph: bool,
    /// Allowed subject IRI(s)
    #[arg(short, long, value_hint = ValueHint::Url)]
    pub subject: Vec<String>,
    /// Allowed predicate IRI(s)
    #[arg(short, long, value_hint = ValueHint::Url)]
    pub predicate: Vec<String>,
    /// Allowed object IRI(s)
    #[arg(short, long, value_hint = ValueHint::Url)]
    pub object: Vec<String>,
    /// Allowed object literal(s) written VALUE, VALUE@LANGUAGE or VALUE@DATATYPE_IRI
    ///
    /// The datatype IRI may itself contain "@".
    /// If the part after the last "@" is neither a language tag nor an IRI, the "@" is part of the value.
    #[arg(long)]
    pub object_literal: Vec<String>,
    /// Only keep literal objects with the given language tag(s)
    ///
    /// IRI and blank node objects are always kept.
    /// The empty language "" keeps literals without language tag.
    #[arg(short, long)]
    pub lang: Vec<String>,
    /// Maximal number of returned statements
    #[arg(long)]
    pub limit: Option<usize>,
    /// Number of matching statements to skip
    #[arg(long)]
    pub offset: Option<usize>,
    /// Remove duplicate solutions
    #[arg(long)]
    pub distinct: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Human readable lines
    Text,
    /// One JSON object per line
    Json,
}
