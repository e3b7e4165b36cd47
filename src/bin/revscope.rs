//! revscope CLI
//!
//! Command-line front end for inspecting etcd bolt database files.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use revscope::filter::DotPath;
use revscope::mvcc::RevisionLayout;
use revscope::{parse_filters, Config, Filter, Inspector, KeySummary, Projection, StorageDecoder};
use serde_json::json;
use tracing_subscriber::{fmt, EnvFilter};

/// revscope
#[derive(Parser, Debug)]
#[command(name = "revscope")]
#[command(about = "Inspect an etcd bolt database file without a running server")]
#[command(version)]
struct Args {
    /// Record keys use etcd's '_' separated layout (17/18 bytes)
    #[arg(long, global = true)]
    delimited: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List live keys as JSON lines
    Keys {
        /// Database file
        file: PathBuf,

        /// Reconstruct as of this revision (0 = latest)
        #[arg(short, long, default_value = "0")]
        revision: i64,

        /// Only keys starting with this prefix
        #[arg(short, long)]
        prefix: Option<String>,

        /// Field filters: "<path>=<value>[,<path>=<value>]*"
        #[arg(short, long, default_value = "")]
        filter: String,

        /// Skip payload decoding in the output
        #[arg(long, conflicts_with = "fields")]
        keys_only: bool,

        /// Project only these comma separated paths
        #[arg(long)]
        fields: Option<String>,
    },

    /// Print the consistency hash of a revision
    Hash {
        /// Database file
        file: PathBuf,

        /// Reconstruct as of this revision (0 = latest)
        #[arg(short, long, default_value = "0")]
        revision: i64,
    },

    /// List the stored versions of a key
    Versions {
        /// Database file
        file: PathBuf,

        /// The key to look up
        #[arg(short, long)]
        key: String,
    },

    /// Print the raw stored value of a key version
    Value {
        /// Database file
        file: PathBuf,

        /// The key to look up
        #[arg(short, long)]
        key: String,

        /// The key version to print
        #[arg(short, long)]
        version: i64,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,revscope=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> revscope::Result<()> {
    let layout = if args.delimited {
        RevisionLayout::Delimited
    } else {
        RevisionLayout::Packed
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match args.command {
        Commands::Keys {
            file,
            revision,
            prefix,
            filter,
            keys_only,
            fields,
        } => {
            let mut filters = Vec::new();
            if let Some(prefix) = prefix {
                filters.push(Filter::prefix(prefix));
            }
            filters.extend(parse_filters(&filter)?);

            let projection = match (keys_only, fields) {
                (true, _) => Projection::KeysOnly,
                (false, Some(fields)) => Projection::Fields(
                    fields
                        .split(',')
                        .map(DotPath::parse)
                        .collect::<revscope::Result<Vec<_>>>()?,
                ),
                (false, None) => Projection::Everything,
            };

            let config = Config::builder()
                .db_path(file)
                .at_revision(revision)
                .revision_layout(layout)
                .projection(projection)
                .build();
            let summaries = Inspector::new(config)?.key_summaries(&StorageDecoder::new(), &filters)?;
            for summary in &summaries {
                writeln!(out, "{}", summary_json(summary))?;
            }
        }
        Commands::Hash { file, revision } => {
            let config = Config::builder()
                .db_path(file)
                .at_revision(revision)
                .revision_layout(layout)
                .build();
            let digest = Inspector::new(config)?.hash()?;
            writeln!(
                out,
                "{}",
                json!({
                    "hash": format!("{:08x}", digest.hash),
                    "revision": digest.revision,
                    "keys": digest.key_count,
                })
            )?;
        }
        Commands::Versions { file, key } => {
            let config = Config::builder().db_path(file).revision_layout(layout).build();
            for version in Inspector::new(config)?.versions(key.as_bytes())? {
                writeln!(out, "{}", version)?;
            }
        }
        Commands::Value { file, key, version } => {
            let config = Config::builder().db_path(file).revision_layout(layout).build();
            let value = Inspector::new(config)?.value(key.as_bytes(), version)?;
            out.write_all(&value)?;
            writeln!(out)?;
        }
    }

    Ok(())
}

fn summary_json(summary: &KeySummary) -> serde_json::Value {
    let mut object = json!({
        "key": summary.key_lossy(),
        "version": summary.version,
        "modRevision": summary.mod_revision,
        "createRevision": summary.create_revision,
        "stats": summary.stats,
    });
    if let Some(type_meta) = &summary.type_meta {
        object["typeMeta"] = json!(type_meta);
    }
    if let Some(value) = &summary.value {
        object["value"] = value.clone();
    }
    object
}
