//! CLI Tooling
//!
//! Command-line interface for the `kv` binary. Every subcommand opens the
//! database, performs one operation, and returns its output as text.

use crate::audit::{AuditEngine, AuditReport};
use crate::config::{ConfigLoader, KvConfig};
use crate::error::{ApiError, StorageError};
use crate::logging::LoggingOverrides;
use crate::store::bulk::{copy_node, ImportMode, ImportPlan};
use crate::store::MetadataStore;
use clap::{Parser, Subcommand, ValueEnum};
use regex::Regex;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// kv - a filesystem-backed key/value database
#[derive(Parser)]
#[command(name = "kv")]
#[command(about = "Filesystem-backed, schema-audited key/value database")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database root directory (overrides KVDB_PATH and database.path)
    #[arg(short = 'd', long = "database")]
    pub database: Option<PathBuf>,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// `--log-*` flags, plus the database root when it already exists
    pub fn logging_overrides(&self, database: Option<PathBuf>) -> LoggingOverrides {
        LoggingOverrides {
            level: self.log_level.clone(),
            format: self.log_format.clone(),
            output: self.log_output.clone(),
            file: self.log_file.clone(),
            database: database.filter(|p| p.is_dir()),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new, empty database
    Init,
    /// List node names
    List {
        /// Include each node's data file path
        #[arg(short = 'p', long)]
        path: bool,
        /// Only list nodes matching this regular expression
        regexp: Option<String>,
    },
    /// Print the data file path of a node
    Nodepath { node: String },
    /// Print the values at a key path (node, node#key, or node#key#index)
    Print {
        /// Always show the key path in output
        #[arg(short = 'v', long)]
        verbose: bool,
        keypath: String,
    },
    /// Set values from `key: value` lines (stdin if no datafile)
    ///
    /// Usage: `set [-c] [-a] <node> [datafile]` or `set [-c] [-a] -f [datafile]`
    Set {
        /// Allow creation of new nodes
        #[arg(short = 'c', long)]
        create: bool,
        /// Append to existing values instead of replacing them
        #[arg(short = 'a', long)]
        append: bool,
        /// Read full `node#key: value` lines
        #[arg(short = 'f', long)]
        full: bool,
        /// `<node> [datafile]`, or `[datafile]` with --full
        args: Vec<String>,
    },
    /// Create a new node from `key: value` lines (stdin if no datafile)
    Import {
        node: String,
        datafile: Option<PathBuf>,
    },
    /// Copy a node to a new name
    Cp { src: String, dst: String },
    /// Delete a node
    Rm { node: String },
    /// Audit every node against the database schema
    Audit {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: ReportFormat,
    },
}

/// Output format for audit reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

/// CLI context for command execution
pub struct CliContext {
    database: Option<PathBuf>,
    config: KvConfig,
}

impl CliContext {
    /// Create a new CLI context
    ///
    /// The database root is resolved lazily, so commands that fail early
    /// (bad arguments) do not need one.
    pub fn new(database: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = match &config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };
        Ok(Self { database, config })
    }

    /// Context over an already-built configuration
    pub fn with_config(database: Option<PathBuf>, config: KvConfig) -> Self {
        Self { database, config }
    }

    pub fn config(&self) -> &KvConfig {
        &self.config
    }

    /// Database root from the flag, `KVDB_PATH`, or config
    pub fn database_path(&self) -> Result<PathBuf, ApiError> {
        self.config.database_path(self.database.clone())
    }

    fn open_store(&self) -> Result<MetadataStore, ApiError> {
        MetadataStore::open(self.database_path()?)
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Init => {
                let root = self.database_path()?;
                MetadataStore::init(&root)?;
                Ok(String::new())
            }
            Commands::List { path, regexp } => self.handle_list(*path, regexp.as_deref()),
            Commands::Nodepath { node } => {
                let store = self.open_store()?;
                store
                    .node_path_if_mapped(node)
                    .map(|p| p.display().to_string())
                    .ok_or_else(|| ApiError::NotFound(format!("{} does not exist", node)))
            }
            Commands::Print { verbose, keypath } => {
                let mut store = self.open_store()?;
                Ok(crate::keypath::expand(&mut store, keypath, *verbose, true)?.join("\n"))
            }
            Commands::Set {
                create,
                append,
                full,
                args,
            } => self.handle_set(*create, *append, *full, args),
            Commands::Import { node, datafile } => {
                let mut store = self.open_store()?;
                if store.exists(node) {
                    return Err(ApiError::AlreadyExists(format!("{} already exists", node)));
                }
                let data = read_data(datafile.as_deref())?;
                self.set_single(&mut store, node, &data, true, ImportMode::Replace)?;
                Ok(String::new())
            }
            Commands::Cp { src, dst } => {
                let mut store = self.open_store()?;
                copy_node(&mut store, src, dst)?;
                Ok(String::new())
            }
            Commands::Rm { node } => {
                let mut store = self.open_store()?;
                store.delete(node)?;
                Ok(String::new())
            }
            Commands::Audit { format } => {
                let mut store = self.open_store()?;
                let engine = AuditEngine::for_store(&store)?;
                let report = engine.audit(&mut store);
                format_audit_report(&report, *format)
            }
        }
    }

    fn handle_list(&self, with_path: bool, regexp: Option<&str>) -> Result<String, ApiError> {
        let store = self.open_store()?;
        let filter = regexp
            .map(|r| {
                Regex::new(r).map_err(|e| {
                    ApiError::ValidationError(format!("invalid regexp {:?}: {}", r, e))
                })
            })
            .transpose()?;

        let mut lines = Vec::new();
        for name in store.list() {
            if let Some(re) = &filter {
                if !re.is_match(&name) {
                    continue;
                }
            }
            match store.node_path_if_mapped(&name) {
                Some(path) if with_path => lines.push(format!("{} {}", name, path.display())),
                _ => lines.push(name),
            }
        }
        Ok(lines.join("\n"))
    }

    fn handle_set(
        &self,
        create: bool,
        append: bool,
        full: bool,
        args: &[String],
    ) -> Result<String, ApiError> {
        let mode = if append {
            ImportMode::Append
        } else {
            ImportMode::Replace
        };
        let mut store = self.open_store()?;

        if full {
            if args.len() > 1 {
                return Err(ApiError::ValidationError("too many arguments".to_string()));
            }
            let data = read_data(args.first().map(Path::new))?;
            let nodes = ImportPlan::from_full(&data)?
                .allow_create(create)
                .mode(mode)
                .apply(&mut store)?;
            debug!(nodes = nodes.len(), "set from full key paths");
            return Ok(String::new());
        }

        let (node, datafile) = match args {
            [] => {
                return Err(ApiError::ValidationError(
                    "must specify a node name".to_string(),
                ))
            }
            [node] => (node, None),
            [node, datafile] => (node, Some(Path::new(datafile))),
            _ => return Err(ApiError::ValidationError("too many arguments".to_string())),
        };
        if !create && !store.exists(node) {
            return Err(ApiError::NotFound(format!(
                "node {} does not exist, and -c not given",
                node
            )));
        }
        let data = read_data(datafile)?;
        self.set_single(&mut store, node, &data, create, mode)?;
        Ok(String::new())
    }

    fn set_single(
        &self,
        store: &mut MetadataStore,
        node: &str,
        data: &str,
        create: bool,
        mode: ImportMode,
    ) -> Result<(), ApiError> {
        let plan = ImportPlan::for_node(node, data)
            .allow_create(create)
            .mode(mode);
        if plan.nodes().is_empty() {
            // no data lines: still materialize the node
            store.node(node)?.save()?;
        } else {
            plan.apply(store)?;
        }
        info!(node = %node, "set node data");
        Ok(())
    }
}

/// Read data from `datafile`, or stdin when none is given
fn read_data(datafile: Option<&Path>) -> Result<String, ApiError> {
    match datafile {
        Some(path) => {
            if !path.is_file() {
                return Err(ApiError::NotFound(format!(
                    "{}: data file does not exist",
                    path.display()
                )));
            }
            Ok(std::fs::read_to_string(path).map_err(StorageError::IoError)?)
        }
        None => {
            let mut data = String::new();
            std::io::stdin()
                .read_to_string(&mut data)
                .map_err(StorageError::IoError)?;
            Ok(data)
        }
    }
}

/// Render an audit report as `node: message` lines or pretty JSON
pub fn format_audit_report(report: &AuditReport, format: ReportFormat) -> Result<String, ApiError> {
    match format {
        ReportFormat::Text => Ok(report
            .iter()
            .flat_map(|(node, messages)| messages.iter().map(move |m| format!("{}: {}", node, m)))
            .collect::<Vec<_>>()
            .join("\n")),
        ReportFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|e| ApiError::ConfigError(format!("Failed to render report: {}", e))),
    }
}
