//! CLI command definitions and execution
//!
//! Every command resolves its container through the configured backend and
//! maps storage errors onto exit codes the same way.

use bv_core::Error;
use clap::{Parser, Subcommand};

use crate::backend::Backend;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

mod cat;
mod completions;
mod dirs;
mod ls;
mod mkdir;
mod mv;
mod rename;
mod rm;
mod stat;
mod upload_form;

/// bv - browse object storage as directory trees
///
/// Lists, inspects and edits S3 buckets and local directory trees through
/// one directory-style interface.
#[derive(Parser, Debug)]
#[command(name = "bv")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List containers, or one page of a directory
    Ls(ls::LsArgs),

    /// Show object metadata
    Stat(stat::StatArgs),

    /// Display object contents
    Cat(cat::CatArgs),

    /// Create a directory
    Mkdir(mkdir::MkdirArgs),

    /// Remove a file or a directory tree
    Rm(rm::RmArgs),

    /// Rename a file or directory in place
    Rename(rename::RenameArgs),

    /// Move a file into another directory
    Mv(mv::MvArgs),

    /// List every directory of a container
    Dirs(dirs::DirsArgs),

    /// Generate a signed form for uploading straight to the backend
    UploadForm(upload_form::UploadFormArgs),

    /// Generate shell completion scripts
    Completions(completions::CompletionsArgs),
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let formatter = Formatter::new(OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        quiet: cli.quiet,
    });

    let command = match cli.command {
        Commands::Completions(args) => return completions::execute(args),
        command => command,
    };

    let backend = match Backend::load() {
        Ok(backend) => backend,
        Err(e) => return report_error(&formatter, &e),
    };
    run(command, &backend, &formatter).await
}

/// Execute a command against an already loaded backend
pub async fn run(command: Commands, backend: &Backend, formatter: &Formatter) -> ExitCode {
    let result = match command {
        Commands::Ls(args) => ls::execute(args, backend, formatter).await,
        Commands::Stat(args) => stat::execute(args, backend, formatter).await,
        Commands::Cat(args) => cat::execute(args, backend).await,
        Commands::Mkdir(args) => mkdir::execute(args, backend, formatter).await,
        Commands::Rm(args) => rm::execute(args, backend, formatter).await,
        Commands::Rename(args) => rename::execute(args, backend, formatter).await,
        Commands::Mv(args) => mv::execute(args, backend, formatter).await,
        Commands::Dirs(args) => dirs::execute(args, backend, formatter).await,
        Commands::UploadForm(args) => upload_form::execute(args, backend, formatter).await,
        Commands::Completions(args) => return completions::execute(args),
    };

    match result {
        Ok(()) => ExitCode::Success,
        Err(e) => report_error(formatter, &e),
    }
}

/// Print an error and pick its exit code
///
/// Missing containers and objects are ordinary outcomes; only genuine
/// backend failures are logged.
pub(crate) fn report_error(formatter: &Formatter, err: &Error) -> ExitCode {
    if err.is_backend_failure() {
        tracing::warn!(error = %err, "Storage backend failure");
    }
    formatter.error(&err.to_string());
    ExitCode::from_error(err)
}

/// Format a timestamp for human output
pub(crate) fn format_time(ts: Option<jiff::Timestamp>) -> String {
    ts.map(|t| t.strftime("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::fs;
    use std::path::PathBuf;

    use bv_core::config::FilesystemSettings;
    use bv_core::{BackendConfig, Config};
    use tempfile::TempDir;

    use crate::backend::Backend;
    use crate::output::{Formatter, OutputConfig};

    /// Filesystem backend with one container `docs` holding `a.txt` and `sub/b.txt`
    pub(crate) fn fs_backend() -> (TempDir, Backend) {
        let temp = TempDir::new().unwrap();
        let docs = temp.path().join("docs");
        fs::create_dir_all(docs.join("sub")).unwrap();
        fs::write(docs.join("a.txt"), b"alpha").unwrap();
        fs::write(docs.join("sub/b.txt"), b"beta").unwrap();

        let config = Config {
            backend: Some(BackendConfig::Filesystem(FilesystemSettings {
                root: temp.path().to_path_buf(),
            })),
            ..Default::default()
        };
        (temp, Backend::from_config(config).unwrap())
    }

    pub(crate) fn docs(temp: &TempDir) -> PathBuf {
        temp.path().join("docs")
    }

    pub(crate) fn quiet() -> Formatter {
        Formatter::new(OutputConfig {
            quiet: true,
            no_color: true,
            ..Default::default()
        })
    }
}
