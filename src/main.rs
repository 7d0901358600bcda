//! grit CLI - minimal git-compatible version control

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use grit::{object, ops, refs, transport, Hash, ObjectKind, Repo};

#[derive(Parser)]
#[command(name = "grit")]
#[command(about = "minimal git-compatible version control")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// initialize a new repository
    Init {
        /// path to create the repository at
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// print the kind or payload of an object
    CatFile {
        /// print the object payload
        #[arg(short = 'p', conflicts_with = "kind")]
        pretty: bool,

        /// print the object kind
        #[arg(short = 't')]
        kind: bool,

        /// object hash
        object: String,
    },

    /// store a file as a blob and print its hash
    HashObject {
        /// file to store
        file: PathBuf,
    },

    /// list the entries of a tree
    LsTree {
        /// print entry names only
        #[arg(long)]
        name_only: bool,

        /// tree hash, commit hash, or branch name
        tree: String,
    },

    /// snapshot the working directory as a tree and print its hash
    WriteTree,

    /// record a commit for a tree and print its hash
    CommitTree {
        /// tree hash
        tree: String,

        /// parent commit hash
        #[arg(short = 'p', long)]
        parent: Option<String>,

        /// commit message
        #[arg(short = 'm', long)]
        message: String,

        /// author as "Name <email>"
        #[arg(long)]
        author: Option<String>,
    },

    /// clone a remote repository over smart HTTP
    Clone {
        /// remote repository url
        url: String,

        /// destination directory
        directory: PathBuf,
    },

    /// verify the integrity of the object store
    Fsck,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run(cli: Cli) -> grit::Result<()> {
    match cli.command {
        Commands::Init { path } => {
            let repo = Repo::init(&path)?;
            println!(
                "initialized empty grit repository in {}",
                repo.git_path().display()
            );
        }

        Commands::CatFile {
            pretty: _,
            kind,
            object,
        } => {
            let repo = open_cwd()?;
            let hash = refs::resolve_ref(&repo, &object)?;
            let (object_kind, payload) = object::read_object(&repo, &hash)?;

            if kind {
                println!("{}", object_kind);
            } else {
                // payloads may be binary (trees), so write raw bytes
                std::io::stdout()
                    .write_all(&payload)
                    .map_err(|e| grit::Error::Io {
                        path: PathBuf::from("<stdout>"),
                        source: e,
                    })?;
            }
        }

        Commands::HashObject { file } => {
            let repo = open_cwd()?;
            let content = std::fs::read(&file).map_err(|e| grit::Error::Io {
                path: file.clone(),
                source: e,
            })?;
            let hash = object::write_object(&repo, ObjectKind::Blob, &content)?;
            println!("{}", hash);
        }

        Commands::LsTree { name_only, tree } => {
            let repo = open_cwd()?;
            for entry in ops::ls_tree(&repo, &tree)? {
                if name_only {
                    println!("{}", entry.name_lossy());
                } else {
                    println!("{}", entry);
                }
            }
        }

        Commands::WriteTree => {
            let repo = open_cwd()?;
            let hash = ops::write_tree(&repo, repo.path())?;
            println!("{}", hash);
        }

        Commands::CommitTree {
            tree,
            parent,
            message,
            author,
        } => {
            let repo = open_cwd()?;
            let tree = Hash::from_hex(&tree)?;
            let parent = parent.as_deref().map(Hash::from_hex).transpose()?;
            let hash = ops::commit_tree(&repo, tree, parent, &message, author.as_deref())?;
            println!("{}", hash);
        }

        Commands::Clone { url, directory } => {
            transport::clone(&url, &directory)?;
            println!("cloned {} into {}", url, directory.display());
        }

        Commands::Fsck => {
            let repo = open_cwd()?;
            let report = ops::fsck(&repo)?;
            for (hash, message) in &report.corrupt {
                println!("corrupt {}: {}", hash, message);
            }
            println!(
                "checked {} objects, {} corrupt",
                report.objects_checked,
                report.corrupt.len()
            );
        }
    }

    Ok(())
}

fn open_cwd() -> grit::Result<Repo> {
    Repo::open(Path::new("."))
}
