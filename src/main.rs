use anyhow::Result;
use bruv::areas::repository::Repository;
use bruv::artifacts::branch::branch_name::BranchName;
use bruv::artifacts::objects::commit::Author;
use bruv::artifacts::protocol::DEFAULT_PORT;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "bruv",
    version = "0.1.0",
    about = "A small distributed version-control system",
    long_about = "bruv keeps history in a content-addressed object store, transfers it \
    over a line-oriented TCP protocol, and only moves protected branches through \
    approved merge requests.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
",
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "init",
        about = "Initialize a new repository",
        long_about = "This command initializes a new repository in the current directory \
        or at the specified path."
    )]
    Init {
        #[arg(index = 1, help = "The path to the repository")]
        path: Option<PathBuf>,
    },
    #[command(
        name = "hash-object",
        about = "Hash a file as a blob and optionally write it to the object database"
    )]
    HashObject {
        #[arg(short, long, required = false, help = "Write the object to the object database")]
        write: bool,
        #[arg(index = 1)]
        file: PathBuf,
    },
    #[command(
        name = "cat-file",
        about = "Print the content of an object",
        long_about = "This command prints the content of an object in the repository. \
        Abbreviated object ids of at least four characters are accepted."
    )]
    CatFile {
        #[arg(short = 't', long = "type", help = "Print the object type instead of its content")]
        show_type: bool,
        #[arg(index = 1, help = "The object id to print")]
        object: String,
    },
    #[command(name = "ls-tree", about = "List the contents of a tree")]
    LsTree {
        #[arg(short, long, help = "Recurse into subtrees")]
        recursive: bool,
        #[arg(index = 1, default_value = "HEAD", help = "A tree, commit, branch or HEAD")]
        revision: String,
    },
    #[command(name = "add", about = "Add file contents to the index")]
    Add {
        #[arg(index = 1, required = true, num_args = 1.., help = "Files or directories to stage")]
        paths: Vec<String>,
    },
    #[command(
        name = "commit",
        about = "Create a new commit with the specified message",
        long_about = "This command records the staged snapshot on the current branch."
    )]
    Commit {
        #[arg(short, long, help = "The commit message")]
        message: String,
    },
    #[command(name = "branch", about = "List branches, or create one")]
    Branch {
        #[arg(index = 1, help = "The branch to create")]
        name: Option<String>,
        #[arg(index = 2, help = "The revision to start the branch at (default: HEAD)")]
        source: Option<String>,
    },
    #[command(name = "log", about = "Show commit history")]
    Log {
        #[arg(index = 1, help = "The revision to start from (default: HEAD)")]
        revision: Option<String>,
        #[arg(long, help = "Show each commit on a single line")]
        oneline: bool,
    },
    #[command(name = "serve", about = "Serve the repositories below a root directory")]
    Serve {
        #[arg(long, default_value = ".", help = "Directory holding the served repositories")]
        root: PathBuf,
        #[arg(
            long,
            default_value_t = format!("0.0.0.0:{DEFAULT_PORT}"),
            help = "Address to listen on"
        )]
        address: String,
    },
    #[command(name = "clone", about = "Clone a branch of a remote repository")]
    Clone {
        #[arg(index = 1, help = "Server address, host[:port]")]
        address: String,
        #[arg(index = 2, help = "Repository path on the server")]
        repository: String,
        #[arg(index = 3, help = "Directory to clone into")]
        directory: Option<PathBuf>,
        #[arg(short, long, help = "Branch to clone (default: the server's HEAD)")]
        branch: Option<String>,
        #[arg(long, num_args = 1.., help = "Only transfer these paths")]
        select: Vec<PathBuf>,
    },
    #[command(name = "pull", about = "Fast-forward a branch from a remote repository")]
    Pull {
        #[arg(index = 1)]
        address: String,
        #[arg(index = 2)]
        repository: String,
        #[arg(index = 3, help = "Branch to pull (default: the current branch)")]
        branch: Option<String>,
        #[arg(long, num_args = 1.., help = "Only transfer these paths")]
        select: Vec<PathBuf>,
    },
    #[command(name = "push", about = "Push a non-protected branch to a remote repository")]
    Push {
        #[arg(index = 1)]
        address: String,
        #[arg(index = 2)]
        repository: String,
        #[arg(index = 3)]
        branch: String,
    },
    #[command(name = "merge", about = "Submit a merge request to a remote repository")]
    Merge {
        #[arg(index = 1)]
        address: String,
        #[arg(index = 2)]
        repository: String,
        #[arg(index = 3)]
        source: String,
        #[arg(index = 4, default_value = "main")]
        target: String,
    },
    #[command(name = "approve", about = "Approve a pending merge request")]
    Approve {
        #[arg(index = 1, help = "Merge request id, e.g. 3 or MR-3")]
        id: String,
        #[arg(long, help = "Approver name (default: the configured author)")]
        by: Option<String>,
    },
    #[command(name = "reject", about = "Reject a pending merge request")]
    Reject {
        #[arg(index = 1, help = "Merge request id, e.g. 3 or MR-3")]
        id: String,
        #[arg(long, help = "Reviewer name (default: the configured author)")]
        by: Option<String>,
    },
    #[command(name = "list-requests", about = "List merge requests")]
    ListRequests,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn open_repository() -> Result<Repository> {
    let pwd = std::env::current_dir()?;
    Repository::discover(&pwd, Box::new(std::io::stdout()))
}

fn reviewer(by: &Option<String>) -> Result<String> {
    match by {
        Some(name) => Ok(name.clone()),
        None => Ok(Author::load_from_env()?.name().to_string()),
    }
}

fn clone_directory(repository: &str) -> PathBuf {
    Path::new(repository)
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("bruv-clone"))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Init { path } => {
            let path = match path {
                Some(path) => path.clone(),
                None => std::env::current_dir()?,
            };
            let repository = Repository::new(&path, Box::new(std::io::stdout()))?;

            repository.init().await?
        }
        Commands::HashObject { write, file } => {
            let repository = open_repository()?;
            let file = std::env::current_dir()?.join(file);

            repository.hash_object(&file, *write)?;
        }
        Commands::CatFile { show_type, object } => open_repository()?.cat_file(object, *show_type)?,
        Commands::LsTree {
            recursive,
            revision,
        } => open_repository()?.ls_tree(revision, *recursive)?,
        Commands::Add { paths } => {
            let repository = open_repository()?;
            let pwd = std::env::current_dir()?;
            let paths = paths
                .iter()
                .map(|path| pwd.join(path).to_string_lossy().to_string())
                .collect::<Vec<_>>();

            repository.add(&paths).await?
        }
        Commands::Commit { message } => {
            open_repository()?.commit(message).await?;
        }
        Commands::Branch { name, source } => {
            let repository = open_repository()?;
            match name {
                Some(name) => repository.branch(name, source.as_deref())?,
                None => repository.list_branches()?,
            }
        }
        Commands::Log { revision, oneline } => {
            open_repository()?.log(revision.as_deref(), *oneline)?
        }
        Commands::Serve { root, address } => bruv::server::run(root.clone(), address).await?,
        Commands::Clone {
            address,
            repository: remote,
            directory,
            branch,
            select,
        } => {
            let directory = directory.clone().unwrap_or_else(|| clone_directory(remote));
            let repository = Repository::new(&directory, Box::new(std::io::stdout()))?;
            let branch = branch.as_deref().map(BranchName::try_parse).transpose()?;

            repository
                .clone_from_remote(address, remote, branch, select.clone())
                .await?
        }
        Commands::Pull {
            address,
            repository: remote,
            branch,
            select,
        } => {
            let branch = branch.as_deref().map(BranchName::try_parse).transpose()?;

            open_repository()?
                .pull(address, remote, branch, select.clone())
                .await?
        }
        Commands::Push {
            address,
            repository: remote,
            branch,
        } => {
            open_repository()?
                .push(address, remote, BranchName::try_parse(branch.as_str())?)
                .await?
        }
        Commands::Merge {
            address,
            repository: remote,
            source,
            target,
        } => {
            open_repository()?
                .request_merge(
                    address,
                    remote,
                    BranchName::try_parse(source.as_str())?,
                    BranchName::try_parse(target.as_str())?,
                )
                .await?;
        }
        Commands::Approve { id, by } => open_repository()?.approve(id, reviewer(by)?)?,
        Commands::Reject { id, by } => open_repository()?.reject(id, reviewer(by)?)?,
        Commands::ListRequests => open_repository()?.list_requests()?,
    }

    Ok(())
}
