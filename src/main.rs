use anyhow::Result;
use clap::{Parser, Subcommand};
use kit::areas::repository::Repository;

#[derive(Parser)]
#[command(
    name = "kit",
    version = "0.1.0",
    about = "A minimal version control engine",
    long_about = "kit is a minimal, local, single-user version control engine: \
    a content-addressed object store, a staging index, a branch/HEAD layer \
    and the porcelain commands built on top of them.",
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
        long_about = "This command initializes a new repository in the current directory or at the specified path."
    )]
    Init {
        #[arg(index = 1, help = "The path to the repository")]
        path: Option<String>,
    },
    #[command(
        name = "add",
        about = "Stage files for the next commit",
        long_about = "This command stages one or more files or directories. Directories are \
        expanded to the files they contain."
    )]
    Add {
        #[arg(index = 1, required = true, help = "The paths to stage")]
        paths: Vec<String>,
    },
    #[command(
        name = "commit",
        about = "Create a new commit from the staged files",
        long_about = "This command captures the current index as a commit and advances the \
        current branch (or HEAD, when detached) to it."
    )]
    Commit {
        #[arg(index = 1, help = "The commit message")]
        message: String,
        #[arg(long, help = "The commit author, as 'Name <email>'")]
        author: Option<String>,
    },
    #[command(
        name = "checkout",
        about = "Switch the working directory to a branch or commit",
        long_about = "This command resolves the target as a branch name first, falling back to \
        a commit hash or unambiguous hash prefix, then rebuilds the working directory from the \
        target commit's tree. Uncommitted changes to tracked files are discarded."
    )]
    Checkout {
        #[arg(index = 1, help = "The branch name, commit hash or hash prefix")]
        target: String,
    },
    #[command(
        name = "branch",
        about = "Create a branch, or list branches",
        long_about = "Without arguments, lists branches. With a name, creates a branch pointing \
        at the current HEAD commit, or at the given start point."
    )]
    Branch {
        #[arg(index = 1, help = "The branch name to create")]
        name: Option<String>,
        #[arg(index = 2, help = "The commit the branch should point at")]
        start_point: Option<String>,
    },
    #[command(
        name = "cat-file",
        about = "Print the content of an object",
        long_about = "This command prints the content of an object in the repository. \
        It requires the hash (or an unambiguous prefix) of the object to be specified."
    )]
    CatFile {
        #[arg(short = 'p', long, help = "The object hash to print")]
        hash: String,
    },
    #[command(
        name = "hash-object",
        about = "Hash a file and optionally write it to the object database",
        long_about = "This command hashes a file as a blob and can write it to the object \
        database. It requires the path to the file to be specified."
    )]
    HashObject {
        #[arg(short, long, required = false, help = "Write the object to the object database")]
        write: bool,
        #[arg(index = 1)]
        file: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Init { path } => {
            let mut repository = match path {
                Some(path) => Repository::new(path, Box::new(std::io::stdout()))?,
                None => {
                    let pwd = std::env::current_dir()?;
                    Repository::new(&pwd.to_string_lossy(), Box::new(std::io::stdout()))?
                }
            };

            repository.init().await?
        }
        Commands::Add { paths } => {
            let mut repository = repository_at_pwd()?;

            repository.add(paths).await?
        }
        Commands::Commit { message, author } => {
            let mut repository = repository_at_pwd()?;

            repository.commit(message, author.as_deref()).await?;
        }
        Commands::Checkout { target } => {
            let mut repository = repository_at_pwd()?;

            repository.checkout(target).await?
        }
        Commands::Branch { name, start_point } => {
            let mut repository = repository_at_pwd()?;

            match name {
                Some(name) => repository.branch(name, start_point.as_deref())?,
                None => repository.list_branches()?,
            }
        }
        Commands::CatFile { hash } => {
            let mut repository = repository_at_pwd()?;

            repository.cat_file(hash)?
        }
        Commands::HashObject { write, file } => {
            let mut repository = repository_at_pwd()?;

            repository.hash_object(file, *write)?
        }
    }

    Ok(())
}

fn repository_at_pwd() -> Result<Repository> {
    let pwd = std::env::current_dir()?;
    Repository::new(&pwd.to_string_lossy(), Box::new(std::io::stdout()))
}
