use anyhow::Result;
use clap::Parser;
use keg::commands;
use std::path::PathBuf;

/// keg - install packages from declarative descriptors
///
/// A descriptor names a source archive, its SHA-256, and the steps that place
/// its files under a prefix. PACKAGE is a built-in descriptor name
/// (ansible-bundler) or a path to a JSON descriptor.
///
/// Examples:
///   keg install ansible-bundler
///   keg --prefix /opt/pkg test ansible-bundler
#[derive(Parser, Debug)]
#[command(author, version = env!("KEG_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Install prefix (overrides defaults; also via KEG_PREFIX)
    #[arg(
        long = "prefix",
        short = 'p',
        env = "KEG_PREFIX",
        value_name = "PATH",
        global = true
    )]
    pub prefix: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Fetch, verify and install a package
    Install(PackageArgs),

    /// Remove an installed package
    Uninstall(PackageArgs),

    /// List installed packages
    List,

    /// Show a package's descriptor and install state
    Info(PackageArgs),

    /// Print a package's post-install message
    Caveats(PackageArgs),

    /// Run an installed package's smoke test
    Test(PackageArgs),

    /// Check a descriptor for problems
    Audit(PackageArgs),
}

#[derive(clap::Args, Debug)]
pub struct PackageArgs {
    /// Built-in package name or path to a JSON descriptor
    #[arg(value_name = "PACKAGE")]
    pub package: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = keg::runtime::RealRuntime;

    match cli.command {
        Commands::Install(args) => commands::install(runtime, &args.package, cli.prefix).await?,
        Commands::Uninstall(args) => commands::uninstall(runtime, &args.package, cli.prefix)?,
        Commands::List => commands::list(runtime, cli.prefix)?,
        Commands::Info(args) => commands::show(runtime, &args.package, cli.prefix)?,
        Commands::Caveats(args) => commands::caveats(runtime, &args.package, cli.prefix)?,
        Commands::Test(args) => commands::test(runtime, &args.package, cli.prefix)?,
        Commands::Audit(args) => commands::audit(runtime, &args.package)?,
    }
    Ok(())
}
