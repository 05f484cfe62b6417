use clap::{Parser, Subcommand};
use photopipe::{config::Config, generate, init, print};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "photopipe")]
#[command(about = "Plugin-driven static site generator for photo galleries")]
#[command(long_about = "\
Plugin-driven static site generator for photo galleries

Your filesystem is the data source. Directories become albums, image
directories become gallery entries, and TOML sidecars carry metadata:

  content/
  ├── site.toml                # site-wide fields
  ├── landscapes/              # album
  │   ├── album.toml           # album fields (optional)
  │   ├── dawn/                # image entry
  │   │   ├── image.jpg        # exactly one image.<ext> file
  │   │   └── image.toml       # image fields (optional)
  │   └── mountains/
  │       └── image.jpg
  └── travel/
      └── ...

Every transformation is a plugin. The 'plugins' list in photopipe.toml
names the sequence to run; built-ins are 'convert', 'copy' and 'render',
and project plugins are loaded from the plugin directory.

Run 'photopipe init' in an empty directory to scaffold a project.")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Project configuration file
    #[arg(long, default_value = "photopipe.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate the site
    Generate,
    /// Initialize a new project in the current directory
    Init,
    /// Print loaded site content
    Print {
        /// Emit the content tree as JSON
        #[arg(long)]
        json: bool,
        /// Exclude embedded image metadata from the output
        #[arg(long)]
        no_meta: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        tracing::error!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Generate => {
            let config = Arc::new(Config::load(&cli.config)?);
            generate::generate(config)?;
        }
        Command::Init => {
            init::init(&std::env::current_dir()?)?;
        }
        Command::Print { json, no_meta } => {
            let config = Config::load(&cli.config)?;
            print::print(&config, print::PrintOptions { json, no_meta })?;
        }
    }
    Ok(())
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
