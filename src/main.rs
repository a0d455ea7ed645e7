use anyhow::Result;
use cdnlink::application::LinkOptions;
use cdnlink::commands::{self, Config, ConfigOverrides};
use clap::Parser;
use std::path::PathBuf;

/// cdnlink - link ES modules from public CDNs
///
/// Records modules in `modules.json` and writes a small re-export stub for
/// each one under `modules/`, so code can import `./modules/<name>.js`
/// instead of a CDN URL.
///
/// Examples:
///   cdnlink link lodash -t 4.17.21    # Link lodash from the default CDN
///   cdnlink link                      # Relink everything in modules.json
///   cdnlink unlink lodash             # Remove lodash again
#[derive(Parser, Debug)]
#[command(author, version = env!("CDNLINK_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root holding modules.json (defaults to the current directory)
    #[arg(
        long = "root",
        short = 'r',
        env = "CDNLINK_ROOT",
        value_name = "PATH",
        global = true
    )]
    pub root: Option<PathBuf>,

    /// Provider table to use instead of the built-in one
    #[arg(
        long = "providers",
        env = "CDNLINK_PROVIDERS",
        value_name = "FILE",
        global = true
    )]
    pub providers: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Link a module, or relink every module in the manifest
    #[command(visible_alias = "l")]
    Link(LinkArgs),

    /// Remove a module from the manifest and delete its stub
    #[command(visible_alias = "ul")]
    Unlink(UnlinkArgs),

    /// List linked modules and their URLs
    #[command(visible_alias = "ls")]
    List,

    /// Show the provider table
    Providers,
}

#[derive(clap::Args, Debug)]
pub struct LinkArgs {
    /// Module name; omit to relink everything in modules.json
    #[arg(value_name = "NAME")]
    pub name: Option<String>,

    /// CDN provider id (see `cdnlink providers`)
    #[arg(short, long, value_name = "ID", requires = "name")]
    pub provider: Option<String>,

    /// Explicit module URL; provider and tag are ignored
    #[arg(short, long, value_name = "URL", requires = "name")]
    pub url: Option<String>,

    /// Version or dist-tag
    #[arg(short, long, value_name = "TAG", requires = "name")]
    pub tag: Option<String>,

    /// Skip the reachability check
    #[arg(long)]
    pub no_check: bool,

    /// Do not re-export `default`
    #[arg(long, requires = "name")]
    pub no_default: bool,
}

impl LinkArgs {
    fn options(&self) -> LinkOptions {
        LinkOptions {
            provider: self.provider.clone(),
            url: self.url.clone(),
            tag: self.tag.clone(),
            check: Some(!self.no_check),
            include_default_export: Some(!self.no_default),
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct UnlinkArgs {
    /// Module name
    #[arg(value_name = "NAME")]
    pub name: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = cdnlink::runtime::RealRuntime;

    let overrides = ConfigOverrides {
        root: cli.root,
        providers_file: cli.providers,
    };
    let config = Config::new(runtime, overrides)?;

    match cli.command {
        Commands::Link(args) => match &args.name {
            Some(name) => commands::link(&config, name, &args.options()).await?,
            None => commands::link_all(&config, !args.no_check).await?,
        },
        Commands::Unlink(args) => commands::unlink(&config, &args.name)?,
        Commands::List => commands::list(&config)?,
        Commands::Providers => commands::providers(&config.registry)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_link_parsing() {
        let cli = Cli::try_parse_from([
            "cdnlink", "link", "lodash", "-p", "jsdelivr", "-t", "4.17.21",
        ])
        .unwrap();
        match cli.command {
            Commands::Link(args) => {
                assert_eq!(args.name.as_deref(), Some("lodash"));
                let options = args.options();
                assert_eq!(options.provider.as_deref(), Some("jsdelivr"));
                assert_eq!(options.tag.as_deref(), Some("4.17.21"));
                assert_eq!(options.check, Some(true));
                assert_eq!(options.include_default_export, Some(true));
            }
            _ => panic!("Expected Link command"),
        }
        assert_eq!(cli.root, None);
    }

    #[test]
    fn test_cli_link_flags() {
        let cli = Cli::try_parse_from([
            "cdnlink",
            "l",
            "alpine",
            "--url",
            "https://example.com/alpine.js",
            "--no-check",
            "--no-default",
        ])
        .unwrap();
        match cli.command {
            Commands::Link(args) => {
                let options = args.options();
                assert_eq!(options.url.as_deref(), Some("https://example.com/alpine.js"));
                assert_eq!(options.check, Some(false));
                assert_eq!(options.include_default_export, Some(false));
            }
            _ => panic!("Expected Link command"),
        }
    }

    #[test]
    fn test_cli_link_without_name() {
        let cli = Cli::try_parse_from(["cdnlink", "link"]).unwrap();
        match cli.command {
            Commands::Link(args) => assert_eq!(args.name, None),
            _ => panic!("Expected Link command"),
        }
    }

    #[test]
    fn test_cli_link_options_need_a_name() {
        assert!(Cli::try_parse_from(["cdnlink", "link", "--tag", "1.0.0"]).is_err());
    }

    #[test]
    fn test_cli_unlink_alias() {
        let cli = Cli::try_parse_from(["cdnlink", "ul", "lodash"]).unwrap();
        match cli.command {
            Commands::Unlink(args) => assert_eq!(args.name, "lodash"),
            _ => panic!("Expected Unlink command"),
        }
    }

    #[test]
    fn test_cli_unlink_requires_name() {
        assert!(Cli::try_parse_from(["cdnlink", "unlink"]).is_err());
    }

    #[test]
    fn test_cli_list_alias() {
        let cli = Cli::try_parse_from(["cdnlink", "ls"]).unwrap();
        assert!(matches!(cli.command, Commands::List));
    }

    #[test]
    fn test_cli_global_options() {
        let cli = Cli::try_parse_from([
            "cdnlink",
            "--root",
            "/tmp/site",
            "providers",
            "--providers",
            "/tmp/providers.json",
        ])
        .unwrap();
        assert_eq!(cli.root, Some(PathBuf::from("/tmp/site")));
        assert_eq!(cli.providers, Some(PathBuf::from("/tmp/providers.json")));
        assert!(matches!(cli.command, Commands::Providers));
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        assert!(Cli::try_parse_from(["cdnlink", "lodash"]).is_err());
    }
}
