use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "estimator", version, about = "Website pricing estimator")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the estimator HTTP server (default)
    Serve,

    /// Validate the configuration file and print a summary
    Check,

    /// Price catalog management
    Catalog {
        #[command(subcommand)]
        action: CatalogCommands,
    },

    /// Compute a single estimate from the command line
    Estimate(EstimateArgs),

    /// Show version information
    Version,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CatalogCommands {
    /// Import a TOML or JSON catalog document into the database
    Import {
        /// Catalog document (.toml or .json)
        file: PathBuf,

        /// Re-apply even if the document is unchanged since the last import
        #[arg(short, long)]
        force: bool,
    },

    /// Print the active catalog
    Show,
}

#[derive(Args, Debug, Clone)]
pub struct EstimateArgs {
    /// Project type name
    #[arg(long)]
    pub project_type: String,

    /// Number of pages
    #[arg(long, default_value = "1")]
    pub pages: i64,

    /// Feature name (repeatable)
    #[arg(long = "feature")]
    pub features: Vec<String>,

    /// Timeline type
    #[arg(long)]
    pub timeline: String,

    /// Complexity label
    #[arg(long)]
    pub complexity: String,

    /// Read prices from a catalog document instead of the database
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Get the command to execute, defaulting to Serve if none provided
    pub fn get_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_serve() {
        let cli = Cli {
            config: PathBuf::from("config.toml"),
            command: None,
        };

        assert!(matches!(cli.get_command(), Commands::Serve));
    }

    #[test]
    fn test_cli_parsing_catalog_import() {
        let args = vec!["estimator", "catalog", "import", "prices.toml", "--force"];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.get_command() {
            Commands::Catalog {
                action: CatalogCommands::Import { file, force },
            } => {
                assert_eq!(file, PathBuf::from("prices.toml"));
                assert!(force);
            }
            _ => panic!("Expected Catalog Import command"),
        }
    }

    #[test]
    fn test_cli_parsing_estimate_with_repeated_features() {
        let args = vec![
            "estimator",
            "--config",
            "other.toml",
            "estimate",
            "--project-type",
            "Company Site",
            "--pages",
            "5",
            "--feature",
            "Blog",
            "--feature",
            "Contact Form",
            "--timeline",
            "Short",
            "--complexity",
            "Medium",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, PathBuf::from("other.toml"));

        match cli.get_command() {
            Commands::Estimate(args) => {
                assert_eq!(args.project_type, "Company Site");
                assert_eq!(args.pages, 5);
                assert_eq!(args.features, vec!["Blog", "Contact Form"]);
                assert!(args.catalog.is_none());
                assert!(!args.json);
            }
            _ => panic!("Expected Estimate command"),
        }
    }
}
