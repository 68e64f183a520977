//! Command-line argument parsing

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "docker-registry-browser")]
#[command(about = "Browse repositories, tags and image history of a Docker registry")]
#[command(version, author)]
pub struct Args {
    /// Registry base URL
    #[arg(
        long = "registry-url",
        short = 'r',
        global = true,
        help = "Registry base URL, e.g. https://registry.example.com"
    )]
    pub registry_url: Option<String>,

    /// Registry username
    #[arg(
        long = "username",
        short = 'u',
        global = true,
        help = "Username sent as basic credentials when the registry is secured"
    )]
    pub username: Option<String>,

    /// Registry password
    #[arg(
        long = "password",
        short = 'p',
        global = true,
        help = "Password sent as basic credentials when the registry is secured"
    )]
    pub password: Option<String>,

    /// Configuration file path
    #[arg(
        long = "config",
        short = 'c',
        global = true,
        help = "Path to a JSON configuration file"
    )]
    pub config: Option<String>,

    /// Skip TLS verification
    #[arg(
        long = "skip-tls",
        short = 'k',
        global = true,
        help = "Skip TLS certificate verification"
    )]
    pub skip_tls: bool,

    /// Timeout in seconds for network operations
    #[arg(
        long = "timeout",
        short = 't',
        global = true,
        default_value = "60",
        help = "Timeout for network operations in seconds"
    )]
    pub timeout: u64,

    /// Verbose output
    #[arg(
        long = "verbose",
        short = 'v',
        global = true,
        help = "Enable verbose output"
    )]
    pub verbose: bool,

    /// Quiet output
    #[arg(
        long = "quiet",
        short = 'q',
        global = true,
        conflicts_with = "verbose",
        help = "Only print results and errors"
    )]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List repositories as a namespace tree
    Catalog {
        /// Only show repositories containing this text
        #[arg(long = "filter", short = 'f')]
        filter: Option<String>,
    },
    /// List the tags of a repository
    Tags {
        /// Repository name, e.g. library/alpine
        image: String,
        /// Page to show
        #[arg(long = "page", default_value = "1")]
        page: usize,
        /// Reverse the configured order
        #[arg(long = "reverse")]
        reverse: bool,
        /// Only show tags containing this text
        #[arg(long = "filter", short = 'f')]
        filter: Option<String>,
    },
    /// Show the build history of a tag
    History {
        image: String,
        tag: String,
        /// Platform tab of a multi-arch tag (0-based)
        #[arg(long = "arch", default_value = "0")]
        arch: usize,
    },
    /// Delete tags by resolving them to their manifest digest
    Delete {
        image: String,
        #[arg(required = true)]
        tags: Vec<String>,
    },
    /// Manage the list of known registries
    Servers {
        /// JSON file the list is stored in
        #[arg(long = "state-file", default_value = ".registry-browser.json")]
        state_file: String,
        #[command(subcommand)]
        action: ServersAction,
    },
    /// Show the effective theme, optionally storing a choice first
    Theme {
        /// JSON file the choice is stored in
        #[arg(long = "state-file", default_value = ".registry-browser.json")]
        state_file: String,
        /// Store light, dark or auto (auto clears the stored choice)
        #[arg(long = "set")]
        set: Option<String>,
        /// Resolve `auto` as if the system prefers a dark scheme
        #[arg(long = "system-dark")]
        system_dark: bool,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ServersAction {
    List,
    Add { url: String },
    Remove { url: String },
}

impl Args {
    pub fn parse_args() -> Self {
        Args::parse()
    }

    /// Fill credentials from the environment when not given on the command line
    pub fn from_env(mut self) -> Self {
        if self.username.is_none() {
            self.username = std::env::var("REGISTRY_USERNAME").ok();
        }
        if self.password.is_none() {
            self.password = std::env::var("REGISTRY_PASSWORD").ok();
        }
        self
    }

    /// Validate arguments
    pub fn validate(&self) -> Result<(), String> {
        if let Some(url) = &self.registry_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Registry URL must start with http:// or https://".to_string());
            }
        }

        if self.timeout == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }

        if self.username.is_some() != self.password.is_some() {
            return Err("Username and password must be given together".to_string());
        }

        if let Command::Tags { page: 0, .. } = self.command {
            return Err("Page numbers start at 1".to_string());
        }

        Ok(())
    }
}
