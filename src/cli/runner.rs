//! Command runner: builds configuration and client, dispatches subcommands

use crate::catalog::{self, RepositoryNode};
use crate::cli::args::{Args, Command, ServersAction};
use crate::cli::config::{AuthConfig, BrowserConfig};
use crate::common::Timer;
use crate::error::{RegistryError, Result};
use crate::logging::Logger;
use crate::registry::{RegistryClient, ReqwestTransport, ResponseCache};
use crate::state::{FileStore, RegistryServers, Theme, ThemePreference};
use crate::tags::{self, TagRecord};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

pub struct Runner {
    args: Args,
    output: Logger,
}

impl Runner {
    pub fn new(args: Args) -> Result<Self> {
        let output = if args.quiet {
            Logger::new_quiet()
        } else {
            Logger::new(args.verbose)
        };

        Ok(Self { args, output })
    }

    pub async fn run(&self) -> Result<()> {
        self.args.validate().map_err(RegistryError::Validation)?;
        let config = self.load_config()?;

        match &self.args.command {
            Command::Servers { state_file, action } => self.servers(&config, state_file, action),
            Command::Theme {
                state_file,
                set,
                system_dark,
            } => self.theme(&config, state_file, set.as_deref(), *system_dark),
            command => {
                config.validate()?;
                let client = self.create_registry_client()?;
                let timer = Timer::start(format!("{:?}", command));
                let result = match command {
                    Command::Catalog { filter } => {
                        self.catalog(&client, &config, filter.as_deref()).await
                    }
                    Command::Tags {
                        image,
                        page,
                        reverse,
                        filter,
                    } => {
                        self.tags(&client, &config, image, *page, *reverse, filter.as_deref())
                            .await
                    }
                    Command::History { image, tag, arch } => {
                        self.history(&client, &config, image, tag, *arch).await
                    }
                    Command::Delete { image, tags } => {
                        self.delete(&client, &config, image, tags).await
                    }
                    Command::Servers { .. } | Command::Theme { .. } => Ok(()),
                };
                timer.log_elapsed(&self.output);
                result
            }
        }
    }

    /// Defaults, then config file, then environment, then flags
    fn load_config(&self) -> Result<BrowserConfig> {
        let mut config = BrowserConfig::default();
        if let Some(path) = &self.args.config {
            self.output.detail(&format!("Loading configuration from {}", path));
            config.apply_file(path)?;
        }
        config.apply_env();
        if let Some(url) = &self.args.registry_url {
            config.apply_value("registryUrl", &serde_json::Value::String(url.clone()));
        }
        if self.args.username.is_some() {
            config.is_registry_secured = true;
        }
        Ok(config.finalize())
    }

    fn create_registry_client(&self) -> Result<RegistryClient> {
        let credentials = AuthConfig::from_parts(self.args.username.clone(), self.args.password.clone());
        if let Some(credentials) = &credentials {
            credentials.validate()?;
            self.output.detail("Using provided credentials");
        }

        let transport = ReqwestTransport::builder()
            .with_credentials(credentials)
            .with_skip_tls(self.args.skip_tls)
            .with_timeout(self.args.timeout)
            .with_logger(self.output.clone())
            .build()?;

        Ok(RegistryClient::builder(Arc::new(transport))
            .with_cache(ResponseCache::in_memory())
            .with_logger(self.output.clone())
            .build())
    }

    async fn catalog(
        &self,
        client: &RegistryClient,
        config: &BrowserConfig,
        filter: Option<&str>,
    ) -> Result<()> {
        self.output.section(&config.title);
        let view = catalog::load_catalog(client, config, &self.output).await?;
        let nodes = catalog::filter_nodes(&view.nodes, filter.unwrap_or(""));

        self.output.info(&format!(
            "{}: {} repositories, {} images",
            config.name, view.n_repositories, view.n_images
        ));

        let counts: HashMap<String, Option<usize>> = if config.show_catalog_nb_tags {
            let names: Vec<&str> = nodes.iter().flat_map(|n| n.leaves()).collect();
            catalog::tag_counts(client, config, &names, &self.output)
                .await
                .into_iter()
                .collect()
        } else {
            HashMap::new()
        };

        for node in nodes {
            self.print_node(node, 0, &counts, config.catalog_default_expanded);
        }
        Ok(())
    }

    fn print_node(
        &self,
        node: &RepositoryNode,
        depth: usize,
        counts: &HashMap<String, Option<usize>>,
        expanded: bool,
    ) {
        let indent = "  ".repeat(depth);
        match node {
            RepositoryNode::Leaf(name) => {
                let suffix = match counts.get(name) {
                    Some(Some(count)) => format!(" ({} tags)", count),
                    Some(None) => " (? tags)".to_string(),
                    None => String::new(),
                };
                self.output.line(&format!("{}{}{}", indent, name, suffix));
            }
            RepositoryNode::Branch(branch) => {
                self.output.line(&format!(
                    "{}{} [{} images]",
                    indent,
                    branch.repo,
                    node.image_count()
                ));
                if expanded || depth == 0 {
                    for child in &branch.images {
                        self.print_node(child, depth + 1, counts, expanded);
                    }
                }
            }
        }
    }

    async fn tags(
        &self,
        client: &RegistryClient,
        config: &BrowserConfig,
        image: &str,
        page: usize,
        reverse: bool,
        filter: Option<&str>,
    ) -> Result<()> {
        self.output.section(&format!("{}/{}", config.pull_url, image));
        let mut view = tags::load_tag_list(client, config, image, page, &self.output).await?;
        if reverse {
            view.reverse();
        }

        view.set_filter(filter.unwrap_or(""));

        let now = Utc::now();
        let rows = view.visible();
        for record in &rows {
            self.output.line(&self.format_record(record, config, now));
        }
        if rows.is_empty() {
            self.output.info("No tags to display");
        }

        let labels: Vec<String> = view
            .labels()
            .iter()
            .map(|l| match l.icon {
                Some(icon) => format!("{:?}", icon).to_lowercase(),
                None if l.current => format!("[{}]", l.page),
                None => l.page.to_string(),
            })
            .collect();
        if !labels.is_empty() {
            self.output.line(&format!("Pages: {}", labels.join(" ")));
        }
        self.output.summary_kv(
            "Tag list",
            &[
                ("Tags", view.tags.len().to_string()),
                ("Page", format!("{}/{}", view.page(), view.page_count)),
                ("Order", if view.is_ascending() { "configured" } else { "reversed" }.to_string()),
            ],
        );
        Ok(())
    }

    fn format_record(
        &self,
        record: &TagRecord,
        config: &BrowserConfig,
        now: chrono::DateTime<Utc>,
    ) -> String {
        let mut columns = vec![
            record.tag.clone(),
            self.output.format_size(record.size),
            self.output.format_relative(record.creation_date, now),
            record.arch.clone().unwrap_or_else(|| "-".to_string()),
        ];
        if config.show_content_digest {
            columns.push(record.content_digest.clone().unwrap_or_else(|| "-".to_string()));
        }
        columns.join("\t")
    }

    async fn history(
        &self,
        client: &RegistryClient,
        config: &BrowserConfig,
        image: &str,
        tag: &str,
        arch: usize,
    ) -> Result<()> {
        if !config.show_tag_history {
            return Err(RegistryError::Validation(
                "Tag history is disabled for this registry".to_string(),
            ));
        }

        self.output.section(&format!("History of {}:{}", image, tag));
        let mut history = tags::load_history(client, config, image, tag).await?;

        if !history.archs.is_empty() {
            let titles: Vec<String> = history
                .archs
                .iter()
                .enumerate()
                .map(|(i, a)| if i == arch { format!("[{}]", a.title) } else { a.title.clone() })
                .collect();
            self.output.line(&format!("Architectures: {}", titles.join(" ")));

            if arch > 0 {
                let tab = history.archs.get(arch).cloned().ok_or_else(|| {
                    RegistryError::NotFound(format!(
                        "Architecture tab {} (only {} available)",
                        arch,
                        history.archs.len()
                    ))
                })?;
                let archs = std::mem::take(&mut history.archs);
                history = tags::history_for(client, config, image, &tab.digest).await?;
                history.archs = archs;
            }
        }

        self.output.summary_kv(
            "Image",
            &history
                .details
                .iter()
                .map(|f| (f.key.as_str(), f.display_value()))
                .collect::<Vec<_>>(),
        );

        for (i, entry) in history.entries.iter().enumerate() {
            self.output.subsection(&format!("Step {}", history.entries.len() - i));
            for field in entry {
                self.output.line(&format!("  {}: {}", field.key, field.display_value()));
            }
        }
        Ok(())
    }

    async fn delete(
        &self,
        client: &RegistryClient,
        config: &BrowserConfig,
        image: &str,
        tags_to_delete: &[String],
    ) -> Result<()> {
        self.output.section(&format!("Deleting {} tags of {}", tags_to_delete.len(), image));
        let records: Vec<TagRecord> = tags_to_delete
            .iter()
            .map(|tag| TagRecord::new(image, tag.clone()))
            .collect();

        let report = tags::delete_tags(client, config, &records, &self.output).await?;
        for (reference, outcome) in &report.outcomes {
            if let tags::DeleteOutcome::Deleted { digest } = outcome {
                self.output.success(&format!("Deleted {} ({})", reference, digest));
            }
        }

        if report.is_success() {
            Ok(())
        } else {
            Err(RegistryError::Validation(format!(
                "{} of {} deletions failed",
                report.failed(),
                report.outcomes.len()
            )))
        }
    }

    fn servers(&self, config: &BrowserConfig, state_file: &str, action: &ServersAction) -> Result<()> {
        let store = Arc::new(FileStore::open(state_file)?);
        let servers = RegistryServers::new(store);
        servers.init_defaults(&config.default_registries)?;

        let list = match action {
            ServersAction::List => servers.list(),
            ServersAction::Add { .. } | ServersAction::Remove { .. }
                if config.read_only_registries =>
            {
                return Err(RegistryError::Validation(
                    "The registry list is read-only".to_string(),
                ));
            }
            ServersAction::Add { url } => {
                let list = servers.add(url)?;
                self.output.success(&format!("Added {}", url));
                list
            }
            ServersAction::Remove { url } => {
                let list = servers.remove(url)?;
                self.output.success(&format!("Removed {}", url));
                list
            }
        };

        self.output.list("Registries", &list);
        Ok(())
    }

    fn theme(
        &self,
        config: &BrowserConfig,
        state_file: &str,
        set: Option<&str>,
        system_dark: bool,
    ) -> Result<()> {
        let configured = config.theme()?;
        let preference = ThemePreference::new(Arc::new(FileStore::open(state_file)?));

        if let Some(choice) = set {
            let theme: Theme = choice.parse()?;
            preference.store(theme)?;
            self.output.success(&format!("Stored theme {}", theme));
        }

        let effective = preference.resolve(configured, system_dark);
        self.output.summary_kv(
            "Theme",
            &[
                ("Configured", configured.to_string()),
                (
                    "Stored",
                    preference
                        .stored()
                        .map(|t| t.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                ),
                ("Effective", effective.to_string()),
            ],
        );
        self.output.line(&effective.to_string());
        Ok(())
    }
}
