//! Repository catalog: loading, namespace tree, filtering and tag counts

pub mod branching;

pub use branching::{Branching, CatalogBranch, RepositoryNode, branch};

use crate::cli::config::BrowserConfig;
use crate::common::FormatUtils;
use crate::error::Result;
use crate::logging::Notifier;
use crate::registry::RegistryClient;
use futures::future::join_all;
use serde::Serialize;

/// What the catalog screen shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogView {
    pub nodes: Vec<RepositoryNode>,
    /// Top-level entries after branching
    pub n_repositories: usize,
    /// Repositories reported by the registry
    pub n_images: usize,
}

/// Fetch the catalog and arrange it. Invalid branching bounds are reported
/// through `notifier` and the flat sorted list is used instead.
pub async fn load_catalog(
    client: &RegistryClient,
    config: &BrowserConfig,
    notifier: &dyn Notifier,
) -> Result<CatalogView> {
    let branching = match Branching::new(config.catalog_min_branches, config.catalog_max_branches)
    {
        Ok(branching) => Some(branching),
        Err(e) => {
            notifier.error(&e.to_string());
            None
        }
    };

    let limit = config.catalog_elements_limit.max(0) as usize;
    let mut repositories = client
        .list_catalog(&config.registry_url, limit, config.is_registry_secured)
        .await?;
    repositories.sort();
    let n_images = repositories.len();

    let nodes = match branching {
        Some(branching) => branching.branch(&repositories),
        None => repositories.into_iter().map(RepositoryNode::Leaf).collect(),
    };

    client.logger().verbose(&format!(
        "Catalog of {} lists {} repositories in {} entries",
        config.registry_url,
        n_images,
        nodes.len()
    ));

    Ok(CatalogView {
        n_repositories: nodes.len(),
        n_images,
        nodes,
    })
}

fn node_matches(node: &RepositoryNode, filter: &str) -> bool {
    match node {
        RepositoryNode::Leaf(name) => FormatUtils::match_search(filter, name),
        RepositoryNode::Branch(branch) => branch.images.iter().any(|c| node_matches(c, filter)),
    }
}

/// Top-level nodes with at least one repository containing `filter`
/// (case-insensitive). Matching branches are kept whole.
pub fn filter_nodes<'a>(nodes: &'a [RepositoryNode], filter: &str) -> Vec<&'a RepositoryNode> {
    let filter = filter.to_lowercase();
    nodes.iter().filter(|n| node_matches(n, &filter)).collect()
}

/// Tag count per repository, in input order. Failures are notified and
/// leave the count empty.
pub async fn tag_counts(
    client: &RegistryClient,
    config: &BrowserConfig,
    repositories: &[&str],
    notifier: &dyn Notifier,
) -> Vec<(String, Option<usize>)> {
    let requests = repositories.iter().map(|name| async move {
        let count = client
            .count_tags(&config.registry_url, name, config.is_registry_secured)
            .await;
        (name.to_string(), count)
    });

    join_all(requests)
        .await
        .into_iter()
        .map(|(name, count)| match count {
            Ok(count) => (name, Some(count)),
            Err(e) => {
                notifier.error(&format!("Failed to load tag count for {}: {}", name, e.user_message()));
                (name, None)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Vec<RepositoryNode> {
        let repos: Vec<String> = ["a/b", "a/c", "d", "web/app"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        branch(&repos, 1, 1).unwrap()
    }

    #[test]
    fn test_filter_keeps_branches_with_matching_leaf() {
        let nodes = tree();
        let filtered = filter_nodes(&nodes, "C");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].label(), "a/");
        assert_eq!(filtered[0].image_count(), 2);
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let nodes = tree();
        assert_eq!(filter_nodes(&nodes, "").len(), nodes.len());
        assert!(filter_nodes(&nodes, "zzz").is_empty());
    }
}
