//! Namespace tree inference for catalog repositories
//!
//! Registries keep no folder metadata, so the tree is derived from `/`
//! separated name segments alone. Input is sorted first and only the last
//! top-level node is considered when placing a repository, which keeps
//! siblings together as long as they are contiguous after sorting.

use crate::error::{RegistryError, Result};
use serde::Serialize;

/// A catalog entry: either a repository or a synthetic namespace branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RepositoryNode {
    Leaf(String),
    Branch(CatalogBranch),
}

/// Namespace grouping node. `repo` carries a trailing slash and prefixes
/// every leaf below it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogBranch {
    pub repo: String,
    pub images: Vec<RepositoryNode>,
}

impl CatalogBranch {
    pub fn new(repo: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            images: Vec::new(),
        }
    }
}

impl RepositoryNode {
    pub fn leaf(name: impl Into<String>) -> Self {
        RepositoryNode::Leaf(name.into())
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, RepositoryNode::Branch(_))
    }

    /// Label shown for the node: the repository name or the branch prefix
    pub fn label(&self) -> &str {
        match self {
            RepositoryNode::Leaf(name) => name,
            RepositoryNode::Branch(branch) => &branch.repo,
        }
    }

    /// 1 for a repository, number of direct children for a branch
    pub fn image_count(&self) -> usize {
        match self {
            RepositoryNode::Leaf(_) => 1,
            RepositoryNode::Branch(branch) => branch.images.len(),
        }
    }

    /// Every repository name below this node, depth first
    pub fn leaves(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            RepositoryNode::Leaf(name) => out.push(name),
            RepositoryNode::Branch(branch) => {
                for child in &branch.images {
                    child.collect_leaves(out);
                }
            }
        }
    }
}

/// Validated branching depth bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Branching {
    min: i64,
    max: i64,
}

impl Branching {
    pub fn new(min: i64, max: i64) -> Result<Self> {
        if min > max {
            return Err(RegistryError::InvalidArgument(format!(
                "min must be <= max (min: {}, max: {})",
                min, max
            )));
        }
        if max < 0 || min < 0 {
            return Err(RegistryError::InvalidArgument(
                "min and max must be >= 0".to_string(),
            ));
        }
        Ok(Self { min, max })
    }

    /// Build from textual bounds; an empty bound counts as 1
    pub fn parse(min: &str, max: &str) -> Result<Self> {
        let clean = |value: &str| -> Option<i64> {
            let value = value.trim();
            if value.is_empty() {
                Some(1)
            } else {
                value.parse::<i64>().ok()
            }
        };

        match (clean(min), clean(max)) {
            (Some(min_n), Some(max_n)) => Self::new(min_n, max_n),
            _ => Err(RegistryError::InvalidArgument(format!(
                "min and max must be integers: (min: {} and max: {})",
                min, max
            ))),
        }
    }

    /// Segment count a repository must exceed to be grouped
    fn effective_min(&self) -> i64 {
        if self.max == 1 { 1 } else { self.min }
    }

    /// Arrange repository names into a namespace tree
    pub fn branch(&self, repositories: &[String]) -> Vec<RepositoryNode> {
        let mut sorted = repositories.to_vec();
        sorted.sort();

        let effective_min = self.effective_min();
        let mut acc: Vec<RepositoryNode> = Vec::new();

        for image in sorted {
            let split: Vec<&str> = image.split('/').collect();

            if effective_min > 0 && split.len() as i64 > effective_min {
                let repo_name = repository_name(&split, self.max);

                let target = match acc.last_mut() {
                    Some(RepositoryNode::Branch(last)) => latest_repository(last, &repo_name),
                    _ => None,
                };

                match target {
                    Some(branch) => branch.images.push(RepositoryNode::Leaf(image)),
                    None => {
                        let mut branch = CatalogBranch::new(repo_name);
                        branch.images.push(RepositoryNode::Leaf(image));
                        acc.push(RepositoryNode::Branch(branch));
                    }
                }
            } else {
                acc.push(RepositoryNode::Leaf(image));
            }
        }

        acc
    }
}

/// Convenience wrapper: validate bounds and branch in one call
pub fn branch(repositories: &[String], min: i64, max: i64) -> Result<Vec<RepositoryNode>> {
    Ok(Branching::new(min, max)?.branch(repositories))
}

/// First `max` segments, never the last one, each followed by `/`
fn repository_name(split: &[&str], max: i64) -> String {
    let take = (max.max(0) as usize).min(split.len().saturating_sub(1));
    split[..take].iter().map(|segment| format!("{}/", segment)).collect()
}

/// Where a repository lands inside a branch: the index path to an existing
/// branch, plus whether a new branch must be created there
struct Location {
    path: Vec<usize>,
    create: bool,
}

fn locate(branch: &CatalogBranch, repo_name: &str) -> Option<Location> {
    if branch.repo == repo_name {
        return Some(Location {
            path: Vec::new(),
            create: false,
        });
    }

    for (i, child) in branch.images.iter().enumerate() {
        if let RepositoryNode::Branch(child) = child {
            if let Some(mut location) = locate(child, repo_name) {
                location.path.insert(0, i);
                return Some(location);
            }
        }
    }

    if repo_name.starts_with(&branch.repo) {
        return Some(Location {
            path: Vec::new(),
            create: true,
        });
    }

    None
}

/// Find the branch named `repo_name` below `branch`, synthesizing an
/// intermediate branch under the deepest prefix when no exact match exists
fn latest_repository<'a>(
    branch: &'a mut CatalogBranch,
    repo_name: &str,
) -> Option<&'a mut CatalogBranch> {
    let location = locate(branch, repo_name)?;

    let mut current = branch;
    for index in location.path {
        current = match current.images.get_mut(index)? {
            RepositoryNode::Branch(child) => child,
            RepositoryNode::Leaf(_) => return None,
        };
    }

    if !location.create {
        return Some(current);
    }

    current
        .images
        .push(RepositoryNode::Branch(CatalogBranch::new(repo_name)));
    match current.images.last_mut() {
        Some(RepositoryNode::Branch(created)) => Some(created),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repos(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn branch_node(repo: &str, images: Vec<RepositoryNode>) -> RepositoryNode {
        RepositoryNode::Branch(CatalogBranch {
            repo: repo.to_string(),
            images,
        })
    }

    #[test]
    fn test_groups_shared_first_segment() {
        let tree = branch(&repos(&["d", "a/c", "a/b"]), 1, 1).unwrap();
        assert_eq!(
            tree,
            vec![
                branch_node(
                    "a/",
                    vec![RepositoryNode::leaf("a/b"), RepositoryNode::leaf("a/c")]
                ),
                RepositoryNode::leaf("d"),
            ]
        );
    }

    #[test]
    fn test_single_segment_never_branches() {
        let tree = branch(&repos(&["alpine", "busybox"]), 1, 1).unwrap();
        assert_eq!(
            tree,
            vec![RepositoryNode::leaf("alpine"), RepositoryNode::leaf("busybox")]
        );
    }

    #[test]
    fn test_lone_namespaced_repository_gets_its_own_branch() {
        let tree = branch(&repos(&["org/app"]), 1, 1).unwrap();
        assert_eq!(tree, vec![branch_node("org/", vec![RepositoryNode::leaf("org/app")])]);
    }

    #[test]
    fn test_nested_branch_is_synthesized_under_prefix() {
        let tree = branch(&repos(&["a/b", "a/b/c", "a/b/d"]), 1, 2).unwrap();
        assert_eq!(
            tree,
            vec![branch_node(
                "a/",
                vec![
                    RepositoryNode::leaf("a/b"),
                    branch_node(
                        "a/b/",
                        vec![RepositoryNode::leaf("a/b/c"), RepositoryNode::leaf("a/b/d")]
                    ),
                ]
            )]
        );
    }

    #[test]
    fn test_only_last_top_level_entry_is_searched() {
        // "org/x" sorts after "org/team/app", whose branch is not a prefix of "org/"
        let tree = branch(&repos(&["org/team/app", "org/x"]), 1, 2).unwrap();
        assert_eq!(
            tree,
            vec![
                branch_node("org/team/", vec![RepositoryNode::leaf("org/team/app")]),
                branch_node("org/", vec![RepositoryNode::leaf("org/x")]),
            ]
        );
    }

    #[test]
    fn test_min_zero_disables_grouping() {
        let tree = branch(&repos(&["a/b", "a/c"]), 0, 2).unwrap();
        assert_eq!(tree, vec![RepositoryNode::leaf("a/b"), RepositoryNode::leaf("a/c")]);
    }

    #[test]
    fn test_min_two_requires_three_segments() {
        let tree = branch(&repos(&["a/b", "a/b/c"]), 2, 2).unwrap();
        assert_eq!(
            tree,
            vec![
                RepositoryNode::leaf("a/b"),
                branch_node("a/b/", vec![RepositoryNode::leaf("a/b/c")]),
            ]
        );
    }

    #[test]
    fn test_invalid_bounds() {
        assert!(matches!(
            branch(&[], 2, 1),
            Err(RegistryError::InvalidArgument(_))
        ));
        assert!(matches!(
            branch(&[], -1, 1),
            Err(RegistryError::InvalidArgument(_))
        ));
        assert!(matches!(
            Branching::parse("x", "1"),
            Err(RegistryError::InvalidArgument(_))
        ));
        assert_eq!(Branching::parse("", "").unwrap(), Branching::new(1, 1).unwrap());
    }

    #[test]
    fn test_leaves_and_counts() {
        let tree = branch(&repos(&["a/b", "a/c", "d"]), 1, 1).unwrap();
        assert_eq!(tree[0].image_count(), 2);
        assert_eq!(tree[1].image_count(), 1);
        assert_eq!(tree[0].leaves(), vec!["a/b", "a/c"]);
        assert_eq!(tree[0].label(), "a/");
    }

    #[test]
    fn test_serializes_like_the_catalog_model() {
        let tree = branch(&repos(&["a/b", "d"]), 1, 1).unwrap();
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"repo": "a/", "images": ["a/b"]}, "d"])
        );
    }
}
