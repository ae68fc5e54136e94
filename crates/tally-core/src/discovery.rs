//! Test discovery - walk a namespace tree and collect its test cases

use crate::namespace::{NamespaceNode, NodeId, TestCase};
use std::collections::HashSet;
use std::sync::Arc;

/// Namespaces that belong to the toolchain rather than the code under test
pub const DEFAULT_EXCLUDED_PREFIXES: &[&str] = &["std", "core", "alloc"];

/// Discovery configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Path prefixes whose subtrees are never entered
    pub excluded_prefixes: Vec<String>,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            excluded_prefixes: DEFAULT_EXCLUDED_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

impl DiscoveryOptions {
    /// Options that exclude nothing
    pub fn none() -> Self {
        Self {
            excluded_prefixes: Vec::new(),
        }
    }

    /// Replace the excluded prefixes
    pub fn with_excluded_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `path` lies inside an excluded namespace
    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded_prefixes.iter().any(|prefix| {
            path == prefix
                || path
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.starts_with("::"))
        })
    }
}

/// Ordered, deduplicated tests found under one root
#[derive(Debug, Default, Clone)]
pub struct TestSuite {
    /// Tests in pre-order: a node's own tests, then each child subtree
    pub tests: Vec<TestCase>,
}

impl TestSuite {
    /// Discover every test reachable from `root`
    ///
    /// Each container is visited at most once, keyed by its [`NodeId`].
    /// Discovery never fails; unreachable or malformed parts of the tree
    /// simply contribute no tests.
    pub fn discover(root: &dyn NamespaceNode, options: &DiscoveryOptions) -> Self {
        let mut walk = Walk {
            options,
            visited: HashSet::new(),
            names: HashSet::new(),
            tests: Vec::new(),
        };
        walk.visited.insert(root.id());
        walk.visit(root);

        tracing::debug!(
            root = root.path(),
            tests = walk.tests.len(),
            containers = walk.visited.len(),
            "discovery finished"
        );

        TestSuite { tests: walk.tests }
    }

    /// Check if suite has any tests
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Get count of tests
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TestCase> {
        self.tests.iter()
    }

    /// Qualified names in discovery order
    pub fn qualified_names(&self) -> Vec<&str> {
        self.tests.iter().map(|t| t.qualified_name.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a TestSuite {
    type Item = &'a TestCase;
    type IntoIter = std::slice::Iter<'a, TestCase>;

    fn into_iter(self) -> Self::IntoIter {
        self.tests.iter()
    }
}

struct Walk<'o> {
    options: &'o DiscoveryOptions,
    visited: HashSet<NodeId>,
    names: HashSet<String>,
    tests: Vec<TestCase>,
}

impl Walk<'_> {
    fn visit(&mut self, node: &dyn NamespaceNode) {
        for test in node.tests() {
            if self.names.insert(test.qualified_name.clone()) {
                self.tests.push(test);
            } else {
                tracing::warn!(
                    test = %test.qualified_name,
                    node = node.path(),
                    "duplicate qualified test name, keeping the first"
                );
            }
        }

        for child in node.children() {
            if self.admit(&child) {
                self.visit(child.as_ref());
            }
        }
    }

    /// Child selection: containers only, introspectable, outside excluded
    /// namespaces, and not seen before in this walk
    fn admit(&mut self, child: &Arc<dyn NamespaceNode>) -> bool {
        let path = child.path();
        if !child.kind().is_container() {
            tracing::trace!(path, "skipping non-container");
            return false;
        }
        if !child.is_introspectable() {
            tracing::trace!(path, "skipping non-introspectable node");
            return false;
        }
        if self.options.is_excluded(path) {
            tracing::trace!(path, "skipping excluded namespace");
            return false;
        }
        if !self.visited.insert(child.id()) {
            tracing::trace!(path, "skipping already visited node");
            return false;
        }
        true
    }
}
