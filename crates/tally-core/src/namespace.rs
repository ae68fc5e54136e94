//! Namespace registry - the tree that discovery walks
//!
//! A namespace is a hierarchy of packages, modules and types, each of which
//! may own test cases. Nodes are immutable once built and are shared through
//! `Arc`, so the same container can be attached under several parents.
//!
//! # Example
//!
//! ```
//! use tally_core::namespace::Namespace;
//!
//! let shared = Namespace::module("app::util")
//!     .test("trims", |_| Ok(()))
//!     .build();
//!
//! let root = Namespace::package("app")
//!     .test("boots", |_| Ok(()))
//!     .child(shared.clone())
//!     .child(Namespace::module("app::io").child(shared).build())
//!     .build();
//! # let _ = root;
//! ```

use crate::context::TestContext;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Classification of a namespace node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Package,
    Module,
    Type,
    /// A bare value; never traversed as a container
    Value,
}

impl NodeKind {
    /// Whether discovery may descend into nodes of this kind
    pub fn is_container(self) -> bool {
        !matches!(self, NodeKind::Value)
    }
}

/// Identity token used to deduplicate nodes during discovery
///
/// Distinct from the node path: two nodes may format the same path and
/// still be different containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

impl NodeId {
    /// Allocate a process-unique id
    pub fn fresh() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Signature of a test body
pub type TestBody = dyn Fn(&TestContext<'_>) -> anyhow::Result<()> + Send + Sync;

/// A runnable unit discovered in a namespace
#[derive(Clone)]
pub struct TestCase {
    /// Human-assigned label (empty when unset)
    pub display_name: String,
    /// Globally unique name derived from the namespace path
    pub qualified_name: String,
    body: Arc<TestBody>,
}

impl TestCase {
    /// Create a test case without a display label
    ///
    /// # Panics
    ///
    /// Panics if `qualified_name` is empty.
    pub fn new<F>(qualified_name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&TestContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let qualified_name = qualified_name.into();
        assert!(!qualified_name.is_empty(), "test qualified name must not be empty");
        Self {
            display_name: String::new(),
            qualified_name,
            body: Arc::new(body),
        }
    }

    /// Attach a human-readable label
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Run the test body once
    pub fn invoke(&self, ctx: &TestContext<'_>) -> anyhow::Result<()> {
        (self.body)(ctx)
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("display_name", &self.display_name)
            .field("qualified_name", &self.qualified_name)
            .finish_non_exhaustive()
    }
}

/// Read-only view of a point in the namespace
///
/// Implement this to expose an existing structure to discovery; the
/// [`Namespace`] registry is the stock implementation.
pub trait NamespaceNode: Send + Sync {
    fn id(&self) -> NodeId;

    /// Fully qualified path, segments separated by `::`
    fn path(&self) -> &str;

    fn kind(&self) -> NodeKind;

    /// Whether the node can be inspected at all; non-introspectable nodes are
    /// silently left out of discovery
    fn is_introspectable(&self) -> bool {
        true
    }

    /// Directly attached tests, in declaration order
    fn tests(&self) -> Vec<TestCase>;

    /// Child nodes, in natural enumeration order
    fn children(&self) -> Vec<Arc<dyn NamespaceNode>>;
}

/// Registry node built with [`NamespaceBuilder`]
pub struct Namespace {
    id: NodeId,
    path: String,
    kind: NodeKind,
    introspectable: bool,
    tests: Vec<TestCase>,
    children: Vec<Arc<dyn NamespaceNode>>,
}

impl Namespace {
    pub fn builder(kind: NodeKind, path: impl Into<String>) -> NamespaceBuilder {
        NamespaceBuilder {
            kind,
            path: path.into(),
            introspectable: true,
            tests: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn package(path: impl Into<String>) -> NamespaceBuilder {
        Self::builder(NodeKind::Package, path)
    }

    pub fn module(path: impl Into<String>) -> NamespaceBuilder {
        Self::builder(NodeKind::Module, path)
    }

    pub fn ty(path: impl Into<String>) -> NamespaceBuilder {
        Self::builder(NodeKind::Type, path)
    }

    pub fn value(path: impl Into<String>) -> NamespaceBuilder {
        Self::builder(NodeKind::Value, path)
    }

    /// Last path segment
    pub fn name(&self) -> &str {
        self.path.rsplit("::").next().unwrap_or(&self.path)
    }
}

impl NamespaceNode for Namespace {
    fn id(&self) -> NodeId {
        self.id
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn is_introspectable(&self) -> bool {
        self.introspectable
    }

    fn tests(&self) -> Vec<TestCase> {
        self.tests.clone()
    }

    fn children(&self) -> Vec<Arc<dyn NamespaceNode>> {
        self.children.clone()
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("tests", &self.tests.len())
            .field("children", &self.children.len())
            .finish()
    }
}

/// Builder for [`Namespace`] nodes
pub struct NamespaceBuilder {
    kind: NodeKind,
    path: String,
    introspectable: bool,
    tests: Vec<TestCase>,
    children: Vec<Arc<dyn NamespaceNode>>,
}

impl NamespaceBuilder {
    /// Register a test named `name` under this node's path
    ///
    /// # Panics
    ///
    /// Panics if both `name` and this node's path are empty, since the test
    /// would have no qualified name.
    pub fn test<F>(mut self, name: &str, body: F) -> Self
    where
        F: Fn(&TestContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.tests.push(TestCase::new(qualify(&self.path, name), body));
        self
    }

    /// Register a test with a human-readable label
    ///
    /// # Panics
    ///
    /// Same condition as [`NamespaceBuilder::test`].
    pub fn labeled_test<F>(mut self, label: &str, name: &str, body: F) -> Self
    where
        F: Fn(&TestContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.tests
            .push(TestCase::new(qualify(&self.path, name), body).with_display_name(label));
        self
    }

    /// Attach a child node; the same node may be attached under many parents
    pub fn child(mut self, node: Arc<dyn NamespaceNode>) -> Self {
        self.children.push(node);
        self
    }

    /// Mark the node as not introspectable
    pub fn opaque(mut self) -> Self {
        self.introspectable = false;
        self
    }

    pub fn build(self) -> Arc<Namespace> {
        Arc::new(Namespace {
            id: NodeId::fresh(),
            path: self.path,
            kind: self.kind,
            introspectable: self.introspectable,
            tests: self.tests,
            children: self.children,
        })
    }
}

fn qualify(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}::{}", path, name)
    }
}
