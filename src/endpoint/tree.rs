//! The endpoint tree.

use std::fmt;
use std::ops::Index;

use serde::Serialize;

use crate::codec::ValueType;
use crate::error::Result;

/// Access string used when the interface document does not give one.
pub const DEFAULT_ACCESS: &str = "none";

/// Type string of container endpoints.
pub const CONTAINER_TYPE: &str = "none";

/// One node of the device's interface.
///
/// Children are owned and kept in document order. Serializing an endpoint
/// produces the same shape the device uses in its interface document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    name: String,
    #[serde(rename = "type")]
    declared_type: String,
    id: u16,
    access: String,
    #[serde(rename = "members", skip_serializing_if = "Vec::is_empty")]
    children: Vec<Endpoint>,
}

impl Endpoint {
    /// Create a childless endpoint.
    pub fn new(
        name: impl Into<String>,
        declared_type: impl Into<String>,
        id: u16,
        access: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            id,
            access: access.into(),
            children: Vec::new(),
        }
    }

    /// The unnamed root that owns a whole tree.
    pub fn root() -> Self {
        Self::new("", CONTAINER_TYPE, 0, DEFAULT_ACCESS)
    }

    /// Insert a child, replacing any sibling with the same name in place.
    ///
    /// Returns the inserted child so callers can keep building beneath it.
    pub(crate) fn add_child(&mut self, child: Endpoint) -> &mut Endpoint {
        let index = match self.children.iter().position(|c| c.name == child.name) {
            Some(index) => {
                tracing::warn!(
                    "Duplicate endpoint name {:?} under {:?}, keeping the later one",
                    child.name,
                    self.name
                );
                self.children[index] = child;
                index
            }
            None => {
                self.children.push(child);
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }

    #[inline]
    pub fn id(&self) -> u16 {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type string from the interface document (`"int32"`, `"float"`, `"object"`, ...).
    #[inline]
    pub fn declared_type(&self) -> &str {
        &self.declared_type
    }

    /// Advisory access string, `"none"` when the document has none.
    #[inline]
    pub fn access(&self) -> &str {
        &self.access
    }

    /// Wire type for reading and writing this endpoint, if it carries a value.
    pub fn value_type(&self) -> Option<ValueType> {
        ValueType::from_declared(&self.declared_type)
    }

    /// Whether the access string allows reads.
    pub fn is_readable(&self) -> bool {
        matches!(
            self.access.as_str(),
            "r" | "rw" | "readonly" | "readwrite"
        )
    }

    /// Whether the access string allows writes.
    pub fn is_writable(&self) -> bool {
        matches!(
            self.access.as_str(),
            "w" | "rw" | "writeonly" | "readwrite"
        )
    }

    /// Direct child by name.
    pub fn child(&self, name: &str) -> Option<&Endpoint> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Direct children in document order.
    pub fn children(&self) -> std::slice::Iter<'_, Endpoint> {
        self.children.iter()
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Look up a descendant by dotted path, e.g. `"axis0.encoder.pos_estimate"`.
    ///
    /// The empty path is this endpoint.
    pub fn find(&self, path: &str) -> Option<&Endpoint> {
        if path.is_empty() {
            return Some(self);
        }
        path.split('.')
            .try_fold(self, |node, segment| node.child(segment))
    }

    /// First descendant with the given id, depth first in document order.
    pub fn find_by_id(&self, id: u16) -> Option<&Endpoint> {
        self.walk()
            .find(|(_, endpoint)| endpoint.id == id)
            .map(|(_, endpoint)| endpoint)
    }

    /// Dotted path of the first descendant with the given id.
    ///
    /// Together with [`find`](Self::find) this gives upward navigation: the
    /// parent of `a.b.c` is `a.b`.
    pub fn path_of(&self, id: u16) -> Option<String> {
        self.walk()
            .find(|(_, endpoint)| endpoint.id == id)
            .map(|(path, _)| path)
    }

    /// Every descendant with its dotted path, depth first in document order.
    pub fn walk(&self) -> Walk<'_> {
        let mut stack: Vec<(String, &Endpoint)> = Vec::with_capacity(self.children.len());
        stack.extend(self.children.iter().rev().map(|c| (c.name.clone(), c)));
        Walk { stack }
    }

    /// Number of descendants.
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|c| 1 + c.descendant_count())
            .sum()
    }

    /// Serialize this endpoint's members as an interface document.
    pub fn to_document(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.children)?)
    }

    fn fmt_members(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        for child in &self.children {
            writeln!(
                f,
                "{:indent$}{} (id={}, type={}, access={})",
                "",
                child.name,
                child.id,
                child.declared_type,
                child.access,
                indent = depth * 2
            )?;
            child.fmt_members(f, depth + 1)?;
        }
        Ok(())
    }
}

impl Index<&str> for Endpoint {
    type Output = Endpoint;

    /// Direct child by name.
    ///
    /// # Panics
    ///
    /// Panics if there is no child with that name.
    fn index(&self, name: &str) -> &Endpoint {
        match self.child(name) {
            Some(child) => child,
            None => panic!("no endpoint named {:?} under {:?}", name, self.name),
        }
    }
}

impl fmt::Display for Endpoint {
    /// One line per descendant, indented by depth.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_members(f, 0)
    }
}

/// Depth-first iterator over a tree, see [`Endpoint::walk`].
pub struct Walk<'a> {
    stack: Vec<(String, &'a Endpoint)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (String, &'a Endpoint);

    fn next(&mut self) -> Option<Self::Item> {
        let (path, endpoint) = self.stack.pop()?;
        self.stack.extend(
            endpoint
                .children
                .iter()
                .rev()
                .map(|c| (format!("{}.{}", path, c.name), c)),
        );
        Some((path, endpoint))
    }
}
