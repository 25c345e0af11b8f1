//! Tool registry: names of the drawing tools whose annotations participate in interpolation.
//!
//! Registration is monotonic; there is no removal.

/// Ordered set of registered tool names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolRegistry {
    tools: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from configured names, skipping duplicates.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self::new();
        for name in names {
            registry.register(name);
        }
        registry
    }

    /// Register a tool name. Returns false when it was already present.
    pub fn register(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.tools.push(name);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t == name)
    }

    pub fn names(&self) -> &[String] {
        &self.tools
    }

    /// Registered names, restricted to `requested` when given.
    ///
    /// Requested names that were never registered are dropped.
    pub fn select(&self, requested: Option<&[String]>) -> Vec<String> {
        match requested {
            Some(requested) => self
                .tools
                .iter()
                .filter(|t| requested.contains(*t))
                .cloned()
                .collect(),
            None => self.tools.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
