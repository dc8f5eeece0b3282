//! Ordered, uniquely keyed storage for tools, prompts, and resources.

use std::collections::HashMap;

use crate::prompts::PromptEntry;
use crate::resources::ResourceEntry;
use crate::tools::ToolEntry;
use crate::types::{
    McpError, McpResult, PromptDefinition, ResourceDefinition, ToolDefinition,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Tool,
    Prompt,
    Resource,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Tool => "tool",
            EntryKind::Prompt => "prompt",
            EntryKind::Resource => "resource",
        }
    }

    fn not_found(&self, key: &str) -> McpError {
        match self {
            EntryKind::Tool => McpError::ToolNotFound(key.to_string()),
            EntryKind::Prompt => McpError::PromptNotFound(key.to_string()),
            EntryKind::Resource => McpError::ResourceNotFound(key.to_string()),
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A borrowed registry entry of any kind.
#[derive(Debug, Clone, Copy)]
pub enum Entry<'a> {
    Tool(&'a ToolEntry),
    Prompt(&'a PromptEntry),
    Resource(&'a ResourceEntry),
}

impl Entry<'_> {
    pub fn kind(&self) -> EntryKind {
        match self {
            Entry::Tool(_) => EntryKind::Tool,
            Entry::Prompt(_) => EntryKind::Prompt,
            Entry::Resource(_) => EntryKind::Resource,
        }
    }

    /// Name for tools and prompts, URI for resources.
    pub fn key(&self) -> &str {
        match self {
            Entry::Tool(t) => t.name(),
            Entry::Prompt(p) => p.name(),
            Entry::Resource(r) => r.uri(),
        }
    }
}

struct Keyed<T> {
    entries: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Default for Keyed<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> Keyed<T> {
    fn insert(&mut self, key: &str, entry: T) -> bool {
        if self.index.contains_key(key) {
            return false;
        }
        self.index.insert(key.to_string(), self.entries.len());
        self.entries.push(entry);
        true
    }

    fn get(&self, key: &str) -> Option<&T> {
        self.index.get(key).map(|&i| &self.entries[i])
    }
}

/// Handler entries for all three kinds, in registration order.
#[derive(Default)]
pub struct Registry {
    tools: Keyed<ToolEntry>,
    prompts: Keyed<PromptEntry>,
    resources: Keyed<ResourceEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_tool(&mut self, entry: ToolEntry) -> McpResult<()> {
        let name = entry.name().to_string();
        if !self.tools.insert(&name, entry) {
            return Err(duplicate(EntryKind::Tool, name));
        }
        tracing::debug!("Registered tool '{name}'");
        Ok(())
    }

    pub fn register_prompt(&mut self, entry: PromptEntry) -> McpResult<()> {
        let name = entry.name().to_string();
        if !self.prompts.insert(&name, entry) {
            return Err(duplicate(EntryKind::Prompt, name));
        }
        tracing::debug!("Registered prompt '{name}'");
        Ok(())
    }

    pub fn register_resource(&mut self, entry: ResourceEntry) -> McpResult<()> {
        let uri = entry.uri().to_string();
        if !self.resources.insert(&uri, entry) {
            return Err(duplicate(EntryKind::Resource, uri));
        }
        tracing::debug!("Registered resource '{uri}'");
        Ok(())
    }

    pub fn tools(&self) -> &[ToolEntry] {
        &self.tools.entries
    }

    pub fn prompts(&self) -> &[PromptEntry] {
        &self.prompts.entries
    }

    pub fn resources(&self) -> &[ResourceEntry] {
        &self.resources.entries
    }

    pub fn tool(&self, name: &str) -> McpResult<&ToolEntry> {
        self.tools
            .get(name)
            .ok_or_else(|| EntryKind::Tool.not_found(name))
    }

    pub fn prompt(&self, name: &str) -> McpResult<&PromptEntry> {
        self.prompts
            .get(name)
            .ok_or_else(|| EntryKind::Prompt.not_found(name))
    }

    pub fn resource(&self, uri: &str) -> McpResult<&ResourceEntry> {
        self.resources
            .get(uri)
            .ok_or_else(|| EntryKind::Resource.not_found(uri))
    }

    /// All entries of one kind, in registration order.
    pub fn list(&self, kind: EntryKind) -> Vec<Entry<'_>> {
        match kind {
            EntryKind::Tool => self.tools().iter().map(Entry::Tool).collect(),
            EntryKind::Prompt => self.prompts().iter().map(Entry::Prompt).collect(),
            EntryKind::Resource => self.resources().iter().map(Entry::Resource).collect(),
        }
    }

    pub fn lookup(&self, kind: EntryKind, key: &str) -> McpResult<Entry<'_>> {
        match kind {
            EntryKind::Tool => self.tool(key).map(Entry::Tool),
            EntryKind::Prompt => self.prompt(key).map(Entry::Prompt),
            EntryKind::Resource => self.resource(key).map(Entry::Resource),
        }
    }

    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        self.tools().iter().map(ToolEntry::definition).collect()
    }

    pub fn list_prompts(&self) -> Vec<PromptDefinition> {
        self.prompts().iter().map(PromptEntry::definition).collect()
    }

    pub fn list_resources(&self) -> Vec<ResourceDefinition> {
        self.resources()
            .iter()
            .map(ResourceEntry::definition)
            .collect()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("tools", &self.tools.entries.len())
            .field("prompts", &self.prompts.entries.len())
            .field("resources", &self.resources.entries.len())
            .finish()
    }
}

fn duplicate(kind: EntryKind, name: String) -> McpError {
    tracing::warn!("Duplicate {kind} registration: {name}");
    McpError::DuplicateName {
        kind: kind.as_str(),
        name,
    }
}
