//! Registry of known tools.
//!
//! Each entry pairs a [`ToolDefinition`] with a [`ToolPlugin`], the small
//! capability table the executor needs: how to build the check and fix
//! commands, how to parse the output, and how to tabulate the issues.
//! The registry is built once, then only read.

use crate::error::{Error, Result};
use crate::formatters::TableDescriptor;
use crate::models::tool::{normalize_tool_id, ToolDefinition, ToolOptions};
use crate::parsers::ParseFn;
use std::fmt;
use tracing::debug;

/// Builds a command vector (program first) from the effective options.
pub type CommandFn = fn(&ToolOptions) -> Vec<String>;

#[derive(Clone, Copy)]
pub struct ToolPlugin {
    pub parse: ParseFn,
    pub table: &'static dyn TableDescriptor,
    pub check_command: CommandFn,
    /// `None` for tools that cannot fix.
    pub fix_command: Option<CommandFn>,
}

impl fmt::Debug for ToolPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolPlugin")
            .field("columns", &self.table.columns())
            .field("can_fix", &self.fix_command.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct ToolEntry {
    pub definition: ToolDefinition,
    pub plugin: ToolPlugin,
    /// Registration order, used as the scheduling tie-breaker.
    pub order: usize,
}

impl ToolEntry {
    pub fn name(&self) -> &str {
        &self.definition.name
    }
}

#[derive(Debug, Default)]
pub struct ToolRegistry {
    entries: Vec<ToolEntry>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool; its name must not collide with a registered one.
    pub fn register(&mut self, definition: ToolDefinition, plugin: ToolPlugin) -> Result<()> {
        let id = normalize_tool_id(&definition.name);
        if self.position(&id).is_some() {
            return Err(Error::DuplicateTool(definition.name));
        }
        debug!(tool = %definition.name, "registered");
        let order = self.entries.len();
        self.entries.push(ToolEntry {
            definition,
            plugin,
            order,
        });
        Ok(())
    }

    fn position(&self, normalized: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| normalize_tool_id(e.name()) == normalized)
    }

    /// Look up a tool; case and `-`/`_` are not significant.
    pub fn get(&self, id: &str) -> Result<&ToolEntry> {
        self.position(&normalize_tool_id(id))
            .map(|i| &self.entries[i])
            .ok_or_else(|| Error::UnknownTool(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(&normalize_tool_id(id)).is_some()
    }

    /// Entries in registration order.
    pub fn all(&self) -> &[ToolEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
