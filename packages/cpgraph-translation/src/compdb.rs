//! Compilation database: optional input mapping C/C++-family sources to
//! their include directives and macro definitions. Consumed by
//! unity-capable frontends through the configuration; the core never
//! interprets the entries itself.

use crate::error::{Result, TranslationError};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompilationEntry {
    pub file: PathBuf,
    #[serde(default)]
    pub include_paths: Vec<PathBuf>,
    #[serde(default)]
    pub defines: FxHashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct CompilationDatabase {
    entries: FxHashMap<PathBuf, CompilationEntry>,
}

impl CompilationDatabase {
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<CompilationEntry> = serde_json::from_str(json)
            .map_err(|e| TranslationError::config(format!("invalid compilation database: {e}")))?;
        Ok(Self {
            entries: entries.into_iter().map(|e| (e.file.clone(), e)).collect(),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn entry(&self, file: &Path) -> Option<&CompilationEntry> {
        self.entries.get(file)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
