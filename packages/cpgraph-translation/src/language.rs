//! Language descriptors, the registry, and the name-keyed catalog.
//!
//! A [`Language`] describes one source language: display name, file
//! extensions, namespace separator, built-in types, the frontend factory,
//! and the pass metadata its frontend declares (extra passes to register
//! and per-language pass replacements).

use crate::frontend::LanguageFrontend;
use rustc_hash::FxHashMap;
use std::path::Path;
use std::sync::Arc;

pub type FrontendFactory = Arc<dyn Fn() -> Box<dyn LanguageFrontend> + Send + Sync>;

/// A frontend-declared replacement: when this language is registered,
/// `old` is swapped for `replacement` in the pass set and every dependency
/// naming `old` is rewritten onto `replacement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacePassRule {
    pub old: String,
    pub replacement: String,
}

#[derive(Clone)]
pub struct Language {
    pub name: String,
    /// Matched as file-name suffixes; entries may span dots ("h.in").
    pub extensions: Vec<String>,
    pub namespace_separator: String,
    pub builtin_types: Vec<String>,
    /// Unity-capable languages may have their units merged per component.
    pub supports_unity_build: bool,
    /// Pass names this language's frontend wants registered on top of the
    /// default set.
    pub extra_passes: Vec<String>,
    pub replaced_passes: Vec<ReplacePassRule>,
    frontend: FrontendFactory,
}

impl Language {
    pub fn new(
        name: impl Into<String>,
        extensions: impl IntoIterator<Item = impl Into<String>>,
        frontend: FrontendFactory,
    ) -> Self {
        Self {
            name: name.into(),
            extensions: extensions.into_iter().map(Into::into).collect(),
            namespace_separator: ".".to_string(),
            builtin_types: Vec::new(),
            supports_unity_build: false,
            extra_passes: Vec::new(),
            replaced_passes: Vec::new(),
            frontend,
        }
    }

    pub fn with_namespace_separator(mut self, sep: impl Into<String>) -> Self {
        self.namespace_separator = sep.into();
        self
    }

    pub fn with_builtin_types(
        mut self,
        types: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.builtin_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn unity_capable(mut self) -> Self {
        self.supports_unity_build = true;
        self
    }

    pub fn with_extra_pass(mut self, pass: impl Into<String>) -> Self {
        self.extra_passes.push(pass.into());
        self
    }

    pub fn with_replaced_pass(
        mut self,
        old: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        self.replaced_passes.push(ReplacePassRule {
            old: old.into(),
            replacement: replacement.into(),
        });
        self
    }

    pub fn new_frontend(&self) -> Box<dyn LanguageFrontend> {
        (self.frontend)()
    }

    /// Length of the longest extension matching `path`, if any.
    fn match_len(&self, path: &Path) -> Option<usize> {
        let file_name = path.file_name()?.to_str()?.to_lowercase();
        self.extensions
            .iter()
            .filter(|ext| {
                file_name.len() > ext.len() + 1
                    && file_name.ends_with(&ext.to_lowercase())
                    && file_name.as_bytes()[file_name.len() - ext.len() - 1] == b'.'
            })
            .map(|ext| ext.len())
            .max()
    }
}

impl std::fmt::Debug for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Language")
            .field("name", &self.name)
            .field("extensions", &self.extensions)
            .field("unity", &self.supports_unity_build)
            .finish()
    }
}

/// Ordered language registry. On extension conflicts the longest match
/// wins; among equal lengths the later-registered language wins.
#[derive(Debug, Clone, Default)]
pub struct LanguageRegistry {
    languages: Vec<Language>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, language: Language) {
        self.languages.push(language);
    }

    /// Removes every registered instance of the named language.
    pub fn unregister(&mut self, name: &str) {
        self.languages.retain(|l| l.name != name);
    }

    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }

    /// Frontend selection for one file: longest matching extension, later
    /// registration breaking ties. `max_by_key` keeps the last maximal
    /// element, which in registration order is the newest.
    pub fn language_for_file(&self, path: &Path) -> Option<&Language> {
        self.languages
            .iter()
            .filter_map(|l| l.match_len(path).map(|len| (len, l)))
            .max_by_key(|(len, _)| *len)
            .map(|(_, l)| l)
    }
}

/// String-keyed factory catalog, the static port of registration by class
/// name: factories are installed at program start and instantiated through
/// a no-argument closure.
#[derive(Clone, Default)]
pub struct LanguageCatalog {
    factories: FxHashMap<String, Arc<dyn Fn() -> Language + Send + Sync>>,
}

impl LanguageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn() -> Language + Send + Sync + 'static,
    ) {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Optional lookup; unknown names yield `None` instead of failing.
    pub fn lookup(&self, name: &str) -> Option<Language> {
        self.factories.get(name).map(|f| f())
    }
}

impl std::fmt::Debug for LanguageCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageCatalog")
            .field("names", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
