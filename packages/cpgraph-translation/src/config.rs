//! Translation configuration: immutable once built.
//!
//! Construction goes through [`TranslationConfigurationBuilder`], which
//! accumulates pass registrations, replacement rules, languages, include
//! lists and flags. `build()` resolves the pass list in a fixed order:
//! frontend-declared extra passes (only on top of the default set), then
//! per-language replacements, then the scheduler, then everything freezes.

use crate::compdb::CompilationDatabase;
use crate::error::{Result, TranslationError};
use crate::language::{Language, LanguageCatalog, LanguageRegistry};
use crate::pass::{Pass, PassCatalog, PassRegistration};
use crate::passes;
use crate::schedule::schedule;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Controls which missing declarations the symbol resolver fabricates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferenceConfiguration {
    pub infer_records: bool,
    pub infer_functions: bool,
    pub infer_variables: bool,
    pub infer_return_types: bool,
}

impl Default for InferenceConfiguration {
    fn default() -> Self {
        Self {
            infer_records: true,
            infer_functions: true,
            infer_variables: true,
            infer_return_types: true,
        }
    }
}

impl InferenceConfiguration {
    pub fn disabled() -> Self {
        Self {
            infer_records: false,
            infer_functions: false,
            infer_variables: false,
            infer_return_types: false,
        }
    }
}

/// One named source grouping; components are analyzed in insertion order.
#[derive(Debug, Clone)]
pub struct SoftwareComponent {
    pub name: String,
    pub paths: Vec<PathBuf>,
}

/// Default component name for sources added without an explicit component.
pub const DEFAULT_COMPONENT: &str = "application";

pub struct TranslationConfiguration {
    /// Symbol (macro) substitutions handed to frontends.
    pub symbols: FxHashMap<String, String>,
    pub software_components: Vec<SoftwareComponent>,
    pub top_level: Option<PathBuf>,
    pub include_paths: Vec<PathBuf>,
    pub include_whitelist: Vec<PathBuf>,
    pub include_blocklist: Vec<PathBuf>,
    pub load_includes: bool,
    pub languages: LanguageRegistry,
    pub compilation_database: Option<CompilationDatabase>,
    pub inference: InferenceConfiguration,
    /// Worker pool size for parallel frontends.
    pub parallel_workers: usize,

    pub debug_parser: bool,
    pub fail_on_error: bool,
    pub code_in_nodes: bool,
    pub process_annotations: bool,
    pub use_unity_build: bool,
    pub use_parallel_frontends: bool,
    pub use_parallel_passes: bool,
    pub match_comments_to_nodes: bool,
    pub add_includes_to_graph: bool,
    pub disable_cleanup: bool,

    pass_groups: Vec<Vec<Arc<dyn Pass>>>,
    pass_configs: FxHashMap<String, serde_json::Value>,
}

impl TranslationConfiguration {
    pub fn builder() -> TranslationConfigurationBuilder {
        TranslationConfigurationBuilder::new()
    }

    /// The scheduled pass groups, in execution order.
    pub fn pass_groups(&self) -> &[Vec<Arc<dyn Pass>>] {
        &self.pass_groups
    }

    pub fn pass_config(&self, pass: &str) -> Option<&serde_json::Value> {
        self.pass_configs.get(pass)
    }

    /// Include filter applied to expanded file lists: a non-empty
    /// whitelist admits only files under its paths, the blocklist rejects
    /// afterwards.
    pub fn include_allowed(&self, path: &Path) -> bool {
        if !self.include_whitelist.is_empty()
            && !self.include_whitelist.iter().any(|p| path.starts_with(p))
        {
            return false;
        }
        !self.include_blocklist.iter().any(|p| path.starts_with(p))
    }
}

impl std::fmt::Debug for TranslationConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationConfiguration")
            .field("components", &self.software_components.len())
            .field("languages", &self.languages.languages().len())
            .field("pass_groups", &self.pass_groups.len())
            .field("use_parallel_frontends", &self.use_parallel_frontends)
            .field("use_parallel_passes", &self.use_parallel_passes)
            .finish()
    }
}

pub struct TranslationConfigurationBuilder {
    symbols: FxHashMap<String, String>,
    software_components: Vec<SoftwareComponent>,
    top_level: Option<PathBuf>,
    include_paths: Vec<PathBuf>,
    include_whitelist: Vec<PathBuf>,
    include_blocklist: Vec<PathBuf>,
    load_includes: bool,
    languages: LanguageRegistry,
    language_catalog: LanguageCatalog,
    pending_languages: Vec<(String, bool)>,
    compilation_database: Option<CompilationDatabase>,
    inference: InferenceConfiguration,
    parallel_workers: usize,

    pass_catalog: PassCatalog,
    registered_passes: Vec<&'static str>,
    replacements: Vec<(String, String)>,
    pass_configs: FxHashMap<String, serde_json::Value>,
    seeded_default_passes: bool,

    debug_parser: bool,
    fail_on_error: bool,
    code_in_nodes: bool,
    process_annotations: bool,
    use_unity_build: bool,
    use_parallel_frontends: bool,
    use_parallel_passes: bool,
    match_comments_to_nodes: bool,
    add_includes_to_graph: bool,
    disable_cleanup: bool,
}

impl TranslationConfigurationBuilder {
    pub fn new() -> Self {
        Self {
            symbols: FxHashMap::default(),
            software_components: Vec::new(),
            top_level: None,
            include_paths: Vec::new(),
            include_whitelist: Vec::new(),
            include_blocklist: Vec::new(),
            load_includes: false,
            languages: LanguageRegistry::new(),
            language_catalog: LanguageCatalog::new(),
            pending_languages: Vec::new(),
            compilation_database: None,
            inference: InferenceConfiguration::default(),
            // 75% of cores, like the rest of the pipeline tooling.
            parallel_workers: (num_cpus::get() * 3 / 4).max(1),
            pass_catalog: PassCatalog::builtin(),
            registered_passes: Vec::new(),
            replacements: Vec::new(),
            pass_configs: FxHashMap::default(),
            seeded_default_passes: false,
            debug_parser: false,
            fail_on_error: false,
            code_in_nodes: true,
            process_annotations: false,
            use_unity_build: false,
            use_parallel_frontends: false,
            use_parallel_passes: false,
            match_comments_to_nodes: false,
            add_includes_to_graph: false,
            disable_cleanup: false,
        }
    }

    // ─── sources ─────────────────────────────────────────────────────────

    /// Adds sources to the default component.
    pub fn source_locations(self, paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.software_component(DEFAULT_COMPONENT, paths)
    }

    /// Adds sources under a named component, preserving insertion order.
    pub fn software_component(
        mut self,
        name: impl Into<String>,
        paths: impl IntoIterator<Item = impl Into<PathBuf>>,
    ) -> Self {
        let name = name.into();
        let paths: Vec<PathBuf> = paths.into_iter().map(Into::into).collect();
        if let Some(existing) = self
            .software_components
            .iter_mut()
            .find(|c| c.name == name)
        {
            existing.paths.extend(paths);
        } else {
            self.software_components.push(SoftwareComponent { name, paths });
        }
        self
    }

    pub fn top_level(mut self, dir: impl Into<PathBuf>) -> Self {
        self.top_level = Some(dir.into());
        self
    }

    // ─── includes ────────────────────────────────────────────────────────

    pub fn include_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.include_paths.push(path.into());
        self
    }

    pub fn include_whitelist(mut self, path: impl Into<PathBuf>) -> Self {
        self.include_whitelist.push(path.into());
        self
    }

    pub fn include_blocklist(mut self, path: impl Into<PathBuf>) -> Self {
        self.include_blocklist.push(path.into());
        self
    }

    pub fn load_includes(mut self, value: bool) -> Self {
        self.load_includes = value;
        self
    }

    // ─── symbols and externals ───────────────────────────────────────────

    pub fn symbols(mut self, symbols: impl IntoIterator<Item = (String, String)>) -> Self {
        self.symbols.extend(symbols);
        self
    }

    pub fn compilation_database(mut self, db: CompilationDatabase) -> Self {
        self.compilation_database = Some(db);
        self
    }

    pub fn inference(mut self, inference: InferenceConfiguration) -> Self {
        self.inference = inference;
        self
    }

    /// Overrides the parallel-frontend worker pool size.
    pub fn parallel_workers(mut self, workers: usize) -> Self {
        self.parallel_workers = workers.max(1);
        self
    }

    // ─── languages ───────────────────────────────────────────────────────

    pub fn register_language(mut self, language: Language) -> Self {
        self.languages.register(language);
        self
    }

    /// Removes every previously registered instance of the named language.
    pub fn unregister_language(mut self, name: &str) -> Self {
        self.languages.unregister(name);
        self.pending_languages.retain(|(pending, _)| pending != name);
        self
    }

    /// Catalog consulted when registering languages by name.
    pub fn language_catalog(mut self, catalog: LanguageCatalog) -> Self {
        self.language_catalog = catalog;
        self
    }

    /// Registers a language through the catalog; unknown names fail
    /// `build()` with a configuration error.
    pub fn register_language_by_name(mut self, name: impl Into<String>) -> Self {
        self.pending_languages.push((name.into(), false));
        self
    }

    /// Like [`Self::register_language_by_name`] but unknown names are
    /// skipped silently.
    pub fn register_language_by_name_optional(mut self, name: impl Into<String>) -> Self {
        self.pending_languages.push((name.into(), true));
        self
    }

    // ─── passes ──────────────────────────────────────────────────────────

    /// Seeds the canonical default pass sequence. Order of execution comes
    /// from each pass's metadata, not from this list.
    pub fn default_passes(mut self) -> Self {
        self.seeded_default_passes = true;
        for &name in passes::DEFAULT_PASS_NAMES {
            if !self.registered_passes.contains(&name) {
                self.registered_passes.push(name);
            }
        }
        self
    }

    /// Registers a pass already known to the catalog.
    pub fn register_pass(mut self, name: &'static str) -> Self {
        if !self.registered_passes.contains(&name) {
            self.registered_passes.push(name);
        }
        self
    }

    /// Registers a custom pass, adding it to the catalog as well.
    pub fn register_pass_with(mut self, registration: PassRegistration) -> Self {
        let name = registration.name();
        self.pass_catalog.register(registration);
        if !self.registered_passes.contains(&name) {
            self.registered_passes.push(name);
        }
        self
    }

    /// Adds a pass to the catalog without scheduling it. Used for
    /// replacement targets and passes that only enter the schedule as a
    /// hard dependency or frontend-declared extra.
    pub fn catalog_pass(mut self, registration: PassRegistration) -> Self {
        self.pass_catalog.register(registration);
        self
    }

    /// Swaps `old` for `replacement` in the schedule; dependencies naming
    /// `old` are rewritten onto `replacement`.
    pub fn replace_pass(mut self, old: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.replacements.push((old.into(), replacement.into()));
        self
    }

    /// Attaches opaque configuration handed to the named pass at run time.
    pub fn configure_pass(mut self, name: impl Into<String>, config: serde_json::Value) -> Self {
        self.pass_configs.insert(name.into(), config);
        self
    }

    // ─── flags ───────────────────────────────────────────────────────────

    pub fn debug_parser(mut self, value: bool) -> Self {
        self.debug_parser = value;
        self
    }

    pub fn fail_on_error(mut self, value: bool) -> Self {
        self.fail_on_error = value;
        self
    }

    pub fn code_in_nodes(mut self, value: bool) -> Self {
        self.code_in_nodes = value;
        self
    }

    pub fn process_annotations(mut self, value: bool) -> Self {
        self.process_annotations = value;
        self
    }

    pub fn use_unity_build(mut self, value: bool) -> Self {
        self.use_unity_build = value;
        self
    }

    pub fn use_parallel_frontends(mut self, value: bool) -> Self {
        self.use_parallel_frontends = value;
        self
    }

    pub fn use_parallel_passes(mut self, value: bool) -> Self {
        self.use_parallel_passes = value;
        self
    }

    pub fn match_comments_to_nodes(mut self, value: bool) -> Self {
        self.match_comments_to_nodes = value;
        self
    }

    pub fn add_includes_to_graph(mut self, value: bool) -> Self {
        self.add_includes_to_graph = value;
        self
    }

    pub fn disable_cleanup(mut self, value: bool) -> Self {
        self.disable_cleanup = value;
        self
    }

    // ─── build ───────────────────────────────────────────────────────────

    pub fn build(mut self) -> Result<TranslationConfiguration> {
        // Resolve languages registered by name.
        for (name, optional) in std::mem::take(&mut self.pending_languages) {
            match self.language_catalog.lookup(&name) {
                Some(language) => self.languages.register(language),
                None if optional => {
                    debug!(language = %name, "optional language not in catalog, skipping");
                }
                None => {
                    return Err(TranslationError::config(format!(
                        "language '{name}' is not in the catalog"
                    )));
                }
            }
        }

        // Step 1: frontend-declared extra passes, only on top of the
        // default set so bespoke pipelines stay untouched.
        if self.seeded_default_passes {
            for language in self.languages.languages() {
                for pass in &language.extra_passes {
                    let registration = self.pass_catalog.lookup(pass).ok_or_else(|| {
                        TranslationError::config(format!(
                            "language '{}' declares unknown extra pass '{}'",
                            language.name, pass
                        ))
                    })?;
                    let name = registration.name();
                    if !self.registered_passes.contains(&name) {
                        self.registered_passes.push(name);
                    }
                }
            }
        }

        // Step 2: replacement rules, language-declared then builder-level.
        let mut renames: FxHashMap<&'static str, &'static str> = FxHashMap::default();
        let language_rules: Vec<(String, String)> = self
            .languages
            .languages()
            .iter()
            .flat_map(|l| {
                l.replaced_passes
                    .iter()
                    .map(|r| (r.old.clone(), r.replacement.clone()))
            })
            .collect();
        for (old, replacement) in language_rules.into_iter().chain(self.replacements.drain(..)) {
            let old = self
                .pass_catalog
                .lookup(&old)
                .ok_or_else(|| {
                    TranslationError::config(format!("replaced pass '{old}' is unknown"))
                })?
                .name();
            let replacement = self
                .pass_catalog
                .lookup(&replacement)
                .ok_or_else(|| {
                    TranslationError::config(format!("replacement pass '{replacement}' is unknown"))
                })?
                .name();
            renames.insert(old, replacement);
        }

        // Step 3: the scheduler produces the grouped ordering.
        let groups = schedule(&self.registered_passes, &renames, &self.pass_catalog)?;
        let pass_groups: Vec<Vec<Arc<dyn Pass>>> = groups
            .iter()
            .map(|group| {
                group
                    .iter()
                    .map(|name| {
                        self.pass_catalog
                            .lookup(name)
                            .expect("scheduled pass is in the catalog")
                            .instantiate()
                    })
                    .collect()
            })
            .collect();

        // Step 4: freeze.
        Ok(TranslationConfiguration {
            symbols: self.symbols,
            software_components: self.software_components,
            top_level: self.top_level,
            include_paths: self.include_paths,
            include_whitelist: self.include_whitelist,
            include_blocklist: self.include_blocklist,
            load_includes: self.load_includes,
            languages: self.languages,
            compilation_database: self.compilation_database,
            inference: self.inference,
            parallel_workers: self.parallel_workers,
            debug_parser: self.debug_parser,
            fail_on_error: self.fail_on_error,
            code_in_nodes: self.code_in_nodes,
            process_annotations: self.process_annotations,
            use_unity_build: self.use_unity_build,
            use_parallel_frontends: self.use_parallel_frontends,
            use_parallel_passes: self.use_parallel_passes,
            match_comments_to_nodes: self.match_comments_to_nodes,
            add_includes_to_graph: self.add_includes_to_graph,
            disable_cleanup: self.disable_cleanup,
            pass_groups,
            pass_configs: self.pass_configs,
        })
    }
}

impl Default for TranslationConfigurationBuilder {
    fn default() -> Self {
        Self::new()
    }
}
