//! Scenario registry: discovery, validation, and lookup by name.

use crate::error::{EngineError, EngineResult};
use crate::scenario::builtin;
use crate::scenario::definition::Scenario;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// In-memory index of validated scenarios, keyed by name.
///
/// The registry is populated before any session exists and read-only
/// afterwards, so sessions can hold cheap `Arc` references without locking.
///
/// Loading is fail-closed: one bad file aborts the whole load. A partially
/// populated registry would silently change which scenarios a demo can
/// reach, which is worse than an upfront error for a reproducibility tool.
#[derive(Debug, Default)]
pub struct ScenarioRegistry {
    scenarios: BTreeMap<String, Arc<Scenario>>,
}

impl ScenarioRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the scenarios compiled into the engine.
    pub fn with_builtins() -> EngineResult<Self> {
        let mut registry = Self::new();
        for (origin, source) in builtin::BUILTIN_SCENARIOS {
            let scenario = Scenario::parse(source, origin)?;
            registry.insert(scenario)?;
        }
        Ok(registry)
    }

    /// Load every `*.yaml` / `*.yml` file in `dir`, in path order.
    ///
    /// Returns the number of scenarios added. Any unreadable, unparseable,
    /// or invalid file fails the entire call and leaves the registry
    /// untouched.
    pub fn load_from_dir(&mut self, dir: &Path) -> EngineResult<usize> {
        let entries = std::fs::read_dir(dir).map_err(|e| EngineError::Read {
            path: dir.display().to_string(),
            message: e.to_string(),
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| EngineError::Read {
                path: dir.display().to_string(),
                message: e.to_string(),
            })?;
            let path = entry.path();
            let is_yaml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
                .unwrap_or(false);
            if path.is_file() && is_yaml {
                paths.push(path);
            }
        }
        // Deterministic regardless of filesystem iteration order.
        paths.sort();

        // Parse and validate everything before touching the index, so a
        // failure cannot leave a half-loaded registry behind.
        let mut loaded = Vec::with_capacity(paths.len());
        for path in &paths {
            let source = std::fs::read_to_string(path).map_err(|e| EngineError::Read {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            let scenario = Scenario::parse(&source, &path.display().to_string())?;
            if self.scenarios.contains_key(&scenario.name)
                || loaded
                    .iter()
                    .any(|s: &Scenario| s.name == scenario.name)
            {
                return Err(EngineError::validation(
                    &scenario.name,
                    "name",
                    format!("duplicate scenario name (from {})", path.display()),
                ));
            }
            loaded.push(scenario);
        }

        let count = loaded.len();
        for scenario in loaded {
            self.scenarios
                .insert(scenario.name.clone(), Arc::new(scenario));
        }
        info!(dir = %dir.display(), count, "loaded scenarios");
        Ok(count)
    }

    /// Add one already-built scenario. Rejects duplicates.
    pub fn insert(&mut self, scenario: Scenario) -> EngineResult<()> {
        scenario.validate()?;
        if self.scenarios.contains_key(&scenario.name) {
            return Err(EngineError::validation(
                &scenario.name,
                "name",
                "duplicate scenario name",
            ));
        }
        self.scenarios
            .insert(scenario.name.clone(), Arc::new(scenario));
        Ok(())
    }

    /// Look up a scenario by name.
    pub fn get(&self, name: &str) -> EngineResult<Arc<Scenario>> {
        self.scenarios
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(name.to_string()))
    }

    /// All scenario names, sorted.
    pub fn list(&self) -> Vec<String> {
        self.scenarios.keys().cloned().collect()
    }

    /// Name -> description, sorted by name.
    pub fn list_with_descriptions(&self) -> BTreeMap<String, String> {
        self.scenarios
            .iter()
            .map(|(name, scenario)| (name.clone(), scenario.description.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    const GOOD: &str = r#"
name: calm
description: Quiet baseline
signals:
  hr:
    baseline: 64
    rate: 1/s
    unit: bpm
"#;

    const GOOD2: &str = r#"
name: active
description: Elevated baseline
signals:
  hr:
    baseline: 110
    rate: 1/s
    unit: bpm
"#;

    #[test]
    fn test_load_and_get() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "calm.yaml", GOOD);
        write(dir.path(), "active.yml", GOOD2);
        write(dir.path(), "notes.txt", "not a scenario");

        let mut registry = ScenarioRegistry::new();
        let count = registry.load_from_dir(dir.path()).unwrap();
        assert_eq!(count, 2);
        assert_eq!(registry.list(), vec!["active", "calm"]);

        let calm = registry.get("calm").unwrap();
        assert_eq!(calm.description, "Quiet baseline");

        let described = registry.list_with_descriptions();
        assert_eq!(described["active"], "Elevated baseline");
    }

    #[test]
    fn test_get_unknown_is_not_found() {
        let registry = ScenarioRegistry::new();
        let err = registry.get("nope").unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[test]
    fn test_one_bad_file_fails_whole_load() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "calm.yaml", GOOD);
        write(
            dir.path(),
            "broken.yaml",
            r#"
name: broken
signals:
  hr:
    baseline: 70
    rate: -1
"#,
        );

        let mut registry = ScenarioRegistry::new();
        let err = registry.load_from_dir(dir.path()).unwrap_err();
        assert!(err.is_validation());
        // Fail-closed: nothing from this load landed.
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_scenario_name_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.yaml", GOOD);
        write(dir.path(), "b.yaml", GOOD);

        let mut registry = ScenarioRegistry::new();
        let err = registry.load_from_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
        assert!(err.to_string().contains("calm"));
    }

    #[test]
    fn test_missing_dir_is_read_error() {
        let mut registry = ScenarioRegistry::new();
        let err = registry
            .load_from_dir(Path::new("/nonexistent/scenarios"))
            .unwrap_err();
        assert!(matches!(err, EngineError::Read { .. }));
    }

    #[test]
    fn test_insert_duplicate_rejected() {
        let mut registry = ScenarioRegistry::new();
        let scenario = Scenario::parse(GOOD, "calm.yaml").unwrap();
        registry.insert(scenario.clone()).unwrap();
        assert!(registry.insert(scenario).is_err());
    }

    #[test]
    fn test_builtins_load_cleanly() {
        let registry = ScenarioRegistry::with_builtins().unwrap();
        assert!(!registry.is_empty());
        for name in registry.list() {
            let scenario = registry.get(&name).unwrap();
            assert!(scenario.validate().is_ok());
            assert!(!scenario.description.is_empty());
        }
    }
}
