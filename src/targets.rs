use anyhow::{Context as _, Result};
use serde_json::{Map, Value};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

const TARGETS_KEY: &str = "targets";
const ENV_KEY: &str = "env";

/// The shared target-config document.
///
/// Held as a raw `serde_json::Value` on purpose: the document belongs to
/// someone else, and everything outside `targets[X].env` must come back out
/// exactly as it went in (the preserve_order feature keeps foreign key
/// order intact across a rewrite).
#[derive(Debug, Clone, PartialEq)]
pub struct TargetDocument {
    root: Value,
}

impl TargetDocument {
    pub fn new(root: Value) -> Option<Self> {
        root.is_object().then_some(Self { root })
    }

    pub fn as_value(&self) -> &Value {
        &self.root
    }

    /// A missing file is a normal empty state; anything else that stops the
    /// document from loading is a warning, not an error.
    pub fn load(path: &Path) -> (Option<Self>, Option<String>) {
        if !path.exists() {
            return (None, None);
        }

        let text = match fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) => {
                return (
                    None,
                    Some(format!("WARNING: failed to read {}: {e}", path.display())),
                );
            }
        };

        match serde_json::from_str::<Value>(&text) {
            Ok(root) => match Self::new(root) {
                Some(doc) => (Some(doc), None),
                None => (
                    None,
                    Some(format!("WARNING: {} is not a JSON object", path.display())),
                ),
            },
            Err(e) => (
                None,
                Some(format!("WARNING: failed to parse {}: {e}", path.display())),
            ),
        }
    }

    /// Whether the document carries a `targets` map at all (it may be
    /// empty; a spec pointing into an empty map fails per entry instead).
    pub fn has_targets(&self) -> bool {
        self.targets().is_some()
    }

    pub fn contains_target(&self, name: &str) -> bool {
        self.targets().map(|t| t.contains_key(name)).unwrap_or(false)
    }

    /// Read back `targets[target].env[var]`, mainly for assertions.
    pub fn env_var(&self, target: &str, var: &str) -> Option<&str> {
        self.targets()?.get(target)?.get(ENV_KEY)?.get(var)?.as_str()
    }

    /// Set `targets[target].env[var] = value`, creating the env map if it
    /// does not exist yet. Returns false when the target is absent or not a
    /// record; the entry is never created on the caller's behalf.
    pub fn set_env_var(&mut self, target: &str, var: &str, value: &str) -> bool {
        let Some(record) = self
            .targets_mut()
            .and_then(|t| t.get_mut(target))
            .and_then(Value::as_object_mut)
        else {
            return false;
        };

        let env = record
            .entry(ENV_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        if !env.is_object() {
            // The env slot is the one place this tool owns; reclaim it.
            *env = Value::Object(Map::new());
        }

        if let Some(env) = env.as_object_mut() {
            env.insert(var.to_string(), Value::String(value.to_string()));
        }
        true
    }

    /// Delete `targets[target].env[var]`. When that empties the env map,
    /// the map itself goes too, so a full cycle leaves no residue. Shift
    /// semantics keep surviving keys in their original order.
    pub fn remove_env_var(&mut self, target: &str, var: &str) -> bool {
        let Some(record) = self
            .targets_mut()
            .and_then(|t| t.get_mut(target))
            .and_then(Value::as_object_mut)
        else {
            return false;
        };

        let Some(env) = record.get_mut(ENV_KEY).and_then(Value::as_object_mut) else {
            return false;
        };

        if env.shift_remove(var).is_none() {
            return false;
        }

        if env.is_empty() {
            record.shift_remove(ENV_KEY);
        }
        true
    }

    /// Serialize with stable 2-space indentation and write atomically: temp
    /// file in the same directory, then rename over the destination.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut text = serde_json::to_string_pretty(&self.root)
            .with_context(|| format!("failed to serialize {}", path.display()))?;
        text.push('\n');

        write_atomic(path, &text)?;
        debug!("saved {}", path.display());
        Ok(())
    }

    fn targets(&self) -> Option<&Map<String, Value>> {
        self.root.get(TARGETS_KEY).and_then(Value::as_object)
    }

    fn targets_mut(&mut self) -> Option<&mut Map<String, Value>> {
        self.root.get_mut(TARGETS_KEY).and_then(Value::as_object_mut)
    }
}

fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)
        .with_context(|| format!("failed to create directory {}", parent.display()))?;

    let file_name = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "perigee".to_string());
    let tmp = parent.join(format!(".{}.tmp.{}", file_name, std::process::id()));

    fs::write(&tmp, content).with_context(|| format!("failed to write {}", tmp.display()))?;

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("failed to replace {}", path.display()));
    }
    Ok(())
}
