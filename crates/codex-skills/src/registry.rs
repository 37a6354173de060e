use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use codex_core::{CodexError, Result};

use crate::definition::SkillDefinition;

/// Discovers the `SKILL.md` files under the codex's skills directory.
pub struct SkillRegistry {
    skills: BTreeMap<String, SkillDefinition>,
    skills_dir: PathBuf,
}

impl SkillRegistry {
    pub fn new(skills_dir: &Path) -> Self {
        Self {
            skills: BTreeMap::new(),
            skills_dir: skills_dir.to_path_buf(),
        }
    }

    /// Load every `<skills_dir>/<name>/SKILL.md`. Unparseable skills are
    /// logged and skipped; the first definition of a name wins.
    pub fn discover(&mut self) -> Result<Vec<String>> {
        let mut loaded = Vec::new();
        if !self.skills_dir.exists() {
            debug!(dir = ?self.skills_dir, "skills directory does not exist, skipping");
            return Ok(loaded);
        }

        let mut dirs: Vec<PathBuf> = std::fs::read_dir(&self.skills_dir)
            .map_err(|e| {
                CodexError::Skill(format!(
                    "failed to read skills dir {}: {}",
                    self.skills_dir.display(),
                    e
                ))
            })?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_dir())
            .collect();
        dirs.sort();

        for dir in dirs {
            let skill_md = dir.join("SKILL.md");
            if !skill_md.exists() {
                continue;
            }
            match SkillDefinition::from_file(&skill_md) {
                Ok(def) => {
                    if self.skills.contains_key(&def.name) {
                        debug!(skill = %def.name, path = ?skill_md, "duplicate skill name, skipping");
                        continue;
                    }
                    info!(skill = %def.name, phases = def.phases.len(), "loaded skill");
                    loaded.push(def.name.clone());
                    self.skills.insert(def.name.clone(), def);
                }
                Err(e) => warn!(path = ?skill_md, error = %e, "failed to load skill"),
            }
        }
        Ok(loaded)
    }

    pub fn get(&self, name: &str) -> Option<&SkillDefinition> {
        self.skills.get(name)
    }

    /// All skills, sorted by name.
    pub fn list(&self) -> Vec<&SkillDefinition> {
        self.skills.values().collect()
    }

    pub fn count(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}
