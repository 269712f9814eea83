use crate::template::StructureTemplate;
use anyhow::{anyhow, Context, Result};
use itertools::Itertools;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Templates loaded from a directory of `.nbt` files, each read once and shared after that.
pub struct StructureCache {
    base_path: PathBuf,
    structures: HashMap<String, Arc<StructureTemplate>>,
}

fn file_name(name: &str) -> String {
    if name.ends_with(".nbt") {
        name.to_owned()
    } else {
        format!("{}.nbt", name)
    }
}

impl StructureCache {
    pub fn new(base_path: &Path) -> Self {
        Self {
            base_path: base_path.to_owned(),
            structures: HashMap::new(),
        }
    }

    /// Load every named template up front. Fails on the first one that can't be read.
    pub fn preload<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) -> Result<()> {
        let loaded: Vec<(String, Arc<StructureTemplate>)> = names
            .into_iter()
            .map(file_name)
            .unique()
            .filter(|name| !self.structures.contains_key(name))
            .map(|name| -> Result<_> {
                let template = self
                    .read(&name)
                    .with_context(|| anyhow!("Failed to preload {}", name))?;
                Ok((name, template))
            })
            .try_collect()?;
        self.structures.extend(loaded);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<StructureTemplate>> {
        self.structures.get(&file_name(name)).cloned()
    }

    pub fn get_or_load(&mut self, name: &str) -> Result<Arc<StructureTemplate>> {
        let name = file_name(name);
        if let Some(t) = self.structures.get(&name) {
            return Ok(t.clone());
        }
        let template = self.read(&name)?;
        self.structures.insert(name, template.clone());
        Ok(template)
    }

    /// Make an in-memory template available under `name`, e.g. a freshly captured one
    pub fn insert(&mut self, name: &str, template: StructureTemplate) -> Arc<StructureTemplate> {
        let template = Arc::new(template);
        self.structures.insert(file_name(name), template.clone());
        template
    }

    pub fn len(&self) -> usize {
        self.structures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }

    fn read(&self, name: &str) -> Result<Arc<StructureTemplate>> {
        let path = self.base_path.join(name);
        log::debug!("Loading structure {:?}", path);
        Ok(Arc::new(StructureTemplate::from_file(&path)?))
    }
}
