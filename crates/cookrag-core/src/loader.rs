//! Offline document loaders for the import tooling.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::types::{Document, Metadata};

/// One recipe as stored in the corpus JSON file.
#[derive(Debug, Clone, Deserialize)]
pub struct Recipe {
    pub name: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub cuisine: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Loads the recipe JSON corpus and formats each recipe into one
/// retrievable document.
pub struct RecipeLoader {
    path: PathBuf,
}

impl RecipeLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<Vec<Document>> {
        info!("loading recipes from {}", self.path.display());
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let recipes: Vec<Recipe> = serde_json::from_str(&raw)
            .with_context(|| format!("failed to decode {}", self.path.display()))?;

        let docs = recipes
            .iter()
            .enumerate()
            .map(|(i, recipe)| {
                let content = format!(
                    "菜名：{}\n\n食材：\n{}\n\n步骤：\n{}",
                    recipe.name,
                    recipe.ingredients.join("\n"),
                    recipe.steps.join("\n"),
                );
                let mut metadata = Metadata::new();
                metadata.insert("name".into(), recipe.name.clone().into());
                metadata.insert("category".into(), recipe.category.clone().into());
                metadata.insert("cuisine".into(), recipe.cuisine.clone().into());
                metadata.insert("tags".into(), recipe.tags.clone().into());
                metadata.insert("ingredients".into(), recipe.ingredients.clone().into());
                metadata.insert("type".into(), "recipe".into());
                Document {
                    id: format!("recipe_{i}"),
                    content,
                    metadata,
                    score: 0.0,
                }
            })
            .collect::<Vec<_>>();

        info!("loaded {} recipes", docs.len());
        Ok(docs)
    }
}

/// Walks a directory and loads every file with a matching extension as
/// one document. An empty extension list accepts everything.
pub struct TextLoader {
    directory: PathBuf,
    extensions: Vec<String>,
}

impl TextLoader {
    pub fn new(directory: impl Into<PathBuf>, extensions: &[&str]) -> Self {
        Self {
            directory: directory.into(),
            extensions: extensions.iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    pub fn load(&self) -> Result<Vec<Document>> {
        info!("loading text files from {}", self.directory.display());
        let mut docs = Vec::new();

        for entry in walkdir::WalkDir::new(&self.directory)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            if !self.matches_ext(path) {
                continue;
            }
            let content = match std::fs::read_to_string(path) {
                Ok(content) => content,
                Err(err) => {
                    warn!("failed to read {}: {err}", path.display());
                    continue;
                }
            };
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            let mut metadata = Metadata::new();
            metadata.insert("source".into(), path.to_string_lossy().to_string().into());
            metadata.insert("size".into(), size.into());
            docs.push(Document {
                id: format!("doc_{}", docs.len()),
                content,
                metadata,
                score: 0.0,
            });
        }

        info!("loaded {} text files", docs.len());
        Ok(docs)
    }

    fn matches_ext(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|want| want == &e.to_lowercase()))
            .unwrap_or(false)
    }
}
