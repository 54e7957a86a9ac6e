use bytes::Bytes;
use fs_err as fs;
use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tempfile::NamedTempFile;

use crate::errors::BrewError;
use crate::wire::Recipe;

/// Turns the displayed recipe region into a binary artifact.
pub trait RegionRenderer {
    fn extension(&self) -> &'static str;
    fn render_region_to_image(&self, recipe: &Recipe) -> Result<Bytes, BrewError>;
}

/// Framed plain-text recipe card.
pub struct TextCardRenderer {
    pub width: usize,
}

impl Default for TextCardRenderer {
    fn default() -> Self {
        Self { width: 56 }
    }
}

impl RegionRenderer for TextCardRenderer {
    fn extension(&self) -> &'static str {
        "txt"
    }

    fn render_region_to_image(&self, recipe: &Recipe) -> Result<Bytes, BrewError> {
        let rule = "━".repeat(self.width);
        let mut out = String::new();
        out.push_str(&format!("┏{rule}┓\n"));
        out.push_str(&format!("  {}\n", recipe.name.to_uppercase()));
        if !recipe.description.is_empty() {
            out.push_str(&format!("  {}\n", recipe.description));
        }
        out.push_str("\n  Ingredients\n");
        for item in &recipe.ingredients {
            out.push_str(&format!("   • {item}\n"));
        }
        out.push_str("\n  Method\n");
        for (i, step) in recipe.instructions.iter().enumerate() {
            out.push_str(&format!("   {}. {step}\n", i + 1));
        }
        out.push_str(&format!("┗{rule}┛\n"));
        Ok(Bytes::from(out))
    }
}

fn separator_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s/\\]+").expect("static pattern"))
}

/// Lowercased recipe name with whitespace runs turned into `-`.
pub fn file_stem(name: &str) -> String {
    let stem = separator_runs().replace_all(name.trim(), "-").to_lowercase();
    let stem = stem.trim_matches('-');
    if stem.is_empty() {
        "recipe".to_string()
    } else {
        stem.to_string()
    }
}

pub fn export_recipe(renderer: &dyn RegionRenderer, recipe: &Recipe, dir: &Path) -> Result<PathBuf, BrewError> {
    let image = renderer.render_region_to_image(recipe)?;
    let path = dir.join(format!("{}.{}", file_stem(&recipe.name), renderer.extension()));

    let io = |e: std::io::Error| BrewError::Export(e.to_string());
    fs::create_dir_all(dir).map_err(io)?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(io)?;
    tmp.write_all(&image).map_err(io)?;
    tmp.persist(&path).map_err(|e| io(e.error))?;

    tracing::info!(path = %path.display(), bytes = image.len(), "recipe exported");
    Ok(path)
}
