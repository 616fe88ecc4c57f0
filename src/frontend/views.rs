//! HTML templates loaded once at startup
//!
//! Every `*.html` file in the views directory is registered under its file
//! stem (`views/index.html` → `index`). Templates are rendered as-is.

use std::collections::HashMap;
use std::path::Path;

use crate::common::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct Views {
    templates: HashMap<String, String>,
}

impl Views {
    /// Load every `*.html` file directly under `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let entries = std::fs::read_dir(dir).map_err(|e| {
            Error::Template(format!("cannot read views directory {}: {}", dir.display(), e))
        })?;

        let mut templates = HashMap::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("html") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let body = std::fs::read_to_string(&path)?;
            tracing::debug!(template = name, path = %path.display(), "Loaded template");
            templates.insert(name.to_string(), body);
        }

        if templates.is_empty() {
            return Err(Error::Template(format!(
                "no *.html templates in {}",
                dir.display()
            )));
        }
        Ok(Self { templates })
    }

    pub fn from_templates<I, K, V>(templates: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            templates: templates
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn render(&self, name: &str) -> Result<&str> {
        self.templates
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| Error::Template(format!("template {:?} is not defined", name)))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_registers_by_stem() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>hi</h1>").unwrap();
        std::fs::write(dir.path().join("about.html"), "<p>about</p>").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let views = Views::load(dir.path()).unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views.render("index").unwrap(), "<h1>hi</h1>");
        assert!(matches!(views.render("notes"), Err(Error::Template(_))));
    }

    #[test]
    fn test_missing_or_empty_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(Views::load(dir.path()), Err(Error::Template(_))));
        assert!(matches!(
            Views::load(&dir.path().join("nope")),
            Err(Error::Template(_))
        ));
    }

    #[test]
    fn test_bundled_views() {
        let views = Views::load(Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/views"))).unwrap();
        assert!(views.render("index").unwrap().contains("<html"));
    }
}
