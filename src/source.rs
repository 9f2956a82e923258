use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::warn;

use crate::records::EntityKind;

/// Supplies already-retrieved detail pages. A missing page is `None`, never an error.
pub trait DocumentSource: Sync {
    fn detail_document(&self, kind: EntityKind, slug: &str) -> Option<String>;
}

/// Detail pages saved as `<dir>/<slug>.html`.
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectorySource { dir: dir.into() }
    }

    fn path_for(&self, slug: &str) -> Option<PathBuf> {
        // Slugs come from page markup; keep lookups inside the directory.
        if slug.is_empty() || slug.contains(['/', '\\']) || slug.starts_with('.') {
            return None;
        }
        Some(self.dir.join(format!("{}.html", slug)))
    }
}

impl DocumentSource for DirectorySource {
    fn detail_document(&self, kind: EntityKind, slug: &str) -> Option<String> {
        let Some(path) = self.path_for(slug) else {
            warn!("Refusing to look up {} detail page for slug {:?}", kind, slug);
            return None;
        };
        match std::fs::read_to_string(&path) {
            Ok(html) => Some(html),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// In-memory pages keyed by slug.
impl DocumentSource for HashMap<String, String> {
    fn detail_document(&self, _kind: EntityKind, slug: &str) -> Option<String> {
        self.get(slug).cloned()
    }
}
