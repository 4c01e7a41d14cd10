// meshkiln-scene/src/source.rs
//! Importer interface for producing scenes from files on disk

use std::path::Path;

use thiserror::Error;

use crate::scene::Scene;

/// Errors that can occur while importing a scene
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed scene file: {message}")]
    Malformed { message: String },

    #[error("Unsupported scene feature: {message}")]
    Unsupported { message: String },

    #[error("No importer recognizes {path}")]
    Unrecognized { path: std::path::PathBuf },
}

/// Result type alias for import operations
pub type ImportResult<T> = Result<T, ImportError>;

/// A producer of scenes from files on disk
///
/// Implementors parse one on-disk format into the in-memory scene
/// model. The export pipeline never reads input files itself;
/// everything reaches it through this trait.
pub trait SceneSource {
    /// Returns a human-readable name for this importer
    fn name(&self) -> &str;

    /// Returns the lower-case file extensions this importer handles
    fn extensions(&self) -> &[&str];

    /// Load a scene from a file
    fn load(&self, path: &Path) -> ImportResult<Scene>;

    /// Check if this importer can handle the given file
    fn can_load(&self, path: &Path) -> bool {
        if let Some(ext) = path.extension() {
            let ext_str = ext.to_string_lossy().to_lowercase();
            self.extensions().iter().any(|e| *e == ext_str)
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::SceneNode;

    struct FakeSource;

    impl SceneSource for FakeSource {
        fn name(&self) -> &str {
            "fake"
        }

        fn extensions(&self) -> &[&str] {
            &["fake", "fk"]
        }

        fn load(&self, _path: &Path) -> ImportResult<Scene> {
            Ok(Scene::new(SceneNode::new("root")))
        }
    }

    #[test]
    fn test_can_load_matches_extensions_case_insensitively() {
        let source = FakeSource;
        assert!(source.can_load(Path::new("model.fake")));
        assert!(source.can_load(Path::new("model.FAKE")));
        assert!(source.can_load(Path::new("dir/model.fk")));
        assert!(!source.can_load(Path::new("model.gltf")));
        assert!(!source.can_load(Path::new("noextension")));
    }
}
