//! Batch conversion driver
//!
//! Walks the requested inputs, loads each scene through the configured
//! source and exports the matching artifact next to the input or into
//! a chosen output directory. One bad file never aborts the run: every
//! failure is logged, counted and skipped past.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{debug, error, info};

use meshkiln_core::{ArtifactKind, Error};
use meshkiln_export::{export_scene, ExportStats};
use meshkiln_scene::SceneSource;

/// Settings for one conversion run
#[derive(Debug, Clone, Default)]
pub struct ExportConfig {
    /// Directory artifacts land in; `None` keeps them beside the input
    pub out_dir: Option<PathBuf>,
    /// Forced artifact kind; `None` classifies per scene
    pub kind: Option<ArtifactKind>,
    /// Extensions accepted when scanning directories; empty defers to
    /// the scene source
    pub extensions: Vec<String>,
}

/// Tally of one conversion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Scenes converted successfully
    pub converted: usize,
    /// Scenes that failed to load or export
    pub failed: usize,
    /// Directory entries passed over by the extension filter
    pub skipped: usize,
    /// Drop counters folded across all conversions
    pub stats: ExportStats,
}

impl RunSummary {
    fn record(&mut self, outcome: Result<ExportStats>) {
        match outcome {
            Ok(stats) => {
                self.converted += 1;
                self.stats.absorb(stats);
            }
            Err(error) => {
                error!("{error:#}");
                self.failed += 1;
            }
        }
    }
}

/// Convert every input file and scan every input directory
///
/// Files named directly are converted regardless of extension; the
/// extension filter only applies while scanning directories.
pub fn run(
    config: &ExportConfig,
    source: &dyn SceneSource,
    inputs: &[PathBuf],
) -> Result<RunSummary> {
    if let Some(out_dir) = &config.out_dir {
        fs::create_dir_all(out_dir)
            .with_context(|| format!("creating output directory {}", out_dir.display()))?;
    }

    let mut summary = RunSummary::default();
    for input in inputs {
        if input.is_dir() {
            let mut files = Vec::new();
            collect_files(input, &mut files)?;
            for file in files {
                if !accepts(config, source, &file) {
                    debug!(path = %file.display(), "extension not accepted, skipped");
                    summary.skipped += 1;
                    continue;
                }
                summary.record(convert_file(config, source, &file));
            }
        } else if input.is_file() {
            summary.record(convert_file(config, source, input));
        } else {
            bail!("input {} does not exist", input.display());
        }
    }
    Ok(summary)
}

/// Load one scene and export it as the configured or classified kind
fn convert_file(
    config: &ExportConfig,
    source: &dyn SceneSource,
    path: &Path,
) -> Result<ExportStats> {
    let scene = source
        .load(path)
        .with_context(|| format!("loading {}", path.display()))?;

    let kind = match config.kind {
        Some(kind) => kind,
        None => scene
            .classify()
            .ok_or(Error::EmptyScene)
            .with_context(|| format!("classifying {}", path.display()))?,
    };

    let destination = destination_path(config, path, kind);
    let stats = export_scene(&scene, kind, &destination)
        .with_context(|| format!("exporting {}", destination.display()))?;

    info!(
        input = %path.display(),
        output = %destination.display(),
        kind = %kind,
        "converted scene"
    );
    Ok(stats)
}

/// Collect files under a directory, depth first in sorted order
fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("reading directory {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<_>>()?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            collect_files(&path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}

/// Check a scanned file against the configured or source extensions
fn accepts(config: &ExportConfig, source: &dyn SceneSource, path: &Path) -> bool {
    if config.extensions.is_empty() {
        return source.can_load(path);
    }
    let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    config
        .extensions
        .iter()
        .any(|chosen| chosen.eq_ignore_ascii_case(extension))
}

/// Resolve where an input's artifact should be written
fn destination_path(config: &ExportConfig, input: &Path, kind: ArtifactKind) -> PathBuf {
    match &config.out_dir {
        Some(dir) => {
            let name = input
                .file_name()
                .map_or_else(|| OsString::from("scene"), ToOwned::to_owned);
            dir.join(name).with_extension(kind.extension())
        }
        None => input.with_extension(kind.extension()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshkiln_scene::{ImportError, ImportResult, Scene};

    struct GlbOnly;

    impl SceneSource for GlbOnly {
        fn name(&self) -> &str {
            "glb-only"
        }

        fn extensions(&self) -> &[&str] {
            &["glb"]
        }

        fn load(&self, path: &Path) -> ImportResult<Scene> {
            Err(ImportError::Unrecognized {
                path: path.to_path_buf(),
            })
        }
    }

    #[test]
    fn test_destination_swaps_extension_in_place() {
        let config = ExportConfig::default();
        let destination = destination_path(
            &config,
            Path::new("assets/tank.gltf"),
            ArtifactKind::StaticMesh,
        );
        assert_eq!(destination, Path::new("assets/tank.mesh"));
    }

    #[test]
    fn test_destination_honors_out_dir() {
        let config = ExportConfig {
            out_dir: Some(PathBuf::from("/tmp/out")),
            ..ExportConfig::default()
        };
        let destination = destination_path(
            &config,
            Path::new("assets/tank.gltf"),
            ArtifactKind::RiggedMesh,
        );
        assert_eq!(destination, Path::new("/tmp/out/tank.skin"));
    }

    #[test]
    fn test_accepts_follows_source_then_overrides() {
        let mut config = ExportConfig::default();
        let source = GlbOnly;

        assert!(accepts(&config, &source, Path::new("a.glb")));
        assert!(accepts(&config, &source, Path::new("a.GLB")));
        assert!(!accepts(&config, &source, Path::new("a.fbx")));

        config.extensions = vec!["fbx".to_string()];
        assert!(accepts(&config, &source, Path::new("a.fbx")));
        assert!(!accepts(&config, &source, Path::new("a.glb")));
    }
}
