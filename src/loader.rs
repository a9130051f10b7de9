//! Fixture loading.
//!
//! Walks the fixture root directory once at startup. Immediate
//! subdirectories are stories; each regular file inside is one fixture.
//! Any failure aborts the whole load: fixtures are build-time
//! configuration, the server must not start with a partial set.

use crate::fixture::{parse_fixture, FixtureParseError, FixtureRecord};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Errors produced while loading the fixture tree.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid fixture {story}/{file}: {source}")]
    Fixture {
        story: String,
        file: String,
        #[source]
        source: FixtureParseError,
    },
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> LoadError + '_ {
    move |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Load every fixture under `root`.
///
/// Stories and files are visited in sorted name order so load order, and
/// therefore ranking tie-breaks, is deterministic across restarts.
pub async fn load_fixtures(root: &Path) -> Result<Vec<FixtureRecord>, LoadError> {
    let mut stories = Vec::new();
    let mut entries = tokio::fs::read_dir(root).await.map_err(io_err(root))?;
    while let Some(entry) = entries.next_entry().await.map_err(io_err(root))? {
        let file_type = entry.file_type().await.map_err(io_err(&entry.path()))?;
        if file_type.is_dir() {
            stories.push(entry.path());
        }
    }
    stories.sort();

    let mut fixtures = Vec::new();
    for story_dir in &stories {
        let story = story_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(story_dir)
            .await
            .map_err(io_err(story_dir))?;
        while let Some(entry) = entries.next_entry().await.map_err(io_err(story_dir))? {
            let file_type = entry.file_type().await.map_err(io_err(&entry.path()))?;
            if file_type.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();

        for path in files {
            let file = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let content = tokio::fs::read_to_string(&path).await.map_err(io_err(&path))?;
            let record =
                parse_fixture(&story, &file, &content).map_err(|source| LoadError::Fixture {
                    story: story.clone(),
                    file: file.clone(),
                    source,
                })?;
            info!(story = %story, file = %file, "loaded fixture");
            fixtures.push(record);
        }
    }

    Ok(fixtures)
}
