//! Static, read-only catalogs of scripted prompts and scoring rubrics
//!
//! Both catalogs ship with built-in content and can be replaced wholesale by
//! a YAML file named in `Settings::catalogs`.

mod rubrics;
mod topics;

pub use rubrics::{OutputContract, RubricCatalog, RubricSpec, TRANSCRIPT_PLACEHOLDER};
pub use topics::{PromptSpec, Topic, TopicCatalog};

use crate::settings::CatalogPaths;
use crate::ConfigError;

/// Load both catalogs, falling back to the built-in content for unset paths
pub fn load_catalogs(paths: &CatalogPaths) -> Result<(TopicCatalog, RubricCatalog), ConfigError> {
    let topics = match &paths.topics_path {
        Some(path) => {
            tracing::info!(path = %path, "Loading topic catalog");
            TopicCatalog::load(path)?
        }
        None => TopicCatalog::builtin(),
    };

    let rubrics = match &paths.rubrics_path {
        Some(path) => {
            tracing::info!(path = %path, "Loading rubric catalog");
            RubricCatalog::load(path)?
        }
        None => RubricCatalog::builtin(),
    };

    Ok((topics, rubrics))
}
