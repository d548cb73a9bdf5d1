//! One independent depsgraph per view layer

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::debug;

use crate::config::BuildConfig;
use crate::errors::{DepsgraphError, Result};
use crate::features::scene_db::SceneDatabase;
use crate::pipeline::{Depsgraph, ViewLayerPipeline};
use crate::shared::models::EntityId;

/// Build a depsgraph for every view layer of `scene`, in view layer order
///
/// The graphs share nothing but the read-only database, so with the
/// `parallel` feature and `config.parallel.view_layers` they are built on
/// the rayon pool. The first error wins.
pub fn build_all_view_layers(
    db: &dyn SceneDatabase,
    scene: EntityId,
    config: &BuildConfig,
) -> Result<Vec<Depsgraph>> {
    let scene_data = db.scene(scene).ok_or(DepsgraphError::NotAScene(scene))?;
    let names: Vec<&str> = scene_data
        .view_layers
        .iter()
        .map(|layer| layer.name.as_str())
        .collect();
    debug!(scene = %scene, view_layers = names.len(), "building all view layers");

    let build = |name: &&str| ViewLayerPipeline::new(db, scene, name, config).build();

    #[cfg(feature = "parallel")]
    if config.parallel.view_layers {
        return names.par_iter().map(build).collect();
    }

    names.iter().map(build).collect()
}
