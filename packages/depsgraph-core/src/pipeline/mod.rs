//! Pipeline orchestration: build roots into a [`Depsgraph`]

pub mod builder_pipeline;
pub mod depsgraph;
pub mod view_layers;

pub use builder_pipeline::{
    run, CompositorPipeline, FromIdsPipeline, PipelineSteps, RenderPipeline, ViewLayerPipeline,
};
pub use depsgraph::Depsgraph;
pub use view_layers::build_all_view_layers;
