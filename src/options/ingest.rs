use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Loading", inline)]
#[serde(default)]
/// Mesh ingestion parameters.
pub struct IngestOptions {
    /// Emit a parse-progress message every this many scanned lines.
    #[schemars(skip)]
    pub progress_line_interval: usize,
    /// Emit a parse-progress message every this many resolved triangles.
    #[schemars(skip)]
    pub progress_group_interval: usize,
    /// Lines (or triangles) processed per cooperative step.
    #[schemars(skip)]
    pub step_budget: usize,
    /// Center the model on its centroid and rescale it on load.
    #[schemars(title = "Normalize Model")]
    pub normalize: bool,
    /// Largest absolute coordinate after normalization.
    #[schemars(title = "Normalized Extent", range(min = 0.5, max = 10.0), extend("step" = 0.5))]
    pub normalize_extent: f32,
    /// Look for a texture next to the model when none is given.
    #[schemars(title = "Find Texture")]
    pub auto_texture: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            progress_line_interval: 100_000,
            progress_group_interval: 100_000,
            step_budget: 50_000,
            normalize: true,
            normalize_extent: 2.0,
            auto_texture: true,
        }
    }
}
