//! Regenerates the vendor grid stylesheet from the grid config.

use plinth_transform::GridGenerator;

use super::{Profile, TaskContext, TaskError, TaskOutcome};

pub fn run(ctx: &TaskContext, _profile: Profile) -> Result<TaskOutcome, TaskError> {
    let generator = GridGenerator::new(ctx.config.css.preprocessor);
    let target = generator
        .generate(ctx.paths.grid_config(), ctx.paths.vendor_dir())
        .map_err(|source| TaskError::Transform { task: "grid", source })?;

    tracing::info!("Generated {}", target.display());
    Ok(TaskOutcome::Completed { files: 1 })
}
