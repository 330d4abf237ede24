//! Image task.

use plinth_transform::images::OptimizeImage;

use super::{Profile, TaskContext, TaskError, TaskOutcome};
use crate::paths::AssetKind;
use crate::stream::Chain;

pub fn run(ctx: &TaskContext, _profile: Profile) -> Result<TaskOutcome, TaskError> {
    let chain = Chain::new()
        .pipe(OptimizeImage::with_jpeg_quality(ctx.config.images.jpeg_quality))
        .dest(ctx.paths.output(AssetKind::Images));

    ctx.stream_parallel(AssetKind::Images, &chain)
}
