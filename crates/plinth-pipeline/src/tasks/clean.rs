//! Removes the dist root.

use std::fs;
use std::io::ErrorKind;

use super::{Profile, TaskContext, TaskError, TaskOutcome};

pub fn run(ctx: &TaskContext, _profile: Profile) -> Result<TaskOutcome, TaskError> {
    let dist = ctx.paths.dist();

    match fs::remove_dir_all(dist) {
        Ok(()) => {
            tracing::debug!("Removed {}", dist.display());
            Ok(TaskOutcome::Completed { files: 1 })
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(TaskOutcome::Completed { files: 0 }),
        Err(source) => Err(TaskError::Io {
            action: "remove",
            path: dist.to_path_buf(),
            source,
        }),
    }
}
