//! Per-page critical style extraction over the built site.

use std::fs;
use std::path::{Path, PathBuf};

use plinth_transform::CriticalExtractor;
use rayon::prelude::*;

use super::{Profile, TaskContext, TaskError, TaskOutcome};
use crate::paths::AssetKind;

pub fn run(ctx: &TaskContext, _profile: Profile) -> Result<TaskOutcome, TaskError> {
    let critical = &ctx.config.critical;
    let css_dir = ctx.paths.output(AssetKind::Css);
    let stylesheet = css_dir.join(&critical.stylesheet);
    let css = read(&stylesheet)?;

    // Every page is joined; the first failure wins.
    let written = critical
        .pages
        .par_iter()
        .map(|page| extract_page(ctx, page, &css, &stylesheet))
        .collect::<Result<Vec<PathBuf>, TaskError>>()?;

    for path in &written {
        tracing::debug!("Wrote {}", path.display());
    }
    Ok(TaskOutcome::Completed {
        files: written.len(),
    })
}

fn extract_page(ctx: &TaskContext, page: &str, css: &str, css_path: &Path) -> Result<PathBuf, TaskError> {
    let html = read(&ctx.paths.output(AssetKind::Html).join(format!("{}.html", page)))?;
    let options = ctx.config.critical.options_for(page)?;

    let extracted = CriticalExtractor::new(options)
        .extract(&html, css, css_path)
        .map_err(|source| TaskError::Transform {
            task: "critical",
            source,
        })?;

    let target = ctx
        .paths
        .output(AssetKind::Css)
        .join(format!("{}-critical.css", page));
    fs::write(&target, extracted).map_err(|source| TaskError::Io {
        action: "write",
        path: target.clone(),
        source,
    })?;
    Ok(target)
}

fn read(path: &Path) -> Result<String, TaskError> {
    fs::read_to_string(path).map_err(|source| TaskError::Io {
        action: "read",
        path: path.to_path_buf(),
        source,
    })
}
