//! Page task: templates, comment stripping, minification.

use plinth_transform::html::{MinifyHtml, StripHtmlComments, Template};

use super::{Profile, TaskContext, TaskError, TaskOutcome};
use crate::notify::Notification;
use crate::paths::AssetKind;
use crate::stream::Chain;

pub const ERROR_TITLE: &str = "HTML Error";

pub fn run(ctx: &TaskContext, _profile: Profile) -> Result<TaskOutcome, TaskError> {
    // Layouts, partials and data are reloaded on every run.
    let template = match Template::load(ctx.paths.template_dirs()) {
        Ok(template) => template,
        Err(e) => {
            ctx.notifier.notify(&Notification::new(ERROR_TITLE, e.to_string()));
            return Ok(TaskOutcome::Recovered);
        }
    };

    let chain = Chain::new()
        .pipe(template)
        .pipe(StripHtmlComments)
        .pipe(MinifyHtml)
        .dest(ctx.paths.output(AssetKind::Html));

    ctx.stream(AssetKind::Html, &chain, Some(ERROR_TITLE))
}
