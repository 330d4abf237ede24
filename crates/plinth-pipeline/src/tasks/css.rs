//! Style task.
//!
//! Release chain: compile, prefix, beautify, merge media queries, purge
//! against the page markup, inline a source map, write the full sheet to
//! the css and chunk directories, then minify, strip comments and write a
//! `.min.css` copy. The dev chain only compiles and writes.

use plinth_transform::css::{
    Autoprefix, Beautify, GroupMediaQueries, InlineSourceMap, Minify, Preprocess, Purge,
    StripComments,
};

use super::{Profile, TaskContext, TaskError, TaskOutcome};
use crate::paths::AssetKind;
use crate::stream::Chain;

pub const ERROR_TITLE: &str = "CSS Error";

pub fn run(ctx: &TaskContext, profile: Profile) -> Result<TaskOutcome, TaskError> {
    let css = &ctx.config.css;
    let paths = &ctx.paths;
    let output = paths.output(AssetKind::Css);
    let preprocess = Preprocess::new(css.preprocessor, &paths.source(AssetKind::Css).base);

    let chain = match profile {
        Profile::Dev => Chain::new().pipe(preprocess).dest(output),
        Profile::Release => {
            let purge = Purge::from_files(&paths.content_files())
                .map_err(|source| TaskError::Transform { task: "css", source })?;
            Chain::new()
                .pipe(preprocess)
                .pipe(Autoprefix::new(&css.browsers))
                .pipe(Beautify)
                .pipe(GroupMediaQueries)
                .pipe(purge)
                .pipe(InlineSourceMap)
                .dest(output)
                .dest(paths.css_chunk_dir())
                .pipe(Minify::new(&css.browsers))
                .pipe(StripComments)
                .rename(".min", "css")
                .dest(output)
        }
    };

    ctx.stream(AssetKind::Css, &chain, Some(ERROR_TITLE))
}
