//! Font task.

use plinth_transform::fonts::Woff2;
use plinth_transform::ExternalCommand;

use super::{Profile, TaskContext, TaskError, TaskOutcome};
use crate::paths::AssetKind;
use crate::stream::Chain;

pub fn run(ctx: &TaskContext, _profile: Profile) -> Result<TaskOutcome, TaskError> {
    let converter = ExternalCommand::from_argv(&ctx.config.fonts.converter);
    let chain = Chain::new()
        .pipe(Woff2::new(converter))
        .dest(ctx.paths.output(AssetKind::Fonts));

    ctx.stream_parallel(AssetKind::Fonts, &chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::fixture::Project;

    #[test]
    fn copies_web_fonts() {
        let project = Project::new();
        project.write("src/assets/fonts/inter/inter.woff2", "wOF2");
        project.write("src/assets/fonts/inter/inter.ttf", "ttf");

        let outcome = run(&project.context(), Profile::Release).unwrap();

        assert_eq!(outcome, TaskOutcome::Completed { files: 2 });
        assert_eq!(project.read("dist/assets/fonts/inter/inter.woff2"), "wOF2");
        assert!(project.exists("dist/assets/fonts/inter/inter.ttf"));
    }

    #[test]
    fn no_fonts_writes_nothing() {
        let project = Project::new();

        run(&project.context(), Profile::Release).unwrap();

        assert!(!project.exists("dist/assets/fonts"));
    }
}
