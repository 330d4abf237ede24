//! Script task.

use plinth_transform::js::{Bundle, MinifyJs, ParseJs};
use plinth_transform::ExternalCommand;

use super::{Profile, TaskContext, TaskError, TaskOutcome};
use crate::paths::AssetKind;
use crate::stream::Chain;

pub const ERROR_TITLE: &str = "JS Error";

pub fn run(ctx: &TaskContext, profile: Profile) -> Result<TaskOutcome, TaskError> {
    let source = ctx.paths.source(AssetKind::Js);

    let chain = match ExternalCommand::from_argv(&ctx.config.js.bundler) {
        Some(bundler) => Chain::new().pipe(Bundle::new(bundler, &source.base)),
        None => Chain::new().pipe(ParseJs),
    };
    let chain = match profile {
        Profile::Release => chain.pipe(MinifyJs),
        Profile::Dev => chain,
    };
    let chain = chain.dest(ctx.paths.output(AssetKind::Js));

    ctx.stream(AssetKind::Js, &chain, Some(ERROR_TITLE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::fixture::Project;

    #[test]
    fn minifies_entry_scripts_only() {
        let project = Project::new();
        project.write(
            "src/assets/js/main.js",
            "function greet(name) {\n  return 'hi ' + name;\n}\nconsole.log(greet('you'));\n",
        );
        project.write("src/assets/js/lib/util.js", "export const x = 1;\n");

        let outcome = run(&project.context(), Profile::Release).unwrap();
        let js = project.read("dist/assets/js/main.js");

        assert_eq!(outcome, TaskOutcome::Completed { files: 1 });
        assert!(js.contains("console.log"));
        assert!(js.len() < 70, "{}", js);
        assert!(!project.exists("dist/assets/js/lib"));
    }

    #[test]
    fn syntax_errors_are_recovered() {
        let project = Project::new();
        project.write("src/assets/js/main.js", "let = ;");

        let outcome = run(&project.context(), Profile::Dev).unwrap();

        assert_eq!(outcome, TaskOutcome::Recovered);
        assert_eq!(project.recorder.notifications()[0].title, ERROR_TITLE);
        assert!(!project.exists("dist/assets/js/main.js"));
    }

    #[cfg(unix)]
    #[test]
    fn delegates_to_configured_bundler() {
        let project = Project::new();
        project.write("src/assets/js/main.js", "var answer = 42;\n");
        let mut config = crate::config::Config::default();
        config.js.bundler = ["cp", "{input}", "{output}"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        run(&project.context_with(config), Profile::Dev).unwrap();

        assert_eq!(project.read("dist/assets/js/main.js"), "var answer = 42;\n");
    }

    #[test]
    fn no_sources_writes_nothing() {
        let project = Project::new();

        let outcome = run(&project.context(), Profile::Release).unwrap();

        assert_eq!(outcome, TaskOutcome::Completed { files: 0 });
        assert!(!project.exists("dist"));
    }
}
