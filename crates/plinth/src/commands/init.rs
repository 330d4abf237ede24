//! Initialize a plinth project.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Files written by `init`, relative to the project root.
const FILES: &[(&str, &str)] = &[
    ("plinth.toml", DEFAULT_CONFIG),
    ("grid.toml", DEFAULT_GRID),
    ("src/layouts/default.html", DEFAULT_LAYOUT),
    ("src/partials/header.html", DEFAULT_HEADER),
    ("src/index.html", DEFAULT_INDEX),
    ("src/contact.html", DEFAULT_CONTACT),
    ("src/assets/scss/style.scss", DEFAULT_STYLE),
    ("src/assets/scss/_variables.scss", DEFAULT_VARIABLES),
    ("src/assets/js/main.js", DEFAULT_SCRIPT),
];

/// Run the init command.
pub fn run(root: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing plinth in {}...", root.display());

    for (relative, contents) in FILES {
        let path = root.join(relative);
        if path.exists() && !yes {
            tracing::warn!("{} already exists. Use --yes to overwrite.", relative);
            continue;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("Failed to write {}", relative))?;
        tracing::info!("Created {}", relative);
    }

    for dir in ["src/assets/images", "src/assets/fonts", "src/helpers", "src/data"] {
        fs::create_dir_all(root.join(dir)).with_context(|| format!("Failed to create {}", dir))?;
    }

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'plinth' to build, serve and watch.");

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# Plinth Configuration

[paths]
src = "src"
dist = "dist"
grid_config = "grid.toml"

[css]
# "scss" or "css"
preprocessor = "scss"
browsers = { chrome = 80, edge = 88, firefox = 78, safari = 13, ios_saf = 13 }

[js]
# External bundler, e.g. ["esbuild", "{input}", "--bundle", "--outfile={output}"]
bundler = []

[images]
jpeg_quality = 80

[fonts]
# External TrueType to WOFF2 converter, e.g. ["woff2_compress", "{input}"]
converter = []

[critical]
pages = ["index", "contact"]
stylesheet = "style.css"
width = 1280
height = 480
include = [".footer"]
ignore = ["hljs-"]

[critical.keep]
".btn" = ["display", "font-size", "height", "line-height", "padding", "text-align", "border"]

[server]
host = "127.0.0.1"
port = 3000
open = true
"#;

const DEFAULT_GRID: &str = r#"# Grid settings. `plinth grid` writes src/assets/scss/vendor/_grid.scss;
# import it from style.scss with `@import "vendor/grid";`.

columns = 12
offset = "30px"
mobile_first = false

[container]
max_width = "1200px"
fields = "30px"

[[breakpoints]]
name = "lg"
width = "1100px"

[[breakpoints]]
name = "md"
width = "960px"

[[breakpoints]]
name = "sm"
width = "780px"

[[breakpoints]]
name = "xs"
width = "560px"
"#;

const DEFAULT_LAYOUT: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{{ title | default("Plinth") }}</title>
  <link rel="stylesheet" href="/assets/css/style.min.css">
</head>
<body>
  {% include "partials/header.html" %}
  <main>
    {{ body }}
  </main>
  <footer class="footer">Built with plinth</footer>
  <script src="/assets/js/main.js"></script>
</body>
</html>
"#;

const DEFAULT_HEADER: &str = r#"<!-- site header -->
<header class="header">
  <a class="header__logo" href="/">Home</a>
  <a class="btn" href="/contact.html">Contact</a>
</header>
"#;

const DEFAULT_INDEX: &str = r#"---
title: Home
---
<section class="hero">
  <h1>{{ title }}</h1>
  <p>Edit <code>src/index.html</code> and save to reload.</p>
</section>
"#;

const DEFAULT_CONTACT: &str = r#"---
title: Contact
---
<form class="contact-form">
  <input type="email" name="email" placeholder="you@example.com">
  <button class="btn" type="submit">Send</button>
</form>
"#;

const DEFAULT_VARIABLES: &str = r#"$brand: #2d6cdf;
$text: #1d1f24;
"#;

const DEFAULT_STYLE: &str = r#"@import "variables";

body {
  margin: 0;
  color: $text;
  font-family: system-ui, sans-serif;
}

.header {
  display: flex;
  justify-content: space-between;
  padding: 1rem;
}

.btn {
  display: inline-block;
  padding: 0.5rem 1rem;
  border: 1px solid $brand;
  color: $brand;
  user-select: none;
}

.hero {
  padding: 4rem 1rem;
}

.contact-form {
  display: flex;
  gap: 0.5rem;
}

.footer {
  padding: 1rem;
}

@media (max-width: 560px) {
  .hero {
    padding: 2rem 1rem;
  }
}
"#;

const DEFAULT_SCRIPT: &str = r#"document.addEventListener('DOMContentLoaded', function () {
  console.log('plinth ready');
});
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use plinth_pipeline::{LogNotifier, NoReload, Runner, TaskContext, TaskId};

    use crate::commands::load_config;

    #[test]
    fn keeps_existing_files_without_yes() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("plinth.toml"), "# mine").unwrap();

        run(temp.path(), false).unwrap();

        assert_eq!(fs::read_to_string(temp.path().join("plinth.toml")).unwrap(), "# mine");
        assert!(temp.path().join("src/index.html").exists());

        run(temp.path(), true).unwrap();
        assert_eq!(
            fs::read_to_string(temp.path().join("plinth.toml")).unwrap(),
            DEFAULT_CONFIG
        );
    }

    #[tokio::test]
    async fn starter_project_builds() {
        let temp = tempfile::tempdir().unwrap();
        run(temp.path(), false).unwrap();

        let config = load_config(&temp.path().join("plinth.toml")).unwrap();
        let ctx = TaskContext::new(config, Arc::new(LogNotifier), Arc::new(NoReload)).unwrap();
        let runner = Runner::new(ctx);

        runner.run(TaskId::Grid).await.unwrap();
        runner.run(TaskId::Build).await.unwrap();

        let dist = temp.path().join("dist");
        let index = fs::read_to_string(dist.join("index.html")).unwrap();
        assert!(index.contains("Home"));
        assert!(!index.contains("site header"));
        assert!(dist.join("assets/css/style.min.css").exists());
        assert!(dist.join("assets/css/index-critical.css").exists());
        assert!(dist.join("assets/css/contact-critical.css").exists());
        assert!(dist.join("assets/js/main.js").exists());
        assert!(temp.path().join("src/assets/scss/vendor/_grid.scss").exists());
    }
}
