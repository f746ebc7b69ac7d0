//! End-to-end bundle assembly against throwaway themes.

mod common;

use common::{TestTheme, entry_names, read_entry};
use std::sync::Arc;
use theme_bundler::bundler::{
    BuildOptions, Bundler, Collaborators, Error, MAX_TEMPLATE_BYTES, Manifest, Result, SizePolicy,
    SizeViolation, ThemeContext, ThemeContextBuilder, collaborators::BuildWorker,
    template_path_hash,
};

async fn bundler_with(theme: &TestTheme, options: BuildOptions) -> Bundler {
    let context = ThemeContextBuilder::new()
        .theme_root(theme.root())
        .options(options)
        .build()
        .await
        .unwrap();
    Bundler::new(context, Collaborators::defaults(theme.root()))
}

async fn bundler(theme: &TestTheme) -> Bundler {
    bundler_with(theme, BuildOptions::default()).await
}

#[tokio::test]
async fn full_theme_produces_every_entry() {
    let theme = TestTheme::full();
    let archive = bundler(&theme).await.build_bundle().await.unwrap();

    assert_eq!(archive, theme.default_archive());
    let names = entry_names(&archive);

    for raw in [
        "config.json",
        "README.md",
        "assets/js/theme.js",
        "assets/scss/theme.scss",
        "assets/scss/_settings.scss",
        "lang/en.json",
        "templates/pages/home.html",
        "templates/components/header.html",
    ] {
        assert!(names.contains(raw), "missing raw entry {raw}");
    }
    for excluded in [
        "assets/js/theme.js.map",
        "assets/cdn/hero.png",
        "node_modules/lib/index.js",
    ] {
        assert!(!names.contains(excluded), "unexpected entry {excluded}");
    }

    for generated in [
        "parsed/scss/theme.json".to_string(),
        format!("parsed/templates/{}.json", template_path_hash("pages/home")),
        format!("parsed/templates/{}.json", template_path_hash("components/header")),
        "parsed/lang.json".to_string(),
        "schema.json".to_string(),
        "schemaTranslations.json".to_string(),
        "manifest.json".to_string(),
    ] {
        assert!(names.contains(&generated), "missing generated entry {generated}");
    }
    assert!(!names.iter().any(|n| n.starts_with("parsed/scss/_")));
}

#[tokio::test]
async fn manifest_lists_templates_and_regions() {
    let theme = TestTheme::full();
    let archive = bundler(&theme).await.build_bundle().await.unwrap();

    let manifest: Manifest = serde_json::from_str(&read_entry(&archive, "manifest.json")).unwrap();
    assert_eq!(manifest.templates, vec!["components/header", "pages/home"]);

    let home: Vec<&str> = manifest.regions["pages/home"]
        .iter()
        .map(|r| r.name.as_str())
        .collect();
    assert_eq!(home, vec!["home_below_header", "header_bottom"]);
    assert_eq!(manifest.regions["components/header"].len(), 1);

    let lang: serde_json::Value =
        serde_json::from_str(&read_entry(&archive, "parsed/lang.json")).unwrap();
    assert_eq!(lang["en"]["header"]["welcome"], "Welcome");
}

#[tokio::test]
async fn no_compiler_means_no_style_entries() {
    let theme = TestTheme::new();
    theme.file("assets/scss/theme.scss", "body {}");

    let bundler = bundler(&theme).await;
    assert!(!bundler.task_names().contains(&"css"));

    let archive = bundler.build_bundle().await.unwrap();
    let names = entry_names(&archive);
    assert!(names.contains("assets/scss/theme.scss"));
    assert!(!names.iter().any(|n| n.starts_with("parsed/scss/")));
}

#[tokio::test]
async fn style_failure_writes_no_archive() {
    let theme = TestTheme::full();
    theme.file("assets/scss/theme.scss", "@import \"missing\";");

    let err = bundler(&theme).await.build_bundle().await.unwrap_err();
    match &err {
        Error::Task { task, .. } => assert_eq!(*task, "css"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!theme.default_archive().exists());
}

#[tokio::test]
async fn circular_partials_fail_the_templates_task() {
    let theme = TestTheme::new();
    theme.file("templates/a.html", "{{> b}}");
    theme.file("templates/b.html", "{{> a}}");

    let err = bundler(&theme).await.build_bundle().await.unwrap_err();
    match err.root() {
        Error::CycleDetected { cycle } => {
            assert_eq!(cycle, &vec!["a".to_string(), "b".to_string()])
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(matches!(err, Error::Task { task: "templates", .. }));
    assert!(!theme.default_archive().exists());
}

#[tokio::test]
async fn deep_partial_chain_is_bundled() {
    const DEPTH: usize = 3_000;
    let theme = TestTheme::new();
    theme.file("templates/pages/home.html", "{{> c/0000}}");
    for i in 0..DEPTH {
        let content = if i + 1 < DEPTH {
            format!("{{{{> c/{:04}}}}}", i + 1)
        } else {
            "end".to_string()
        };
        theme.file(&format!("templates/c/{i:04}.html"), &content);
    }

    // Each template nests the rest of the chain, so lift the bundle limit
    let policy = SizePolicy {
        max_bundle_bytes: u64::MAX,
        ..Default::default()
    };
    let archive = bundler(&theme)
        .await
        .with_size_policy(policy)
        .build_bundle()
        .await
        .unwrap();

    let manifest: Manifest = serde_json::from_str(&read_entry(&archive, "manifest.json")).unwrap();
    assert_eq!(manifest.templates.len(), DEPTH + 1);

    let parsed = |path: &str| {
        read_entry(
            &archive,
            &format!("parsed/templates/{}.json", template_path_hash(path)),
        )
    };
    assert_eq!(
        parsed("c/2998"),
        concat!(
            r#"{"path":"c/2998","content":"{{> c/2999}}","partials":"#,
            r#"[{"name":"c/2999","template":{"path":"c/2999","content":"end"}}]}"#
        )
    );

    let home = parsed("pages/home");
    assert!(home.starts_with(
        r#"{"path":"pages/home","content":"{{> c/0000}}","partials":[{"name":"c/0000","template":"#
    ));
    assert_eq!(home.matches(r#""template":"#).count(), DEPTH);
}

#[tokio::test]
async fn unknown_partial_fails_the_templates_task() {
    let theme = TestTheme::new();
    theme.file("templates/pages/home.html", "{{> components/missing}}");

    let err = bundler(&theme).await.build_bundle().await.unwrap_err();
    assert!(matches!(err.root(), Error::ObjectReference(_)), "{err:?}");
}

#[tokio::test]
async fn identical_inputs_give_identical_archives() {
    let theme = TestTheme::full();
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();

    let a = bundler_with(
        &theme,
        BuildOptions {
            dest: Some(first.path().to_path_buf()),
            ..Default::default()
        },
    )
    .await
    .build_bundle()
    .await
    .unwrap();
    let b = bundler_with(
        &theme,
        BuildOptions {
            dest: Some(second.path().to_path_buf()),
            ..Default::default()
        },
    )
    .await
    .build_bundle()
    .await
    .unwrap();

    assert_eq!(std::fs::read(a).unwrap(), std::fs::read(b).unwrap());
}

#[tokio::test]
async fn name_override_and_missing_dest_directory() {
    let theme = TestTheme::new();
    let out = tempfile::tempdir().unwrap();
    let dest = out.path().join("dist/nightly");

    let archive = bundler_with(
        &theme,
        BuildOptions {
            name: Some("cornerstone-nightly".into()),
            dest: Some(dest.clone()),
            ..Default::default()
        },
    )
    .await
    .build_bundle()
    .await
    .unwrap();

    assert_eq!(archive, dest.join("cornerstone-nightly.zip"));
    assert!(archive.is_file());
}

#[tokio::test]
async fn oversized_template_fails_but_keeps_the_archive() {
    let theme = TestTheme::new();
    theme.file("templates/pages/huge.html", &"a".repeat(1_100_000));

    let err = bundler(&theme).await.build_bundle().await.unwrap_err();
    match err {
        Error::SizeLimit { archive, violation } => {
            assert_eq!(
                violation,
                SizeViolation::OversizedTemplates {
                    templates: vec!["pages/huge".into()],
                    limit: MAX_TEMPLATE_BYTES,
                }
            );
            assert_eq!(archive, theme.default_archive());
            assert!(archive.is_file());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn bundle_limit_is_checked_after_writing() {
    let theme = TestTheme::new();
    let policy = SizePolicy {
        max_bundle_bytes: 64,
        ..Default::default()
    };

    let err = bundler(&theme)
        .await
        .with_size_policy(policy)
        .build_bundle()
        .await
        .unwrap_err();
    match err {
        Error::SizeLimit {
            archive,
            violation: SizeViolation::BundleTooLarge { size, limit },
        } => {
            assert_eq!(limit, 64);
            assert_eq!(size, std::fs::metadata(&archive).unwrap().len());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

struct FailingWorker;

#[async_trait::async_trait]
impl BuildWorker for FailingWorker {
    async fn build(&self, _context: &ThemeContext) -> Result<()> {
        Err(Error::GenericError("webpack exited with status 1".into()))
    }
}

#[tokio::test]
async fn build_worker_failure_is_attributed() {
    let theme = TestTheme::new();
    let context = ThemeContextBuilder::new()
        .theme_root(theme.root())
        .build()
        .await
        .unwrap();
    let collaborators =
        Collaborators::defaults(theme.root()).with_build_worker(Arc::new(FailingWorker));
    let bundler = Bundler::new(context, collaborators);
    assert!(bundler.task_names().contains(&"theme_build"));

    let err = bundler.build_bundle().await.unwrap_err();
    assert!(matches!(err, Error::Task { task: "theme_build", .. }), "{err:?}");
    assert!(!theme.default_archive().exists());
}

#[tokio::test]
async fn marketplace_mode_requires_meta() {
    let theme = TestTheme::new();
    let options = BuildOptions {
        marketplace: true,
        ..Default::default()
    };

    let err = bundler_with(&theme, options.clone())
        .await
        .build_bundle()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    theme.config(
        r#"{"name": "Cornerstone", "version": "1.0.0",
            "meta": {"composed_image": "composed.png"}}"#,
    );
    theme.file("meta/composed.png", "png");
    let archive = bundler_with(&theme, options).await.build_bundle().await.unwrap();
    assert!(entry_names(&archive).contains("meta/composed.png"));
}
