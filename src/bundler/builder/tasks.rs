//! Producer tasks and their concurrent execution.
//!
//! The producer phase is declared once as the [`TASKS`] table. Each entry has
//! a name, an inclusion predicate evaluated against the context when the
//! [`Bundler`] is constructed, and a producer. Producers read only the shared
//! context and collaborators; none consumes another's output, so they all run
//! at once.
//!
//! [`Bundler`]: super::Bundler

use crate::bundler::{
    Error, Result,
    collaborators::{Collaborators, StyleOptions, TemplateSet},
    error::ErrorExt,
    graph::check_circular_dependencies,
    settings::ThemeContext,
    utils::fs::list_template_files,
};
use futures_lite::future::Boxed;
use serde_json::Value;
use std::{
    collections::{BTreeMap, HashMap},
    path::PathBuf,
    sync::Arc,
};
use tokio::{sync::Semaphore, task::JoinSet};

/// Style trees keyed by source file stem.
pub type StyleSet = BTreeMap<String, Value>;

/// Result of one producer task.
#[derive(Debug)]
pub enum TaskOutput {
    /// Parsed style sources.
    Css(StyleSet),
    /// Parsed templates.
    Templates(TemplateSet),
    /// Translation document.
    Lang(Value),
    /// Theme editor schema.
    Schema(Value),
    /// Schema translations.
    SchemaTranslations(Value),
    /// Production build finished; contributes no archive entries.
    ThemeBuild,
}

/// Results of the producer phase, one slot per task.
///
/// A slot is `None` when its task was not part of this invocation.
#[derive(Debug, Default)]
pub struct ParsedAssetSet {
    /// Parsed style sources.
    pub css: Option<StyleSet>,
    /// Parsed templates.
    pub templates: Option<TemplateSet>,
    /// Translation document.
    pub lang: Option<Value>,
    /// Theme editor schema.
    pub schema: Option<Value>,
    /// Schema translations.
    pub schema_translations: Option<Value>,
}

impl ParsedAssetSet {
    fn insert(&mut self, output: TaskOutput) {
        match output {
            TaskOutput::Css(css) => self.css = Some(css),
            TaskOutput::Templates(templates) => self.templates = Some(templates),
            TaskOutput::Lang(lang) => self.lang = Some(lang),
            TaskOutput::Schema(schema) => self.schema = Some(schema),
            TaskOutput::SchemaTranslations(t) => self.schema_translations = Some(t),
            TaskOutput::ThemeBuild => {}
        }
    }
}

type Producer = fn(Arc<ThemeContext>, Arc<Collaborators>) -> Boxed<Result<TaskOutput>>;

/// One entry of the producer table.
pub struct TaskSpec {
    /// Task name, used in logs and errors.
    pub name: &'static str,
    /// Whether the task takes part in an invocation.
    pub include: fn(&ThemeContext, &Collaborators) -> bool,
    /// Produces the task's output.
    pub run: Producer,
}

impl std::fmt::Debug for TaskSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskSpec").field("name", &self.name).finish()
    }
}

/// The producer table.
pub static TASKS: &[TaskSpec] = &[
    TaskSpec {
        name: "css",
        include: |ctx, _| ctx.css_compiler().is_some(),
        run: |ctx, collab| Box::pin(assemble_css(ctx, collab)),
    },
    TaskSpec {
        name: "templates",
        include: |_, _| true,
        run: |ctx, collab| Box::pin(assemble_templates(ctx, collab)),
    },
    TaskSpec {
        name: "lang",
        include: |_, _| true,
        run: |_, collab| {
            Box::pin(async move { collab.lang.assemble().await.map(TaskOutput::Lang) })
        },
    },
    TaskSpec {
        name: "schema",
        include: |_, _| true,
        run: |ctx, _| {
            Box::pin(async move { ctx.config().schema().await.map(TaskOutput::Schema) })
        },
    },
    TaskSpec {
        name: "schema_translations",
        include: |_, _| true,
        run: |ctx, _| {
            Box::pin(async move {
                ctx.config()
                    .schema_translations()
                    .await
                    .map(TaskOutput::SchemaTranslations)
            })
        },
    },
    TaskSpec {
        name: "theme_build",
        include: |_, collab| collab.build_worker.is_some(),
        run: |ctx, collab| Box::pin(run_theme_build(ctx, collab)),
    },
];

/// Selects the tasks taking part in an invocation.
pub fn select_tasks(
    context: &ThemeContext,
    collaborators: &Collaborators,
) -> Vec<&'static TaskSpec> {
    TASKS
        .iter()
        .filter(|task| (task.include)(context, collaborators))
        .collect()
}

/// Runs `tasks` concurrently and collects their outputs.
///
/// Returns the first failure to surface. Tasks still running at that point
/// are detached rather than aborted; they run to completion and their results
/// are dropped.
pub async fn run_tasks(
    tasks: &[&'static TaskSpec],
    context: Arc<ThemeContext>,
    collaborators: Arc<Collaborators>,
) -> Result<ParsedAssetSet> {
    let mut set = JoinSet::new();
    let mut names = HashMap::new();

    for task in tasks {
        let future = (task.run)(context.clone(), collaborators.clone());
        log::info!("Starting task: {}", task.name);
        let handle = set.spawn(future);
        names.insert(handle.id(), task.name);
    }

    let mut assets = ParsedAssetSet::default();

    while let Some(joined) = set.join_next_with_id().await {
        let (id, result) = match joined {
            Ok((id, result)) => (id, result),
            Err(e) => (e.id(), Err(Error::GenericError(format!("Producer panicked: {}", e)))),
        };
        let name = names.get(&id).copied().unwrap_or("unknown");

        match result {
            Ok(output) => {
                log::info!("✓ Task finished: {}", name);
                assets.insert(output);
            }
            Err(e) => {
                log::debug!("Task '{}' failed, detaching {} sibling(s)", name, set.len());
                set.detach_all();
                return Err(e.in_task(name));
            }
        }
    }

    Ok(assets)
}

/// Top-level style sources: `assets/<compiler>/*.<compiler>`, excluding
/// `_`-prefixed partials.
async fn style_sources(base_path: &std::path::Path, compiler: &str) -> Result<Vec<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(base_path).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::warn!("No style directory at {}", base_path.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(e).fs_context("reading style directory", base_path),
    };

    let mut sources = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .fs_context("reading style directory", base_path)?
    {
        let path = entry.path();
        let is_source = path.extension().and_then(|e| e.to_str()) == Some(compiler)
            && !path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('_'));
        if is_source {
            sources.push(path);
        }
    }

    sources.sort();
    Ok(sources)
}

async fn assemble_css(
    context: Arc<ThemeContext>,
    collaborators: Arc<Collaborators>,
) -> Result<TaskOutput> {
    let Some(compiler) = context.css_compiler().map(str::to_string) else {
        return Ok(TaskOutput::Css(StyleSet::new()));
    };

    let base_path = context.theme_root().join("assets").join(&compiler);
    let sources = style_sources(&base_path, &compiler).await?;
    log::debug!("Parsing {} {} source(s)", sources.len(), compiler);

    let limit = context.options().style_concurrency.map(|n| Arc::new(Semaphore::new(n)));
    let options = Arc::new(StyleOptions::default());
    let mut set = JoinSet::new();
    let mut files = HashMap::new();

    for source in sources {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let display = source.display().to_string();
        let assembler = collaborators.style.clone();
        let base_path = base_path.clone();
        let compiler = compiler.clone();
        let options = options.clone();
        let limit = limit.clone();

        let handle = set.spawn(async move {
            let _permit = match &limit {
                Some(semaphore) => Some(semaphore.clone().acquire_owned().await.map_err(|e| {
                    Error::GenericError(format!("Style concurrency limiter closed: {}", e))
                })?),
                None => None,
            };
            let tree = assembler
                .assemble(&source, &base_path, &compiler, &options)
                .await?;
            Ok::<_, Error>((stem, tree))
        });
        files.insert(handle.id(), display);
    }

    let mut styles = StyleSet::new();
    while let Some(joined) = set.join_next_with_id().await {
        let parsed = match joined {
            Ok((_, parsed)) => parsed,
            Err(e) => {
                let file = files.get(&e.id()).map_or("unknown source", String::as_str);
                Err(Error::GenericError(format!("Style assembly of {} panicked: {}", file, e)))
            }
        };
        match parsed {
            Ok((stem, tree)) => {
                styles.insert(stem, tree);
            }
            Err(e) => {
                set.detach_all();
                return Err(e);
            }
        }
    }

    Ok(TaskOutput::Css(styles))
}

async fn assemble_templates(
    context: Arc<ThemeContext>,
    collaborators: Arc<Collaborators>,
) -> Result<TaskOutput> {
    let templates_root = context.templates_root();
    let paths = list_template_files(&templates_root).await?;
    log::debug!("Parsing {} template(s)", paths.len());

    let templates = collaborators
        .templates
        .assemble_set(&templates_root, &paths)
        .await?;

    // Both checks must pass; the first failure wins
    tokio::try_join!(
        collaborators.validator.check_object_references(&templates),
        async { check_circular_dependencies(&templates) },
    )?;

    Ok(TaskOutput::Templates(templates))
}

async fn run_theme_build(
    context: Arc<ThemeContext>,
    collaborators: Arc<Collaborators>,
) -> Result<TaskOutput> {
    if let Some(worker) = &collaborators.build_worker {
        worker.build(&context).await?;
    }
    Ok(TaskOutput::ThemeBuild)
}
