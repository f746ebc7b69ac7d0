//! Template assembly.
//!
//! A template is parsed into a [`ParsedTemplate`] tree: its own content plus,
//! for every partial it includes, the partial's identifier and (the first
//! time it is seen within this tree) the partial's own parsed form.
//!
//! Trees are built, walked, serialized and dropped with explicit stacks, so
//! inclusion depth is bounded by memory rather than by the thread's stack.

use super::{TemplateAssembler, TemplateSet};
use crate::bundler::{
    Result,
    error::ErrorExt,
    utils::fs::TEMPLATE_EXTENSION,
};
use async_trait::async_trait;
use regex::Regex;
use std::{
    collections::{HashMap, HashSet, VecDeque},
    fmt, io,
    path::{Component, Path, PathBuf},
    sync::{Arc, LazyLock},
};

/// `{{> name}}` and `{{#> name}}` partial inclusions.
static PARTIAL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{~?#?>\s*([A-Za-z0-9_./-]+)").expect("partial pattern is a valid regex")
});

/// Parsed form of one template.
///
/// Expanded partials are reference counted. Trees for different templates
/// share a partial's subtree whenever that subtree would be expanded the same
/// way in both, so cloning is shallow.
#[derive(Clone, PartialEq)]
pub struct ParsedTemplate {
    /// Template path relative to the templates root, without extension.
    pub path: String,

    /// Raw template source.
    pub content: String,

    /// Partials included directly by this template, in source order.
    pub partials: Vec<PartialReference>,
}

/// One partial inclusion inside a [`ParsedTemplate`].
#[derive(Debug, Clone, PartialEq)]
pub struct PartialReference {
    /// Referenced template path.
    pub name: String,

    /// Parsed partial.
    ///
    /// `None` when the partial was already expanded elsewhere in the same tree
    /// or does not exist.
    pub template: Option<Arc<ParsedTemplate>>,
}

impl PartialReference {
    fn unexpanded(name: &str) -> Self {
        Self {
            name: name.to_string(),
            template: None,
        }
    }

    fn expanded(name: &str, template: Arc<ParsedTemplate>) -> Self {
        Self {
            name: name.to_string(),
            template: Some(template),
        }
    }
}

/// JSON output steps, run from an explicit stack.
enum JsonStep<'a> {
    Template(&'a ParsedTemplate),
    Reference(&'a PartialReference, bool),
    Raw(&'static [u8]),
}

impl ParsedTemplate {
    /// Creates a template with no partials.
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            partials: Vec::new(),
        }
    }

    /// Adds a reference to a partial, optionally with its parsed form.
    pub fn with_partial(
        mut self,
        name: impl Into<String>,
        template: Option<ParsedTemplate>,
    ) -> Self {
        self.partials.push(PartialReference {
            name: name.into(),
            template: template.map(Arc::new),
        });
        self
    }

    /// Visits this template and every expanded partial below it.
    ///
    /// Traversal uses an explicit stack, so arbitrarily deep trees are safe.
    pub fn walk<'a>(&'a self, mut visit: impl FnMut(&'a ParsedTemplate)) {
        self.walk_pruned(|node| {
            visit(node);
            true
        });
    }

    /// Like [`walk`](Self::walk), but skips the partials of any node for
    /// which `visit` returns `false`.
    pub fn walk_pruned<'a>(&'a self, mut visit: impl FnMut(&'a ParsedTemplate) -> bool) {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if !visit(node) {
                continue;
            }
            for partial in node.partials.iter().rev() {
                if let Some(template) = &partial.template {
                    stack.push(template);
                }
            }
        }
    }

    /// Writes the JSON document stored in the bundle.
    ///
    /// `{"path", "content", "partials": [{"name", "template"}]}`, with
    /// `partials` omitted when empty and `template` omitted when unexpanded.
    pub fn write_json<W: io::Write>(&self, mut writer: W) -> serde_json::Result<()> {
        let mut stack = vec![JsonStep::Template(self)];

        while let Some(step) = stack.pop() {
            match step {
                JsonStep::Template(node) => {
                    raw(&mut writer, b"{\"path\":")?;
                    serde_json::to_writer(&mut writer, &node.path)?;
                    raw(&mut writer, b",\"content\":")?;
                    serde_json::to_writer(&mut writer, &node.content)?;
                    if node.partials.is_empty() {
                        raw(&mut writer, b"}")?;
                        continue;
                    }
                    raw(&mut writer, b",\"partials\":[")?;
                    stack.push(JsonStep::Raw(b"]}"));
                    for (i, partial) in node.partials.iter().enumerate().rev() {
                        stack.push(JsonStep::Reference(partial, i == 0));
                    }
                }
                JsonStep::Reference(partial, first) => {
                    let open: &[u8] = if first { b"{\"name\":" } else { b",{\"name\":" };
                    raw(&mut writer, open)?;
                    serde_json::to_writer(&mut writer, &partial.name)?;
                    match &partial.template {
                        Some(template) => {
                            raw(&mut writer, b",\"template\":")?;
                            stack.push(JsonStep::Raw(b"}"));
                            stack.push(JsonStep::Template(template));
                        }
                        None => raw(&mut writer, b"}")?,
                    }
                }
                JsonStep::Raw(bytes) => raw(&mut writer, bytes)?,
            }
        }

        Ok(())
    }

    /// Serializes to a JSON byte vector.
    pub fn to_json_vec(&self) -> serde_json::Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_json(&mut out)?;
        Ok(out)
    }
}

fn raw<W: io::Write>(writer: &mut W, bytes: &[u8]) -> serde_json::Result<()> {
    writer.write_all(bytes).map_err(serde_json::Error::io)
}

impl Drop for ParsedTemplate {
    fn drop(&mut self) {
        // Unlink uniquely owned subtrees onto a heap stack
        let mut stack: Vec<Arc<ParsedTemplate>> = self
            .partials
            .iter_mut()
            .filter_map(|p| p.template.take())
            .collect();
        while let Some(shared) = stack.pop() {
            if let Some(mut node) = Arc::into_inner(shared) {
                stack.extend(node.partials.iter_mut().filter_map(|p| p.template.take()));
            }
        }
    }
}

impl fmt::Debug for ParsedTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let partials: Vec<(&str, bool)> = self
            .partials
            .iter()
            .map(|p| (p.name.as_str(), p.template.is_some()))
            .collect();
        f.debug_struct("ParsedTemplate")
            .field("path", &self.path)
            .field("content_len", &self.content.len())
            .field("partials", &partials)
            .finish()
    }
}

/// Extracts partial names from template source, first occurrence order.
pub fn partial_names(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    PARTIAL_PATTERN
        .captures_iter(content)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim_end_matches('.').to_string())
        .filter(|name| !name.is_empty() && seen.insert(name.clone()))
        .collect()
}

/// Returns the source file for a template name, or `None` if the name would
/// escape the templates root.
fn template_file(templates_root: &Path, name: &str) -> Option<PathBuf> {
    let relative = Path::new(name);
    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(templates_root.join(format!("{name}.{TEMPLATE_EXTENSION}")))
}

/// Source and direct references of one loaded template.
struct TemplateSource {
    content: String,
    references: Vec<String>,
}

/// Every template reachable from a set of top-level templates, each read
/// once. `None` marks a partial that does not exist.
type LoadedSources = HashMap<String, Option<TemplateSource>>;

async fn load_sources(templates_root: &Path, roots: &[String]) -> Result<LoadedSources> {
    let top_level: HashSet<&str> = roots.iter().map(String::as_str).collect();
    let mut loaded = LoadedSources::new();
    let mut queue: VecDeque<String> = roots.iter().cloned().collect();

    while let Some(name) = queue.pop_front() {
        if loaded.contains_key(&name) {
            continue;
        }

        let Some(path) = template_file(templates_root, &name) else {
            log::debug!("Ignoring partial outside templates root: {}", name);
            loaded.insert(name, None);
            continue;
        };

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound && !top_level.contains(name.as_str()) => {
                log::debug!("Partial '{}' not found at {}", name, path.display());
                loaded.insert(name, None);
                continue;
            }
            Err(e) => return Err(e).fs_context("reading template", &path),
        };

        let references = partial_names(&content);
        queue.extend(
            references
                .iter()
                .filter(|r| !loaded.contains_key(*r))
                .cloned(),
        );
        loaded.insert(name, Some(TemplateSource { content, references }));
    }

    Ok(loaded)
}

/// A template whose partials are still being expanded.
struct Frame<'a> {
    name: &'a str,
    references: &'a [String],
    next: usize,
    /// Preorder position of this template within the tree being built.
    order: usize,
    /// Earliest position of an already expanded template referenced from
    /// inside this subtree.
    low: usize,
    node: ParsedTemplate,
}

impl<'a> Frame<'a> {
    fn new(name: &'a str, source: &'a TemplateSource, order: usize) -> Self {
        Self {
            name,
            references: &source.references,
            next: 0,
            order,
            low: usize::MAX,
            node: ParsedTemplate::new(name, source.content.clone()),
        }
    }
}

/// Builds parsed trees over loaded sources.
///
/// A finished subtree that references nothing expanded before it is the same
/// tree the partial would get as a top-level template. Such subtrees are kept
/// and reused by later trees when none of their templates has been expanded
/// there yet.
struct Expander<'a> {
    sources: &'a LoadedSources,
    shared: HashMap<&'a str, Arc<ParsedTemplate>>,
}

impl<'a> Expander<'a> {
    fn new(sources: &'a LoadedSources) -> Self {
        Self {
            sources,
            shared: HashMap::new(),
        }
    }

    fn source(&self, name: &str) -> Option<(&'a str, &'a TemplateSource)> {
        let sources: &'a LoadedSources = self.sources;
        match sources.get_key_value(name) {
            Some((name, Some(source))) => Some((name.as_str(), source)),
            _ => None,
        }
    }

    /// Reuses the shared subtree for `name` if none of its templates has been
    /// expanded in the current tree, marking them expanded.
    fn reuse(
        &self,
        name: &str,
        order: &mut HashMap<&'a str, usize>,
    ) -> Option<Arc<ParsedTemplate>> {
        let tree = self.shared.get(name)?;

        let mut clash = false;
        tree.walk_pruned(|node| {
            clash = clash || order.contains_key(node.path.as_str());
            !clash
        });
        if clash {
            return None;
        }

        let mut paths = Vec::new();
        tree.walk(|node| paths.push(node.path.as_str()));
        for path in paths {
            if let Some((key, _)) = self.source(path) {
                let position = order.len();
                order.insert(key, position);
            }
        }
        Some(tree.clone())
    }

    /// Builds the tree for the top-level template `name`.
    fn expand(&mut self, name: &str) -> ParsedTemplate {
        if let Some(tree) = self.shared.get(name) {
            return ParsedTemplate::clone(tree);
        }
        let Some((root, source)) = self.source(name) else {
            return ParsedTemplate::new(name, "");
        };

        let mut order: HashMap<&'a str, usize> = HashMap::from([(root, 0)]);
        let mut frames = vec![Frame::new(root, source, 0)];
        let mut finished = None;

        while let Some(frame) = frames.last_mut() {
            let references = frame.references;
            if let Some(reference) = references.get(frame.next) {
                frame.next += 1;

                if let Some(&seen) = order.get(reference.as_str()) {
                    frame.low = frame.low.min(seen);
                    frame.node.partials.push(PartialReference::unexpanded(reference));
                    continue;
                }
                let Some((name, source)) = self.source(reference) else {
                    frame.node.partials.push(PartialReference::unexpanded(reference));
                    continue;
                };
                if let Some(tree) = self.reuse(name, &mut order) {
                    frame.node.partials.push(PartialReference::expanded(name, tree));
                    continue;
                }

                let position = order.len();
                order.insert(name, position);
                frames.push(Frame::new(name, source, position));
                continue;
            }

            let Some(done) = frames.pop() else { break };
            let (name, low, self_contained) = (done.name, done.low, done.low >= done.order);
            let tree = Arc::new(done.node);
            if self_contained {
                self.shared.entry(name).or_insert_with(|| tree.clone());
            }

            match frames.last_mut() {
                Some(parent) => {
                    parent.low = parent.low.min(low);
                    parent.node.partials.push(PartialReference::expanded(name, tree));
                }
                None => finished = Some(tree),
            }
        }

        finished
            .map(|tree| ParsedTemplate::clone(&tree))
            .unwrap_or_else(|| ParsedTemplate::new(name, ""))
    }
}

/// Handlebars-style template assembler.
///
/// Reads `<templates_root>/<partial>.html`, follows `{{> name}}` inclusions
/// breadth-first and builds the nested [`ParsedTemplate`]. Missing partials
/// are kept as dangling references for the validator to report; a missing
/// top-level template is an error.
///
/// [`assemble_set`](TemplateAssembler::assemble_set) reads each file once for
/// the whole set and shares identical subtrees between templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct HandlebarsTemplateAssembler;

#[async_trait]
impl TemplateAssembler for HandlebarsTemplateAssembler {
    async fn assemble(&self, templates_root: &Path, partial: &str) -> Result<ParsedTemplate> {
        let roots = [partial.to_string()];
        let sources = load_sources(templates_root, &roots).await?;
        Ok(Expander::new(&sources).expand(partial))
    }

    async fn assemble_set(
        &self,
        templates_root: &Path,
        partials: &[String],
    ) -> Result<TemplateSet> {
        let sources = load_sources(templates_root, partials).await?;
        log::debug!("Loaded {} template source(s)", sources.len());

        let mut expander = Expander::new(&sources);
        Ok(partials
            .iter()
            .map(|partial| (partial.clone(), expander.expand(partial)))
            .collect())
    }
}
