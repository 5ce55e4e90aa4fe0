//! The directive transform: Markdown text in, [`Document`] out.
//!
//! Container and leaf directives are resolved line by line before any
//! Markdown parsing happens. The text between directive lines is parsed as
//! ordinary Markdown, one chunk at a time, and inline directives are carried
//! through markdown-rs as markers (see `directives::inline`).
//!
//! The transform never fails. Anything that does not resolve into a
//! recognized directive stays literal Markdown and leaves a warning in
//! [`Document::diagnostics`].

use std::collections::{HashMap, HashSet};

use markdown::mdast::{self, Node};

use crate::code_fence::CodeFenceTracker;
use crate::directives::inline::{MaskedDirective, mask_inline_directives, splice_markers};
use crate::directives::{
    Directive, DirectiveKind, DirectiveName, DirectiveSyntax, FenceLine, classify_line,
};
use crate::error::{ParseDiagnostics, ParseWarning, SourceLocation};
use crate::parse::{ParseOptions, definition_sources, parse_label, parse_mdast_with_options};

/// A top-level or directive-child block.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Paragraph.
    Paragraph(mdast::Paragraph),
    /// ATX or setext heading.
    Heading(mdast::Heading),
    /// Ordered or unordered list.
    List(mdast::List),
    /// Fenced or indented code.
    Code(mdast::Code),
    /// Raw HTML block.
    Html(mdast::Html),
    /// Recognized directive.
    Directive(Directive),
    /// Any other flow node (blockquote, table, thematic break, ...).
    Other(Node),
}

impl From<Node> for Block {
    fn from(node: Node) -> Self {
        match node {
            Node::Paragraph(node) => Block::Paragraph(node),
            Node::Heading(node) => Block::Heading(node),
            Node::List(node) => Block::List(node),
            Node::Code(node) => Block::Code(node),
            Node::Html(node) => Block::Html(node),
            other => Block::Other(other),
        }
    }
}

/// Result of [`transform`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    /// Blocks in source order.
    pub blocks: Vec<Block>,
    /// Inline (text) directives. Paragraph content refers to these by index
    /// through `lm-directive` stand-in elements.
    pub inline_directives: Vec<Directive>,
    /// Link reference definitions keyed by normalized identifier.
    pub definitions: HashMap<String, mdast::Definition>,
    /// Footnote definitions, first definition per identifier.
    pub footnotes: Vec<mdast::FootnoteDefinition>,
    /// Non-fatal conditions found while transforming.
    pub diagnostics: ParseDiagnostics,
}

impl Document {
    /// Number of directives of every kind, nested ones included.
    pub fn directive_count(&self) -> usize {
        fn count(blocks: &[Block]) -> usize {
            blocks
                .iter()
                .map(|block| match block {
                    Block::Directive(directive) => 1 + count(&directive.children),
                    _ => 0,
                })
                .sum()
        }
        count(&self.blocks) + self.inline_directives.len()
    }

    /// Looks up a link reference definition.
    pub fn definition(&self, identifier: &str) -> Option<&mdast::Definition> {
        self.definitions.get(identifier)
    }
}

/// Transforms Markdown text with the default page options.
pub fn transform(source: &str) -> Document {
    transform_with_options(source, &ParseOptions::default())
}

/// Transforms Markdown text.
///
/// `source` must not carry frontmatter; strip it first with
/// [`crate::frontmatter::split_page`].
pub fn transform_with_options(source: &str, options: &ParseOptions) -> Document {
    let lines: Vec<&str> = source.split_inclusive('\n').collect();
    let mut diagnostics = ParseDiagnostics::new();

    let segments = if options.directives {
        Scanner::new(&lines, &mut diagnostics).scan()
    } else {
        vec![Segment::Markdown {
            text: source.to_string(),
            line: 1,
        }]
    };

    let mut builder = Builder::new(options, diagnostics);
    builder.collect_definitions(&segments);
    let blocks = builder.build(segments);

    let Builder {
        inline_directives,
        definitions,
        footnotes,
        diagnostics,
        ..
    } = builder;

    Document {
        blocks,
        inline_directives,
        definitions,
        footnotes,
        diagnostics,
    }
}

/// Directive structure resolved from lines, before Markdown parsing.
#[derive(Debug)]
enum Segment {
    Markdown {
        text: String,
        line: usize,
    },
    Leaf {
        name: DirectiveName,
        syntax: DirectiveSyntax,
        line: usize,
    },
    Container {
        name: DirectiveName,
        syntax: DirectiveSyntax,
        line: usize,
        children: Vec<Segment>,
    },
}

#[derive(Debug)]
enum Item {
    Line(usize),
    Leaf(usize, DirectiveName, DirectiveSyntax),
    Container(Frame),
}

#[derive(Debug)]
struct Opener {
    line: usize,
    syntax: DirectiveSyntax,
    name: Option<DirectiveName>,
}

#[derive(Debug, Default)]
struct Frame {
    opener: Option<Opener>,
    items: Vec<Item>,
}

impl Frame {
    fn fence_length(&self) -> usize {
        self.opener.as_ref().map_or(0, |opener| opener.syntax.colons)
    }
}

struct Scanner<'a, 'd> {
    lines: &'a [&'a str],
    stack: Vec<Frame>,
    diagnostics: &'d mut ParseDiagnostics,
}

impl<'a, 'd> Scanner<'a, 'd> {
    fn new(lines: &'a [&'a str], diagnostics: &'d mut ParseDiagnostics) -> Self {
        Self {
            lines,
            stack: vec![Frame::default()],
            diagnostics,
        }
    }

    fn scan(mut self) -> Vec<Segment> {
        let mut fences = CodeFenceTracker::new();
        let lines = self.lines;

        for (index, line) in lines.iter().enumerate() {
            // a code fence left open inside a container ends with the container
            if fences.is_open()
                && let FenceLine::Close(length) = classify_line(line)
                && self.closes_open_frame(length)
            {
                fences.reset();
                self.close(index, length);
                continue;
            }
            if fences.observe(line) {
                self.push(Item::Line(index));
                continue;
            }
            match classify_line(line) {
                FenceLine::Open(syntax) => {
                    let name = DirectiveName::parse(&syntax.name);
                    self.stack.push(Frame {
                        opener: Some(Opener {
                            line: index,
                            syntax,
                            name,
                        }),
                        items: Vec::new(),
                    });
                }
                FenceLine::Close(length) => self.close(index, length),
                FenceLine::Leaf(syntax) => match DirectiveName::parse(&syntax.name) {
                    Some(name) => self.push(Item::Leaf(index, name, syntax)),
                    None => {
                        self.warn_unknown(index, &syntax.name);
                        self.push(Item::Line(index));
                    }
                },
                FenceLine::Text => self.push(Item::Line(index)),
            }
        }

        while self.stack.len() > 1 {
            self.dissolve_top();
        }

        let root = self.stack.pop().unwrap_or_default();
        self.segments(root.items)
    }

    fn push(&mut self, item: Item) {
        if let Some(top) = self.stack.last_mut() {
            top.items.push(item);
        }
    }

    fn closes_open_frame(&self, length: usize) -> bool {
        self.stack
            .iter()
            .skip(1)
            .any(|frame| frame.fence_length() == length)
    }

    /// Closes the outermost open container whose opener has `length` colons.
    fn close(&mut self, index: usize, length: usize) {
        let Some(depth) = self
            .stack
            .iter()
            .skip(1)
            .position(|frame| frame.fence_length() == length)
            .map(|position| position + 1)
        else {
            self.diagnostics.add_warning(ParseWarning::StrayClosingFence {
                location: location(index),
                fence_length: length,
            });
            self.push(Item::Line(index));
            return;
        };

        while self.stack.len() > depth + 1 {
            self.dissolve_top();
        }
        let Some(Frame {
            opener: Some(opener),
            items,
        }) = self.stack.pop()
        else {
            return;
        };

        if opener.name.is_some() {
            self.push(Item::Container(Frame {
                opener: Some(opener),
                items,
            }));
            return;
        }
        self.warn_unknown(opener.line, &opener.syntax.name);
        self.push(Item::Line(opener.line));
        for item in items {
            self.push(item);
        }
        self.push(Item::Line(index));
    }

    /// Pops the innermost frame as unterminated: its opener becomes literal
    /// and its content moves to the parent.
    fn dissolve_top(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        if let Some(opener) = frame.opener {
            log::debug!(
                "unterminated directive '{}' at line {}",
                opener.syntax.name,
                opener.line + 1
            );
            self.diagnostics.add_warning(ParseWarning::UnterminatedDirective {
                location: location(opener.line),
                name: opener.syntax.name.clone(),
                fence_length: opener.syntax.colons,
            });
            self.push(Item::Line(opener.line));
        }
        for item in frame.items {
            self.push(item);
        }
    }

    fn warn_unknown(&mut self, index: usize, name: &str) {
        self.diagnostics.add_warning(ParseWarning::UnknownDirective {
            location: location(index),
            name: name.to_string(),
        });
    }

    fn segments(&self, items: Vec<Item>) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut start = 0;

        for item in items {
            match item {
                Item::Line(index) => {
                    if text.is_empty() {
                        start = index;
                    }
                    text.push_str(self.lines[index]);
                }
                Item::Leaf(index, name, syntax) => {
                    flush_text(&mut segments, &mut text, start);
                    segments.push(Segment::Leaf {
                        name,
                        syntax,
                        line: index + 1,
                    });
                }
                Item::Container(frame) => {
                    flush_text(&mut segments, &mut text, start);
                    let Some(Opener {
                        line,
                        syntax,
                        name: Some(name),
                    }) = frame.opener
                    else {
                        continue;
                    };
                    segments.push(Segment::Container {
                        name,
                        syntax,
                        line: line + 1,
                        children: self.segments(frame.items),
                    });
                }
            }
        }
        flush_text(&mut segments, &mut text, start);
        segments
    }
}

fn flush_text(segments: &mut Vec<Segment>, text: &mut String, start: usize) {
    if text.is_empty() {
        return;
    }
    segments.push(Segment::Markdown {
        text: std::mem::take(text),
        line: start + 1,
    });
}

fn location(index: usize) -> SourceLocation {
    SourceLocation::new(index + 1, 1)
}

struct Builder {
    markdown: markdown::ParseOptions,
    inline_enabled: bool,
    definition_suffix: String,
    inline_directives: Vec<Directive>,
    definitions: HashMap<String, mdast::Definition>,
    footnotes: Vec<mdast::FootnoteDefinition>,
    footnote_ids: HashSet<String>,
    diagnostics: ParseDiagnostics,
}

impl Builder {
    fn new(options: &ParseOptions, diagnostics: ParseDiagnostics) -> Self {
        Self {
            markdown: options.to_markdown(),
            inline_enabled: options.directives,
            definition_suffix: String::new(),
            inline_directives: Vec::new(),
            definitions: HashMap::new(),
            footnotes: Vec::new(),
            footnote_ids: HashSet::new(),
            diagnostics,
        }
    }

    /// Gathers definition sources from every Markdown segment so that each
    /// separately parsed chunk can resolve references defined elsewhere.
    fn collect_definitions(&mut self, segments: &[Segment]) {
        fn walk(
            segments: &[Segment],
            out: &mut Vec<String>,
            count: &mut usize,
            options: &markdown::ParseOptions,
        ) {
            for segment in segments {
                match segment {
                    Segment::Markdown { text, .. } => {
                        *count += 1;
                        for source in definition_sources(text, options) {
                            if !out.contains(&source) {
                                out.push(source);
                            }
                        }
                    }
                    Segment::Container { children, .. } => walk(children, out, count, options),
                    Segment::Leaf { .. } => {}
                }
            }
        }

        let mut sources = Vec::new();
        let mut count = 0;
        walk(segments, &mut sources, &mut count, &self.markdown);
        if count > 1 {
            self.definition_suffix = sources.join("\n\n");
        }
    }

    fn build(&mut self, segments: Vec<Segment>) -> Vec<Block> {
        let mut blocks = Vec::new();
        for segment in segments {
            match segment {
                Segment::Markdown { text, line } => self.parse_chunk(&text, line, &mut blocks),
                Segment::Leaf { name, syntax, line } => {
                    blocks.push(Block::Directive(self.directive(
                        DirectiveKind::Leaf,
                        name,
                        syntax,
                        Vec::new(),
                        line,
                    )));
                }
                Segment::Container {
                    name,
                    syntax,
                    line,
                    children,
                } => {
                    let children = self.build(children);
                    blocks.push(Block::Directive(self.directive(
                        DirectiveKind::Container,
                        name,
                        syntax,
                        children,
                        line,
                    )));
                }
            }
        }
        blocks
    }

    fn directive(
        &self,
        kind: DirectiveKind,
        name: DirectiveName,
        syntax: DirectiveSyntax,
        children: Vec<Block>,
        line: usize,
    ) -> Directive {
        Directive {
            kind,
            name,
            label: syntax
                .label
                .as_deref()
                .map(|label| parse_label(label, &self.markdown)),
            attributes: syntax.attributes,
            children,
            fence_length: syntax.colons,
            line,
        }
    }

    fn parse_chunk(&mut self, text: &str, line: usize, blocks: &mut Vec<Block>) {
        let base = self.inline_directives.len();
        let (mut source, masked) = if self.inline_enabled {
            let masked = mask_inline_directives(text, base);
            for name in &masked.unknown {
                self.diagnostics.add_warning(ParseWarning::UnknownDirective {
                    location: SourceLocation::new(line, 1),
                    name: name.clone(),
                });
            }
            (masked.text, masked.directives)
        } else {
            (text.to_string(), Vec::new())
        };

        if !self.definition_suffix.is_empty() && source.contains('[') && !ends_in_code(&source) {
            source.push_str("\n\n");
            source.push_str(&self.definition_suffix);
        }

        let mut root = match parse_mdast_with_options(&source, &self.markdown) {
            Ok(root) => root,
            Err(err) => {
                log::warn!("markdown adapter rejected chunk at line {line}: {err}");
                self.diagnostics.add_warning(ParseWarning::SuspiciousMarkup {
                    location: SourceLocation::new(line, 1),
                    message: err.to_string(),
                });
                blocks.push(Block::Paragraph(mdast::Paragraph {
                    children: vec![Node::Text(mdast::Text {
                        value: text.to_string(),
                        position: None,
                    })],
                    position: None,
                }));
                return;
            }
        };

        let raws: Vec<String> = masked.iter().map(|directive| directive.raw.clone()).collect();
        splice_markers(&mut root, &|index| {
            index
                .checked_sub(base)
                .and_then(|offset| raws.get(offset))
                .cloned()
        });
        self.register_inline(masked, line);

        let Node::Root(root) = root else {
            return;
        };
        for node in root.children {
            self.collect_references(&node);
            if !matches!(node, Node::Definition(_) | Node::FootnoteDefinition(_)) {
                blocks.push(Block::from(node));
            }
        }
    }

    fn register_inline(&mut self, masked: Vec<MaskedDirective>, line: usize) {
        for MaskedDirective { name, syntax, .. } in masked {
            let directive = self.directive(DirectiveKind::Text, name, syntax, Vec::new(), line);
            self.inline_directives.push(directive);
        }
    }

    fn collect_references(&mut self, node: &Node) {
        match node {
            Node::Definition(definition) => {
                self.definitions
                    .entry(definition.identifier.clone())
                    .or_insert_with(|| definition.clone());
            }
            Node::FootnoteDefinition(footnote) => {
                if self.footnote_ids.insert(footnote.identifier.clone()) {
                    self.footnotes.push(footnote.clone());
                }
            }
            _ => {}
        }
        if let Some(children) = node.children() {
            for child in children {
                self.collect_references(child);
            }
        }
    }
}

/// Whether a fenced code block is still open at the end of `source`.
fn ends_in_code(source: &str) -> bool {
    let mut fences = CodeFenceTracker::new();
    for line in source.split_inclusive('\n') {
        fences.observe(line);
    }
    fences.is_open()
}
