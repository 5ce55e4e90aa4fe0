//! Node and block rendering.

use litemark_core::{Block, Directive, DirectiveName, ParseWarning, SourceLocation, reference_index};
use markdown::mdast::{self, AlignKind, Node};

use super::context::{Context, Scope, sanitize_footnote_id};
use crate::presentation::{present, safe_url};

/// Renders blocks in order.
pub fn render_blocks(blocks: &[Block], ctx: &mut Context) {
    for block in blocks {
        render_block(block, ctx);
    }
}

/// Renders one document block.
pub fn render_block(block: &Block, ctx: &mut Context) {
    match block {
        Block::Paragraph(para) => render_paragraph(para, ctx),
        Block::Heading(heading) => render_heading(heading, ctx),
        Block::List(list) => render_list(list, ctx),
        Block::Code(code) => render_code(code, ctx),
        Block::Html(html) => render_html(html, ctx),
        Block::Directive(directive) => render_directive(directive, ctx),
        Block::Other(node) => render_node(node, ctx),
    }
}

/// Renders a recognized directive through the presentation table.
pub fn render_directive(directive: &Directive, ctx: &mut Context) {
    if directive.name == DirectiveName::Button && ctx.is_in_link() {
        render_label(directive, ctx);
        return;
    }
    let element = present(directive);
    for attribute in &element.dropped {
        log::debug!(
            "dropped attribute '{}' on {} directive at line {}",
            attribute,
            directive.name,
            directive.line
        );
        ctx.warn(ParseWarning::DroppedAttribute {
            location: SourceLocation::new(directive.line, 1),
            directive: directive.name.to_string(),
            attribute: attribute.clone(),
        });
    }

    ctx.push_raw("<");
    ctx.push_raw(element.tag);
    ctx.push_attr("class", &element.class);
    for (name, value) in &element.attributes {
        ctx.push_attr(name, value);
    }
    ctx.push_raw(">");

    if directive.name == DirectiveName::Button {
        ctx.enter(Scope::Link);
        render_label(directive, ctx);
        render_children(directive, ctx);
        ctx.exit();
    } else if directive.children.is_empty() {
        render_label(directive, ctx);
    } else {
        if directive.label.is_some() {
            ctx.push_raw("<p>");
            render_label(directive, ctx);
            ctx.push_raw("</p>");
        }
        render_children(directive, ctx);
    }

    ctx.push_raw("</");
    ctx.push_raw(element.tag);
    ctx.push_raw(">");
}

fn render_label(directive: &Directive, ctx: &mut Context) {
    if let Some(label) = &directive.label {
        for node in label {
            render_node(node, ctx);
        }
    }
}

fn render_children(directive: &Directive, ctx: &mut Context) {
    ctx.enter(Scope::Directive);
    render_blocks(&directive.children, ctx);
    ctx.exit();
}

/// Renders a list node as `<ul>` or `<ol>`.
fn render_list(list: &mdast::List, ctx: &mut Context) {
    let tag = if list.ordered { "ol" } else { "ul" };
    ctx.push_raw("<");
    ctx.push_raw(tag);
    if let Some(start) = list.start.filter(|start| list.ordered && *start != 1) {
        ctx.push_attr("start", &start.to_string());
    }
    ctx.push_raw(">");
    ctx.enter(Scope::List {
        spread: list.spread,
    });

    for child in &list.children {
        render_node(child, ctx);
    }

    ctx.exit();
    ctx.push_raw(&format!("</{}>", tag));
}

/// Renders a list item; GFM task items get a disabled checkbox.
fn render_list_item(item: &mdast::ListItem, ctx: &mut Context) {
    match item.checked {
        Some(checked) => {
            ctx.push_raw("<li class=\"task-list-item\">");
            ctx.push_raw(if checked {
                "<input type=\"checkbox\" disabled checked /> "
            } else {
                "<input type=\"checkbox\" disabled /> "
            });
        }
        None => ctx.push_raw("<li>"),
    }

    for child in &item.children {
        render_node(child, ctx);
    }

    ctx.push_raw("</li>");
}

fn render_table_row(row: &mdast::TableRow, ctx: &mut Context, is_header: bool, aligns: &[AlignKind]) {
    ctx.push_raw("<tr>");
    ctx.enter(Scope::TableRow);

    for (i, cell) in row.children.iter().enumerate() {
        let Node::TableCell(cell) = cell else {
            continue;
        };
        let tag = if is_header { "th" } else { "td" };
        let align = match aligns.get(i) {
            Some(AlignKind::Left) => " align=\"left\"",
            Some(AlignKind::Right) => " align=\"right\"",
            Some(AlignKind::Center) => " align=\"center\"",
            Some(AlignKind::None) | None => "",
        };

        ctx.push_raw(&format!("<{}{}>", tag, align));
        ctx.enter(Scope::TableCell);
        for child in &cell.children {
            render_node(child, ctx);
        }
        ctx.exit();
        ctx.push_raw(&format!("</{}>", tag));
    }

    ctx.exit();
    ctx.push_raw("</tr>");
}

/// Renders a table with `<thead>` and, when there are body rows, `<tbody>`.
fn render_table(table: &mdast::Table, ctx: &mut Context) {
    ctx.enter(Scope::Table);
    ctx.push_raw("<table><thead>");
    if let Some(Node::TableRow(row)) = table.children.first() {
        render_table_row(row, ctx, true, &table.align);
    }
    ctx.push_raw("</thead>");

    if table.children.len() > 1 {
        ctx.push_raw("<tbody>");
        for row in table.children.iter().skip(1) {
            if let Node::TableRow(row) = row {
                render_table_row(row, ctx, false, &table.align);
            }
        }
        ctx.push_raw("</tbody>");
    }

    ctx.push_raw("</table>");
    ctx.exit();
}

/// Renders a paragraph, without `<p>` inside tight lists.
fn render_paragraph(para: &mdast::Paragraph, ctx: &mut Context) {
    let in_tight_list = ctx.is_in_tight_list();
    if !in_tight_list {
        ctx.push_raw("<p>");
    }
    ctx.enter(Scope::Paragraph);

    for child in &para.children {
        render_node(child, ctx);
    }

    ctx.exit();
    if !in_tight_list {
        ctx.push_raw("</p>");
    }
}

fn render_heading(heading: &mdast::Heading, ctx: &mut Context) {
    let tag = format!("h{}", heading.depth);
    ctx.push_raw(&format!("<{}>", tag));
    for child in &heading.children {
        render_node(child, ctx);
    }
    ctx.push_raw(&format!("</{}>", tag));
}

fn render_anchor(url: &str, title: Option<&str>, children: &[Node], ctx: &mut Context) {
    // <a> does not nest; the inner link degrades to its text
    if ctx.is_in_link() {
        for child in children {
            render_node(child, ctx);
        }
        return;
    }

    ctx.push_raw("<a");
    ctx.push_attr("href", safe_url(url));
    if let Some(title) = title {
        ctx.push_attr("title", title);
    }
    ctx.push_raw(">");
    ctx.enter(Scope::Link);
    for child in children {
        render_node(child, ctx);
    }
    ctx.exit();
    ctx.push_raw("</a>");
}

fn render_link_reference(reference: &mdast::LinkReference, ctx: &mut Context) {
    let document = ctx.document();
    match document.definition(&reference.identifier) {
        Some(definition) => render_anchor(
            &definition.url,
            definition.title.as_deref(),
            &reference.children,
            ctx,
        ),
        None => {
            ctx.push_text("[");
            for child in &reference.children {
                render_node(child, ctx);
            }
            ctx.push_text("]");
        }
    }
}

fn render_image(url: &str, alt: &str, title: Option<&str>, ctx: &mut Context) {
    ctx.push_raw("<img");
    ctx.push_attr("src", safe_url(url));
    ctx.push_attr("alt", alt);
    if let Some(title) = title {
        ctx.push_attr("title", title);
    }
    ctx.push_raw(" />");
}

fn render_image_reference(reference: &mdast::ImageReference, ctx: &mut Context) {
    let document = ctx.document();
    match document.definition(&reference.identifier) {
        Some(definition) => render_image(
            &definition.url,
            &reference.alt,
            definition.title.as_deref(),
            ctx,
        ),
        None => {
            ctx.push_text("![");
            ctx.push_text(&reference.alt);
            ctx.push_text("]");
        }
    }
}

fn render_code(code: &mdast::Code, ctx: &mut Context) {
    ctx.push_raw("<pre><code");
    if let Some(lang) = &code.lang {
        ctx.push_attr("class", &format!("language-{}", lang));
    }
    ctx.push_raw(">");
    ctx.push_text(&code.value);
    if !code.value.is_empty() {
        ctx.push_raw("\n");
    }
    ctx.push_raw("</code></pre>");
}

/// Renders raw HTML, either as passthrough or escaped based on options.
fn render_html(html: &mdast::Html, ctx: &mut Context) {
    if ctx.raw_html_allowed() {
        ctx.push_raw(&html.value);
    } else {
        log::debug!("raw HTML escaped: {}", html.value);
        ctx.push_text(&html.value);
    }
}

fn render_blockquote(quote: &mdast::Blockquote, ctx: &mut Context) {
    ctx.push_raw("<blockquote>");
    for child in &quote.children {
        render_node(child, ctx);
    }
    ctx.push_raw("</blockquote>");
}

/// Renders a footnote reference as `<sup><a href="#user-content-fn-id">n</a></sup>`.
///
/// Repeated references to the same footnote get suffixed ids
/// (`fnref-id`, `fnref-id-2`, ...).
fn render_footnote_reference(reference: &mdast::FootnoteReference, ctx: &mut Context) {
    let safe_id = sanitize_footnote_id(&reference.identifier);
    let (ordinal, count) = ctx.reference_footnote(&reference.identifier);
    let suffix = if count == 1 {
        String::new()
    } else {
        format!("-{}", count)
    };

    ctx.push_raw("<sup><a href=\"#user-content-fn-");
    ctx.push_raw(&safe_id);
    ctx.push_raw("\" id=\"user-content-fnref-");
    ctx.push_raw(&safe_id);
    ctx.push_raw(&suffix);
    ctx.push_raw("\" data-footnote-ref aria-describedby=\"footnote-label\">");
    ctx.push_raw(&ordinal.to_string());
    ctx.push_raw("</a></sup>");
}

/// Appends the single footnotes section, in first-reference order.
///
/// Footnotes referenced only from other footnotes are picked up as the
/// list grows.
pub fn render_footnotes(ctx: &mut Context) {
    let document = ctx.document();
    let mut items = String::new();
    let mut index = 0;

    while let Some(identifier) = ctx.footnote_at(index) {
        index += 1;
        let Some(definition) = document
            .footnotes
            .iter()
            .find(|footnote| footnote.identifier == identifier)
        else {
            continue;
        };

        let saved = ctx.take_html();
        for child in &definition.children {
            render_node(child, ctx);
        }
        let mut body = ctx.restore_html(saved);

        let safe_id = sanitize_footnote_id(&identifier);
        let mut backrefs = String::new();
        for n in 1..=ctx.footnote_references(&identifier) {
            let suffix = if n == 1 { String::new() } else { format!("-{}", n) };
            backrefs.push_str(&format!(
                " <a href=\"#user-content-fnref-{}{}\" data-footnote-backref class=\"data-footnote-backref\" aria-label=\"Back to reference {}\">↩</a>",
                safe_id, suffix, index
            ));
        }
        match body.rfind("</p>") {
            Some(at) if at + "</p>".len() == body.len() => body.insert_str(at, &backrefs),
            _ => body.push_str(&backrefs),
        }

        items.push_str(&format!("<li id=\"user-content-fn-{}\">", safe_id));
        items.push_str(&body);
        items.push_str("</li>");
    }

    if items.is_empty() {
        return;
    }
    ctx.push_raw("<section data-footnotes class=\"footnotes\"><h2 class=\"sr-only\" id=\"footnote-label\">Footnotes</h2><ol>");
    ctx.push_raw(&items);
    ctx.push_raw("</ol></section>");
}

/// Inline directive stand-ins render the directive they point at.
fn render_text_element(element: &mdast::MdxJsxTextElement, ctx: &mut Context) {
    let document = ctx.document();
    match reference_index(element).and_then(|index| document.inline_directives.get(index)) {
        Some(directive) => render_directive(directive, ctx),
        None => {
            for child in &element.children {
                render_node(child, ctx);
            }
        }
    }
}

fn render_wrapped(tag: &str, children: &[Node], ctx: &mut Context) {
    ctx.push_raw(&format!("<{}>", tag));
    for child in children {
        render_node(child, ctx);
    }
    ctx.push_raw(&format!("</{}>", tag));
}

/// Recursively renders an AST node to HTML.
pub fn render_node(node: &Node, ctx: &mut Context) {
    match node {
        Node::Root(root) => {
            for child in &root.children {
                render_node(child, ctx);
            }
        }
        Node::Text(text) => ctx.push_text(&text.value),
        Node::Paragraph(para) => render_paragraph(para, ctx),
        Node::Heading(heading) => render_heading(heading, ctx),
        Node::Link(link) => render_anchor(&link.url, link.title.as_deref(), &link.children, ctx),
        Node::LinkReference(reference) => render_link_reference(reference, ctx),
        Node::Strong(strong) => render_wrapped("strong", &strong.children, ctx),
        Node::Emphasis(emphasis) => render_wrapped("em", &emphasis.children, ctx),
        Node::Delete(delete) => render_wrapped("del", &delete.children, ctx),
        Node::InlineCode(code) => {
            ctx.push_raw("<code>");
            ctx.push_text(&code.value);
            ctx.push_raw("</code>");
        }
        Node::Break(_) => ctx.push_raw("<br />"),
        Node::List(list) => render_list(list, ctx),
        Node::ListItem(item) => render_list_item(item, ctx),
        Node::Code(code) => render_code(code, ctx),
        Node::Blockquote(quote) => render_blockquote(quote, ctx),
        Node::Image(image) => render_image(&image.url, &image.alt, image.title.as_deref(), ctx),
        Node::ImageReference(reference) => render_image_reference(reference, ctx),
        Node::ThematicBreak(_) => ctx.push_raw("<hr />"),
        Node::Html(html) => render_html(html, ctx),
        Node::Table(table) => render_table(table, ctx),
        Node::TableRow(_) | Node::TableCell(_) => {}
        Node::FootnoteReference(reference) => render_footnote_reference(reference, ctx),
        Node::MdxJsxTextElement(element) => render_text_element(element, ctx),
        // collected document-wide during the transform
        Node::Definition(_) | Node::FootnoteDefinition(_) => {}
        _ => {
            log::warn!("Unhandled markdown node type: {:?}", node);
        }
    }
}
