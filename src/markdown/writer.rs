//! Renders document nodes back to markdown.

use crate::directive::Node;

/// Renders nodes produced by a block-level directive.
///
/// The result is empty for an empty node list and otherwise ends with a
/// newline, so it can replace the directive's source lines directly.
#[must_use]
pub fn render_block(nodes: &[Node]) -> String {
    let mut out = render_inline(nodes);
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Renders nodes produced by a role, inside a line of text.
#[must_use]
pub fn render_inline(nodes: &[Node]) -> String {
    nodes.iter().map(render_node).collect()
}

fn render_node(node: &Node) -> String {
    match node {
        Node::Text(text) => text.clone(),
        Node::Reference {
            title,
            uri,
        } => format!("[{}]({})", escape_link_text(title), link_destination(uri)),
        Node::Literal {
            language,
            content,
            caption,
            ..
        } => {
            let mut out = String::new();
            if let Some(caption) = caption {
                out.push_str(&format!("*{caption}*\n\n"));
            }
            let fence = fence_for(content);
            out.push_str(&fence);
            if let Some(language) = language {
                out.push_str(language);
            }
            out.push('\n');
            out.push_str(content);
            if !content.is_empty() && !content.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&fence);
            out.push('\n');
            out
        }
    }
}

/// A backtick fence longer than any backtick run inside `content`.
fn fence_for(content: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in content.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}

fn escape_link_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn link_destination(uri: &str) -> String {
    if uri.contains([' ', '(', ')']) {
        format!("<{uri}>")
    } else {
        uri.to_string()
    }
}
