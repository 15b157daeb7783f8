use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::format::pluralize;
use crate::model::{count_all, Comment, Thread};
use crate::reconcile::reconcile_thread;

const ICON_EXPANDED: &str = r#"<span class="discussion-toggle-icon-expanded"><span class="icon"><svg width="1rem" height="1rem" fill="none" stroke="currentColor" viewBox="0 0 24 24"><path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="m6 9 6 6 6-6"/></svg></span></span>"#;
const ICON_COLLAPSED: &str = r#"<span class="discussion-toggle-icon-collapsed" style="display: none;"><span class="icon"><svg width="1rem" height="1rem" fill="none" stroke="currentColor" viewBox="0 0 24 24"><path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="m9 18 6-6-6-6"/></svg></span></span>"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub show_title: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { show_title: true }
    }
}

/// Renders canonical threads into one HTML fragment, whatever their source.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    options: RenderOptions,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Renders a thread whose comments are already nested.
    pub fn render(&self, thread: &Thread) -> String {
        let mut html = String::new();
        html.push_str(r#"<div class="discussion-thread discussion-"#);
        html.push_str(thread.source.theme());
        html.push_str(r#"">"#);

        if self.options.show_title {
            write_title(&mut html, thread);
        }
        write_meta(&mut html, thread);

        if !thread.content.is_empty() {
            html.push_str(r#"<div class="discussion-content mb-4">"#);
            html.push_str(&thread.content);
            html.push_str("</div>");
        }

        if !thread.comments.is_empty() {
            html.push_str("<hr>");
            html.push_str(r#"<div class="discussion-comments">"#);
            html.push_str(r#"<h3 class="mb-3">"#);
            html.push_str(&pluralize(count_all(&thread.comments), "comment"));
            html.push_str("</h3>");
            for comment in &thread.comments {
                write_comment(&mut html, comment, 0);
            }
            html.push_str("</div>");
        }

        html.push_str("</div>");
        html
    }

    /// Nests flat comments first, then renders.
    pub fn render_reconciled(&self, thread: Thread) -> String {
        self.render(&reconcile_thread(thread))
    }
}

fn write_title(html: &mut String, thread: &Thread) {
    if !thread.title.is_empty() {
        html.push_str(r#"<h1 class="discussion-title">"#);
        html.push_str(&encode_text(&thread.title));
        html.push_str("</h1>");
    }
    if !thread.url.is_empty() {
        let href = encode_double_quoted_attribute(&thread.url);
        html.push_str(r#"<div class="discussion-url"><a href=""#);
        html.push_str(&href);
        html.push_str(r#"" target="_blank" rel="noopener noreferrer">"#);
        html.push_str(&encode_text(&thread.url));
        html.push_str("</a></div>");
    }
}

fn write_meta(html: &mut String, thread: &Thread) {
    html.push_str(r#"<div class="discussion-meta text-muted mb-3">"#);
    if !thread.author.is_empty() {
        html.push_str(r#"by <span class="discussion-author">"#);
        html.push_str(&encode_text(&thread.author));
        html.push_str("</span>");
    }
    if !thread.time.is_empty() {
        html.push_str(r#" <span class="discussion-time">"#);
        html.push_str(&encode_text(&thread.time));
        html.push_str("</span>");
    }
    html.push_str("</div>");
}

/// `level` is the position in the rendered tree, not the source's `depth`.
fn write_comment(html: &mut String, comment: &Comment, level: usize) {
    html.push_str(r#"<div class="discussion-comment" data-comment-id=""#);
    html.push_str(&encode_double_quoted_attribute(&comment.id));
    html.push_str(r#"" data-level=""#);
    html.push_str(&level.to_string());
    html.push_str(r#"">"#);

    html.push_str(r#"<div class="discussion-comment-header">"#);
    html.push_str(r#"<button class="discussion-comment-toggle" onclick="discussionToggleComment(this)" title="Toggle this comment and its replies" data-expanded="true">"#);
    html.push_str(ICON_EXPANDED);
    html.push_str(ICON_COLLAPSED);
    html.push_str("</button>");
    html.push_str(r#" <span class="discussion-comment-author">"#);
    html.push_str(&encode_text(&comment.author));
    html.push_str("</span>");
    if !comment.time.is_empty() {
        html.push_str(r#" <span class="discussion-comment-time">"#);
        html.push_str(&encode_text(&comment.time));
        html.push_str("</span>");
    }
    html.push_str(r#" <span class="discussion-comment-separator">|</span> <button class="discussion-nav-btn discussion-nav-prev" onclick="discussionPrevComment(this)" title="Previous comment">prev</button>"#);
    html.push_str(r#" <span class="discussion-comment-separator">|</span> <button class="discussion-nav-btn discussion-nav-next" onclick="discussionNextComment(this)" title="Next comment">next</button>"#);
    html.push_str("</div>");

    html.push_str(r#"<div class="discussion-comment-body"><div class="discussion-comment-content">"#);
    html.push_str(&comment.content);
    html.push_str("</div></div>");

    if !comment.children.is_empty() {
        html.push_str(r#"<div class="discussion-comment-replies">"#);
        for child in &comment.children {
            write_comment(html, child, level + 1);
        }
        html.push_str("</div>");
    }

    html.push_str("</div>");
}
