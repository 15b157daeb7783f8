use std::sync::Arc;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::{Error, Result};
use crate::fetch::Fetcher;
use crate::model::{Comment, Source, Thread};
use crate::provider::{ItemId, Provider};
use crate::scrape::{child_elements, first_html, first_text, has_class, selector, text, time_label};

pub const LOBSTERS_STORY_URL: &str = "https://lobste.rs/s";

static STORY_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://lobste\.rs/s/([a-z0-9]+)").expect("valid story url regex"));
static REFERENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://lobste\.rs/s/([a-z0-9]+)").expect("valid reference regex"));

static STORY: Lazy<Selector> = Lazy::new(|| selector("li.story"));
static STORY_TITLE: Lazy<Selector> = Lazy::new(|| selector(".link a"));
static STORY_AUTHOR: Lazy<Selector> = Lazy::new(|| selector(".byline .u-author"));
static BYLINE_TIME: Lazy<Selector> = Lazy::new(|| selector(".byline time"));
static STORY_TEXT: Lazy<Selector> = Lazy::new(|| selector(".story_content .story_text"));
static STORY_COMMENTS: Lazy<Selector> = Lazy::new(|| selector("li#story_comments ol.comments"));
static ANY_COMMENTS: Lazy<Selector> = Lazy::new(|| selector("ol.comments"));
static COMMENT_DIV: Lazy<Selector> = Lazy::new(|| selector("div[data-shortid]"));
static AUTHOR_LINK: Lazy<Selector> = Lazy::new(|| selector("div.details div.byline a[href^='/~']"));
static COMMENT_TIME: Lazy<Selector> = Lazy::new(|| selector("div.details div.byline time"));
static COMMENT_TEXT: Lazy<Selector> = Lazy::new(|| selector("div.details div.comment_text"));
static IMG: Lazy<Selector> = Lazy::new(|| selector("img"));

pub struct Lobsters {
    fetcher: Arc<Fetcher>,
}

impl Lobsters {
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        Self { fetcher }
    }

    pub fn story_url(short_id: &str) -> String {
        format!("{LOBSTERS_STORY_URL}/{short_id}")
    }
}

impl Provider for Lobsters {
    fn name(&self) -> &'static str {
        "Lobste.rs"
    }

    fn source(&self) -> Source {
        Source::Lobsters
    }

    fn is_match(&self, url: &str) -> bool {
        STORY_URL_RE.is_match(url)
    }

    fn extract_id(&self, url: &str) -> Result<ItemId> {
        capture_short_id(&STORY_URL_RE, url)
    }

    fn extract_id_from_reference(&self, text: &str) -> Result<ItemId> {
        capture_short_id(&REFERENCE_RE, text)
    }

    fn fetch_thread(&self, id: &ItemId) -> Result<Thread> {
        let url = Self::story_url(&id.to_string());
        let page = self.fetcher.get_text(&url)?;
        parse_thread(&page, &url)
    }
}

fn capture_short_id(re: &Regex, haystack: &str) -> Result<ItemId> {
    re.captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|token| ItemId::Short(token.as_str().to_string()))
        .ok_or_else(|| Error::NotFound(haystack.to_string()))
}

/// Extracts a thread from a story page. Replies are nested under their
/// parents the way the page nests its comment lists.
pub fn parse_thread(page: &str, url: &str) -> Result<Thread> {
    let doc = Html::parse_document(page);
    let root = doc.root_element();

    let story = root
        .select(&STORY)
        .next()
        .ok_or_else(|| Error::ParseFailed("lobsters page has no story".into()))?;

    let mut thread = Thread {
        url: url.to_string(),
        source: Source::Lobsters,
        title: first_text(&story, &STORY_TITLE),
        author: first_text(&story, &STORY_AUTHOR),
        time: story
            .select(&BYLINE_TIME)
            .next()
            .map(|time| time_label(&time))
            .unwrap_or_default(),
        content: first_html(&root, &STORY_TEXT),
        comments: Vec::new(),
    };

    let container = root
        .select(&STORY_COMMENTS)
        .next()
        .or_else(|| root.select(&ANY_COMMENTS).next());
    if let Some(list) = container {
        thread.comments = subtrees(&list)
            .filter_map(|item| parse_comment(&item, 0))
            .collect();
    }

    Ok(thread)
}

/// `li.comments_subtree` children of a comment list.
fn subtrees<'a>(list: &ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    child_elements(list).filter(|item| item.value().name() == "li" && has_class(item, "comments_subtree"))
}

fn parse_comment(item: &ElementRef<'_>, depth: usize) -> Option<Comment> {
    let body = item.select(&COMMENT_DIV).next()?;
    if has_class(&body, "comment_form_container") {
        return None;
    }
    let id = body
        .value()
        .attr("data-shortid")
        .filter(|id| !id.is_empty())?
        .to_string();

    // The avatar link also points at the user page; the name is the last plain one.
    let author = body
        .select(&AUTHOR_LINK)
        .filter(|link| link.select(&IMG).next().is_none())
        .last()
        .map(|link| text(&link))
        .unwrap_or_default();

    let time = body
        .select(&COMMENT_TIME)
        .next()
        .map(|time| time_label(&time))
        .unwrap_or_default();

    let mut comment = Comment {
        id,
        author,
        time,
        content: first_html(&body, &COMMENT_TEXT),
        depth,
        children: Vec::new(),
    };

    for list in child_elements(item)
        .filter(|child| child.value().name() == "ol" && has_class(child, "comments"))
    {
        for nested in subtrees(&list) {
            match parse_comment(&nested, depth + 1) {
                Some(reply) if reply.id == comment.id => {
                    debug!("lobsters: reply {} repeats its parent, skipped", reply.id);
                }
                Some(reply) => comment.children.push(reply),
                None => {}
            }
        }
    }

    Some(comment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::count_all;
    use crate::reconcile::{reconcile, CommentLayout};

    fn provider() -> Lobsters {
        Lobsters::new(Arc::new(Fetcher::new(Default::default()).unwrap()))
    }

    fn comment(id: &str, author: &str, body: &str, replies: &str) -> String {
        format!(
            r#"<li class="comments_subtree" id="c_{id}">
                <input type="checkbox" class="comment_folder_button" id="comment_folder_{id}">
                <div id="c_{id}" data-shortid="{id}" class="comment">
                  <div class="details">
                    <div class="byline">
                      <a href="/~{author}"><img class="avatar" src="/avatars/{author}-16.png"></a>
                      <a href="/~{author}">{author}</a>
                      <time title="2024-05-01 10:00:00 -0500" datetime="2024-05-01T10:00:00-05:00">2 hours ago</time>
                    </div>
                    <div class="comment_text">{body}</div>
                  </div>
                </div>
                <ol class="comments">{replies}</ol>
              </li>"#
        )
    }

    fn story_page(comments: &str) -> String {
        format!(
            r#"<html><body>
              <ol class="stories">
                <li id="story_abc123" data-shortid="abc123" class="story">
                  <div class="story_liner"><div class="details">
                    <span class="link"><a class="u-url" href="https://example.org/a">A story</a></span>
                    <div class="byline">
                      <a href="/~poster"><img class="avatar" src="/a.png"></a>
                      <a class="u-author h-card" href="/~poster">poster</a>
                      <time title="2024-05-01 08:00:00 -0500" datetime="2024-05-01T08:00:00-05:00">4 hours ago</time>
                    </div>
                  </div></div>
                </li>
              </ol>
              <div class="story_content"><div class="story_text"><p>Story body</p></div></div>
              <ol class="comments comments1">
                <li class="comments_subtree"><div class="comment comment_form_container" data-shortid="new"></div></li>
                <li id="story_comments"><ol class="comments">{comments}</ol></li>
              </ol>
            </body></html>"#
        )
    }

    #[test]
    fn matches_story_urls() {
        let lobsters = provider();
        assert!(lobsters.is_match("https://lobste.rs/s/abc123/some_title"));
        assert!(!lobsters.is_match("https://lobste.rs/t/rust"));
        assert!(!lobsters.is_match("https://news.ycombinator.com/item?id=1"));
    }

    #[test]
    fn extracts_short_ids() {
        let lobsters = provider();
        assert_eq!(
            lobsters.extract_id("https://lobste.rs/s/abc123/some_title").unwrap(),
            ItemId::Short("abc123".into())
        );
        assert!(matches!(
            lobsters.extract_id("https://lobste.rs/recent"),
            Err(Error::NotFound(_))
        ));
        assert_eq!(
            lobsters
                .extract_id_from_reference(r#"<a href="https://lobste.rs/s/xyz9">Comments</a>"#)
                .unwrap(),
            ItemId::Short("xyz9".into())
        );
    }

    #[test]
    fn parses_nested_comments() {
        let replies = comment("b2", "bob", "<p>reply</p>", &comment("c3", "carol", "deeper", ""));
        let page = story_page(&format!(
            "{}{}",
            comment("a1", "alice", "<p>top</p>", &replies),
            comment("d4", "dave", "second", "")
        ));
        let thread = parse_thread(&page, "https://lobste.rs/s/abc123").unwrap();

        assert_eq!(thread.source, Source::Lobsters);
        assert_eq!(thread.url, "https://lobste.rs/s/abc123");
        assert_eq!(thread.title, "A story");
        assert_eq!(thread.author, "poster");
        assert_eq!(thread.time, "2024-05-01 08:00:00 -0500");
        assert_eq!(thread.content, "<p>Story body</p>");

        assert_eq!(thread.comments.len(), 2);
        let top = &thread.comments[0];
        assert_eq!((top.id.as_str(), top.author.as_str(), top.depth), ("a1", "alice", 0));
        assert_eq!(top.content, "<p>top</p>");
        assert_eq!(top.time, "2024-05-01 10:00:00 -0500");
        assert_eq!(top.children[0].id, "b2");
        assert_eq!(top.children[0].depth, 1);
        assert_eq!(top.children[0].children[0].id, "c3");
        assert_eq!(top.children[0].children[0].depth, 2);
        assert_eq!(count_all(&thread.comments), 4);

        assert_eq!(CommentLayout::detect(&thread.comments), CommentLayout::Nested);
        assert_eq!(reconcile(thread.comments.clone()), thread.comments);
    }

    #[test]
    fn reply_repeating_parent_id_is_skipped() {
        let page = story_page(&comment("a1", "alice", "top", &comment("a1", "alice", "dup", "")));
        let thread = parse_thread(&page, "https://lobste.rs/s/abc123").unwrap();
        assert_eq!(thread.comments.len(), 1);
        assert!(thread.comments[0].children.is_empty());
    }

    #[test]
    fn falls_back_to_first_comment_list() {
        let page = story_page("").replace(
            r#"<li id="story_comments"><ol class="comments"></ol></li>"#,
            &comment("e5", "erin", "only", ""),
        );
        let thread = parse_thread(&page, "https://lobste.rs/s/abc123").unwrap();
        assert_eq!(thread.comments.len(), 1);
        assert_eq!(thread.comments[0].id, "e5");
        assert_eq!(thread.comments[0].author, "erin");
    }

    #[test]
    fn story_text_outside_story_content_is_ignored() {
        let page = story_page("").replace(
            r#"<div class="story_content">"#,
            r#"<div class="story_text"><p>sidebar</p></div><div class="story_content">"#,
        );
        let thread = parse_thread(&page, "https://lobste.rs/s/abc123").unwrap();
        assert_eq!(thread.content, "<p>Story body</p>");
    }

    #[test]
    fn story_without_comments() {
        let thread = parse_thread(&story_page(""), "https://lobste.rs/s/abc123").unwrap();
        assert!(thread.comments.is_empty());
    }

    #[test]
    fn page_without_story_fails_to_parse() {
        let err = parse_thread("<html><body><p>Sorry.</p></body></html>", "https://lobste.rs/s/x").err().unwrap();
        assert!(matches!(err, Error::ParseFailed(_)));
    }
}
