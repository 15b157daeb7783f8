use std::collections::HashSet;
use std::sync::Arc;

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::{Error, Result};
use crate::fetch::Fetcher;
use crate::model::{checked_depth, Comment, Source, Thread};
use crate::provider::{ItemId, Provider};
use crate::scrape::{first_html, first_text, selector, text};

pub const HN_ITEM_URL: &str = "https://news.ycombinator.com/item";

/// Pixels of spacer image per nesting level on legacy item pages.
const INDENT_WIDTH: i64 = 40;

static URL_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"id=(\d+)").expect("valid url id regex"));
static REFERENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https://news\.ycombinator\.com/item\?id=(\d+)").expect("valid reference regex")
});

static STORY_ROW: Lazy<Selector> = Lazy::new(|| selector("tr.athing:not(.comtr)"));
static TITLE_LINK: Lazy<Selector> = Lazy::new(|| selector(".titleline > a, a.storylink"));
static SUBTEXT: Lazy<Selector> = Lazy::new(|| selector(".subtext"));
static TOPTEXT: Lazy<Selector> = Lazy::new(|| selector(".toptext"));
static COMMENT_ROW: Lazy<Selector> = Lazy::new(|| selector("tr.athing.comtr"));
static INDENT_CELL: Lazy<Selector> = Lazy::new(|| selector("td.ind"));
static INDENT_IMG: Lazy<Selector> = Lazy::new(|| selector(".ind img"));
static USER: Lazy<Selector> = Lazy::new(|| selector(".hnuser"));
static AGE: Lazy<Selector> = Lazy::new(|| selector(".age"));
static COMMTEXT: Lazy<Selector> = Lazy::new(|| selector(".commtext"));

pub struct HackerNews {
    fetcher: Arc<Fetcher>,
}

impl HackerNews {
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        Self { fetcher }
    }

    pub fn item_url(id: u64) -> String {
        format!("{HN_ITEM_URL}?id={id}")
    }
}

impl Provider for HackerNews {
    fn name(&self) -> &'static str {
        "Hacker News"
    }

    fn source(&self) -> Source {
        Source::HackerNews
    }

    fn is_match(&self, url: &str) -> bool {
        url.contains("news.ycombinator.com") || url.contains("ycombinator.com")
    }

    fn extract_id(&self, url: &str) -> Result<ItemId> {
        capture_id(&URL_ID_RE, url)
    }

    fn extract_id_from_reference(&self, text: &str) -> Result<ItemId> {
        capture_id(&REFERENCE_RE, text)
    }

    fn fetch_thread(&self, id: &ItemId) -> Result<Thread> {
        let ItemId::Number(id) = id else {
            return Err(Error::Malformed(format!("hacker news ids are numeric: {id}")));
        };
        let page = self.fetcher.get_text(&Self::item_url(*id))?;
        parse_thread(&page)
    }
}

fn capture_id(re: &Regex, haystack: &str) -> Result<ItemId> {
    let token = re
        .captures(haystack)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| Error::NotFound(haystack.to_string()))?
        .as_str();
    token
        .parse::<u64>()
        .map(ItemId::Number)
        .map_err(|_| Error::Malformed(token.to_string()))
}

/// Extracts a thread from an item page. Comments come back flat, in page
/// order, each carrying its indentation depth.
pub fn parse_thread(page: &str) -> Result<Thread> {
    let doc = Html::parse_document(page);
    let root = doc.root_element();

    let story = root
        .select(&STORY_ROW)
        .next()
        .ok_or_else(|| Error::ParseFailed("hacker news page has no story row".into()))?;

    let mut thread = Thread {
        source: Source::HackerNews,
        ..Thread::default()
    };

    if let Some(link) = story.select(&TITLE_LINK).next() {
        thread.title = text(&link);
        let href = link.value().attr("href").unwrap_or_default();
        // Self posts link to their own item page with a relative url.
        if !href.starts_with("item?id=") {
            thread.url = href.to_string();
        }
    }

    if let Some(subtext) = root.select(&SUBTEXT).next() {
        thread.author = first_text(&subtext, &USER);
        thread.time = first_text(&subtext, &AGE);
    }

    thread.content = first_html(&root, &TOPTEXT);

    let mut seen = HashSet::new();
    for row in root.select(&COMMENT_ROW) {
        let Some(comment) = parse_comment(&row)? else {
            continue;
        };
        if !seen.insert(comment.id.clone()) {
            warn!("hacker news: duplicate comment {} dropped", comment.id);
            continue;
        }
        thread.comments.push(comment);
    }

    Ok(thread)
}

fn parse_comment(row: &ElementRef<'_>) -> Result<Option<Comment>> {
    let Some(id) = row.value().attr("id").filter(|id| id.parse::<u64>().is_ok()) else {
        debug!("hacker news: comment row without numeric id skipped");
        return Ok(None);
    };

    let author = first_text(row, &USER);
    let content = first_html(row, &COMMTEXT);
    if author.is_empty() || content.is_empty() {
        debug!("hacker news: dead or deleted comment {id} skipped");
        return Ok(None);
    }

    Ok(Some(Comment {
        id: id.to_string(),
        author,
        time: first_text(row, &AGE),
        content,
        depth: checked_depth(raw_depth(row))?,
        children: Vec::new(),
    }))
}

fn raw_depth(row: &ElementRef<'_>) -> i64 {
    if let Some(level) = row
        .select(&INDENT_CELL)
        .next()
        .and_then(|cell| cell.value().attr("indent"))
        .and_then(|value| value.trim().parse::<i64>().ok())
    {
        return level;
    }

    row.select(&INDENT_IMG)
        .next()
        .and_then(|img| img.value().attr("width"))
        .and_then(|width| width.trim().parse::<i64>().ok())
        .map(|width| width / INDENT_WIDTH)
        .unwrap_or(0)
}
