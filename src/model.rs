use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    #[serde(rename = "hn")]
    HackerNews,
    Lobsters,
    #[default]
    Generic,
}

impl Source {
    /// Class token that themes the rendered thread container.
    pub fn theme(&self) -> &'static str {
        match self {
            Source::HackerNews => "hn",
            Source::Lobsters => "lobsters",
            Source::Generic => "generic",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Source::HackerNews => "Hacker News",
            Source::Lobsters => "Lobste.rs",
            Source::Generic => "Discussion",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Comment {
    pub id: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub depth: usize,
    #[serde(default)]
    pub children: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Thread {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Thread {
    pub fn comment_count(&self) -> usize {
        count_all(&self.comments)
    }
}

/// Number of comments in the forest rooted at `comments`, replies included.
pub fn count_all(comments: &[Comment]) -> usize {
    comments.len()
        + comments
            .iter()
            .map(|comment| count_all(&comment.children))
            .sum::<usize>()
}

/// Converts a depth read from a source page into a canonical depth.
pub fn checked_depth(raw: i64) -> Result<usize> {
    usize::try_from(raw)
        .map_err(|_| Error::MalformedInput(format!("negative comment depth {raw}")))
}
