//! Tagged text rendering of discussions for language-model consumption.
//!
//! Every line is unindented and sections nest as
//! `discussion > post, comments > comment > replies > reply`. Empty
//! `comments` and `replies` sections are left out entirely; bodies are always
//! emitted, even when empty.

use std::borrow::Cow;

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::escape::escape;

use crate::domain::discussion::{Comment, Discussion, Reply};

pub const DOCUMENT_SEPARATOR: &str = "\n\n---\n\n";

const MISSING_AUTHOR: &str = "ghost";

pub fn render_discussion(discussion: &Discussion) -> String {
    let mut lines = Vec::with_capacity(8 + discussion.comments.len() * 4);
    let category = discussion.category.as_deref().unwrap_or_default();
    lines.push(format!(
        r#"<discussion url="{}" number="{}" title="{}" category="{}">"#,
        escape(&discussion.url),
        discussion.number,
        escape(&discussion.title),
        escape(category),
    ));
    lines.push(format!(
        r#"<post author="{}" createdAt="{}">"#,
        author_attr(discussion.author_login.as_deref()),
        timestamp(discussion.created_at),
    ));
    lines.push(body_element(&discussion.body));
    lines.push("</post>".to_string());

    if !discussion.comments.is_empty() {
        lines.push(format!(r#"<comments count="{}">"#, discussion.comments.len()));
        for comment in &discussion.comments {
            push_comment(&mut lines, comment);
        }
        lines.push("</comments>".to_string());
    }

    lines.push("</discussion>".to_string());
    lines.join("\n")
}

fn push_comment(lines: &mut Vec<String>, comment: &Comment) {
    lines.push(format!(
        r#"<comment id="{}" author="{}" createdAt="{}">"#,
        escape(&comment.id),
        author_attr(comment.author_login.as_deref()),
        timestamp(comment.created_at),
    ));
    lines.push(body_element(&comment.body));
    if !comment.replies.is_empty() {
        lines.push(format!(r#"<replies count="{}">"#, comment.replies.len()));
        for reply in &comment.replies {
            push_reply(lines, reply);
        }
        lines.push("</replies>".to_string());
    }
    lines.push("</comment>".to_string());
}

fn push_reply(lines: &mut Vec<String>, reply: &Reply) {
    lines.push(format!(
        r#"<reply id="{}" author="{}" createdAt="{}" isMinimized="{}" minimizedReason="{}">"#,
        escape(&reply.id),
        author_attr(reply.author_login.as_deref()),
        timestamp(reply.created_at),
        reply.is_minimized,
        escape(reply.minimized_reason.as_deref().unwrap_or_default()),
    ));
    lines.push(body_element(&reply.body));
    lines.push("</reply>".to_string());
}

fn body_element(text: &str) -> String {
    let collapsed = normalize_whitespace(text);
    format!("<body><![CDATA[{}]]></body>", collapsed.replace("]]>", "]]&gt;"))
}

fn author_attr(login: Option<&str>) -> Cow<'_, str> {
    escape(login.unwrap_or(MISSING_AUTHOR))
}

fn timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn normalize_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Per-discussion documents joined in ascending creation order.
#[derive(Debug, Default)]
pub struct AggregateDocument {
    entries: Vec<(DateTime<Utc>, String)>,
}

impl AggregateDocument {
    pub fn push(&mut self, created_at: DateTime<Utc>, document: String) {
        self.entries.push((created_at, document));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn render(mut self) -> String {
        self.entries.sort_by_key(|(created_at, _)| *created_at);
        self.entries
            .into_iter()
            .map(|(_, document)| document)
            .collect::<Vec<_>>()
            .join(DOCUMENT_SEPARATOR)
    }
}
