use chrono::{DateTime, Utc};
use feed_rs::parser;

/// A feed document after XML parsing, before any filtering.
#[derive(Debug, Clone, Default)]
pub struct ParsedFeed {
    pub title: Option<String>,
    /// Site link of the feed, used as the base for relative entry links.
    pub site_link: Option<String>,
    pub entries: Vec<RawEntry>,
}

/// A tag-like annotation on an entry. `term` is absent when the feed
/// supplied a category with no text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tag {
    pub term: Option<String>,
}

/// One entry as supplied by the feed. Every field is optional; nothing
/// here has been defaulted or cleaned yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub tags: Vec<Tag>,
    pub published: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
}

impl RawEntry {
    /// Title used in log lines.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("No title")
    }
}

/// Parses an RSS or Atom document.
///
/// Dates the underlying parser cannot read come back as `None`, so a
/// malformed date and a missing one look the same from here on.
pub fn parse_feed(bytes: &[u8]) -> Result<ParsedFeed, parser::ParseFeedError> {
    let feed = parser::parse(bytes)?;

    let site_link = feed
        .links
        .iter()
        .find(|l| l.rel.as_deref().map_or(true, |rel| rel == "alternate"))
        .or_else(|| feed.links.first())
        .map(|l| l.href.clone());

    let entries = feed
        .entries
        .into_iter()
        .map(|entry| {
            let link = entry
                .links
                .iter()
                .find(|l| l.rel.as_deref().map_or(true, |rel| rel == "alternate"))
                .or_else(|| entry.links.first())
                .map(|l| l.href.clone());
            let author = entry
                .authors
                .first()
                .map(|p| p.name.clone())
                .filter(|name| !name.is_empty());
            let tags = entry
                .categories
                .into_iter()
                .map(|c| Tag {
                    term: Some(c.term).filter(|t| !t.is_empty()),
                })
                .collect();

            RawEntry {
                title: entry.title.map(|t| t.content),
                link,
                summary: entry.summary.map(|s| s.content),
                description: entry.content.and_then(|c| c.body),
                author,
                tags,
                published: entry.published,
                updated: entry.updated,
                created: None,
            }
        })
        .collect();

    Ok(ParsedFeed {
        title: feed.title.map(|t| t.content),
        site_link,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>Example News</title>
    <link>https://news.example.com/</link>
    <item>
        <title>First</title>
        <link>https://news.example.com/first</link>
        <description>First summary</description>
        <author>desk@example.com (News Desk)</author>
        <category>World</category>
        <category>Politics</category>
        <pubDate>Mon, 15 Jan 2024 10:30:00 GMT</pubDate>
    </item>
    <item>
        <title>Undated</title>
    </item>
</channel></rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
    <title>Atom Example</title>
    <link href="https://atom.example.com/"/>
    <id>urn:uuid:60a76c80-d399-11d9-b93c-0003939e0af6</id>
    <updated>2024-01-15T10:00:00Z</updated>
    <entry>
        <title>Atom entry</title>
        <link href="/posts/1"/>
        <id>urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6a</id>
        <updated>2024-01-15T09:15:00Z</updated>
        <summary>Short text</summary>
        <author><name>Jane Doe</name></author>
    </entry>
</feed>"#;

    #[test]
    fn test_parse_rss_entries() {
        let feed = parse_feed(RSS.as_bytes()).unwrap();
        assert_eq!(feed.title.as_deref(), Some("Example News"));
        assert_eq!(feed.site_link.as_deref(), Some("https://news.example.com/"));
        assert_eq!(feed.entries.len(), 2);

        let first = &feed.entries[0];
        assert_eq!(first.title.as_deref(), Some("First"));
        assert_eq!(first.link.as_deref(), Some("https://news.example.com/first"));
        assert_eq!(first.summary.as_deref(), Some("First summary"));
        assert_eq!(first.tags.len(), 2);
        assert_eq!(first.tags[0].term.as_deref(), Some("World"));
        assert_eq!(
            first.published,
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap())
        );

        let undated = &feed.entries[1];
        assert!(undated.published.is_none());
        assert!(undated.updated.is_none());
        assert!(undated.created.is_none());
    }

    #[test]
    fn test_parse_atom_entries() {
        let feed = parse_feed(ATOM.as_bytes()).unwrap();
        assert_eq!(feed.entries.len(), 1);

        let entry = &feed.entries[0];
        assert_eq!(entry.title.as_deref(), Some("Atom entry"));
        assert_eq!(entry.author.as_deref(), Some("Jane Doe"));
        assert_eq!(entry.summary.as_deref(), Some("Short text"));
        assert_eq!(
            entry.updated,
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 9, 15, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_feed(b"<not valid xml").is_err());
        assert!(parse_feed(b"plain text, no markup").is_err());
    }

    #[test]
    fn test_display_title_placeholder() {
        let entry = RawEntry::default();
        assert_eq!(entry.display_title(), "No title");
    }
}
