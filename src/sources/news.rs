use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;

use super::{ensure_success, SourceError};
use crate::config::NewsConfig;
use crate::models::{NewsHit, ScanSubject};

const RISK_TERMS: &str = "(fraud OR scam OR sanctions OR laundering OR terrorism)";

/// Search the news feed for the subject combined with risk keywords.
///
/// Returns unclassified candidates (no `risk_score`), at most `max_headlines`.
pub async fn search_news(
    client: &Client,
    config: &NewsConfig,
    subject: &ScanSubject,
) -> Result<Vec<NewsHit>, SourceError> {
    let query = build_query(&subject.raw);
    let ceid = format!("{}:{}", config.country, config.language);

    let response = client
        .get(&config.endpoint)
        .query(&[
            ("q", query.as_str()),
            ("hl", config.language.as_str()),
            ("gl", config.country.as_str()),
            ("ceid", ceid.as_str()),
        ])
        .send()
        .await?;

    let body = ensure_success(response)?.text().await?;
    parse_rss(&body, config.max_headlines)
}

fn build_query(subject: &str) -> String {
    format!("\"{}\" {}", subject.replace('"', ""), RISK_TERMS)
}

#[derive(Default)]
struct ItemDraft {
    title: String,
    link: String,
    source: String,
}

#[derive(Clone, Copy, PartialEq)]
enum Field {
    Title,
    Link,
    Source,
}

/// Extract `<item>` title, link and source from an RSS 2.0 document.
fn parse_rss(xml: &str, limit: usize) -> Result<Vec<NewsHit>, SourceError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut hits = Vec::new();
    let mut item: Option<ItemDraft> = None;
    let mut field: Option<Field> = None;
    let mut saw_channel = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let tag = String::from_utf8_lossy(e.name().local_name().as_ref()).into_owned();
                match tag.as_str() {
                    "channel" => saw_channel = true,
                    "item" => item = Some(ItemDraft::default()),
                    "title" if item.is_some() => field = Some(Field::Title),
                    "link" if item.is_some() => field = Some(Field::Link),
                    "source" if item.is_some() => field = Some(Field::Source),
                    _ => {}
                }
            }
            Event::Text(ref e) => {
                if let (Some(draft), Some(f)) = (item.as_mut(), field) {
                    let text = e
                        .unescape()
                        .map_err(|err| SourceError::Payload(err.to_string()))?;
                    push_text(draft, f, &text);
                }
            }
            Event::CData(ref e) => {
                if let (Some(draft), Some(f)) = (item.as_mut(), field) {
                    let text = String::from_utf8_lossy(e).into_owned();
                    push_text(draft, f, &text);
                }
            }
            Event::End(ref e) => {
                let tag = String::from_utf8_lossy(e.name().local_name().as_ref()).into_owned();
                match tag.as_str() {
                    "title" | "link" | "source" => field = None,
                    "item" => {
                        if let Some(draft) = item.take() {
                            if !draft.title.trim().is_empty() {
                                hits.push(finish(draft));
                            }
                        }
                        if hits.len() >= limit {
                            break;
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !saw_channel {
        return Err(SourceError::Payload("not an RSS feed".to_string()));
    }
    hits.truncate(limit);
    Ok(hits)
}

fn push_text(draft: &mut ItemDraft, field: Field, text: &str) {
    let target = match field {
        Field::Title => &mut draft.title,
        Field::Link => &mut draft.link,
        Field::Source => &mut draft.source,
    };
    target.push_str(text);
}

fn finish(draft: ItemDraft) -> NewsHit {
    let source = if !draft.source.trim().is_empty() {
        draft.source.trim().to_string()
    } else {
        reqwest::Url::parse(draft.link.trim())
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| "Google News".to_string())
    };

    NewsHit {
        title: draft.title.trim().to_string(),
        link: draft.link.trim().to_string(),
        source,
        risk_score: None,
        top_category: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::detect_subject;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>"Acme Ltd" - Google News</title>
    <item>
      <title>Acme Ltd fined over money laundering failures - Reuters</title>
      <link>https://news.google.com/articles/abc</link>
      <source url="https://www.reuters.com">Reuters</source>
    </item>
    <item>
      <title><![CDATA[Acme & partners probed for fraud]]></title>
      <link>https://www.hs.fi/talous/art-1.html</link>
    </item>
    <item>
      <title>Third headline</title>
      <link>https://yle.fi/a/3</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_rss_items() {
        let hits = parse_rss(FEED, 20).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].title, "Acme Ltd fined over money laundering failures - Reuters");
        assert_eq!(hits[0].source, "Reuters");
        assert_eq!(hits[1].title, "Acme & partners probed for fraud");
        assert_eq!(hits[1].source, "www.hs.fi");
        assert!(hits.iter().all(|h| h.risk_score.is_none()));
    }

    #[test]
    fn test_parse_rss_respects_limit() {
        assert_eq!(parse_rss(FEED, 2).unwrap().len(), 2);
    }

    #[test]
    fn test_channel_title_is_not_an_item() {
        let hits = parse_rss(FEED, 20).unwrap();
        assert!(hits.iter().all(|h| !h.title.contains("Google News")));
    }

    #[test]
    fn test_html_is_rejected() {
        assert!(parse_rss("<html><body>Sorry</body></html>", 20).is_err());
    }

    #[test]
    fn test_query_quotes_subject() {
        assert_eq!(
            build_query("Acme \"Ltd\""),
            "\"Acme Ltd\" (fraud OR scam OR sanctions OR laundering OR terrorism)"
        );
    }

    #[tokio::test]
    async fn test_search_news_against_mock_feed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rss/search"))
            .and(query_param("hl", "fi"))
            .and(query_param("ceid", "FI:fi"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(FEED, "application/rss+xml"),
            )
            .mount(&server)
            .await;

        let config = NewsConfig {
            endpoint: format!("{}/rss/search", server.uri()),
            ..NewsConfig::default()
        };
        let hits = search_news(&Client::new(), &config, &detect_subject("Acme Ltd"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[tokio::test]
    async fn test_search_news_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let config = NewsConfig {
            endpoint: server.uri(),
            ..NewsConfig::default()
        };
        let err = search_news(&Client::new(), &config, &detect_subject("Acme Ltd"))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Status(429)));
    }
}
