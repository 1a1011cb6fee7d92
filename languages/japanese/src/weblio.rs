//! Remote lookups against weblio.jp.

use std::sync::OnceLock;
use std::thread;
use std::time::Duration;

use kotoba_config::remote::RemoteConfig;
use kotoba_remote::{RemoteError, RemoteLookup};
use kotoba_types::RemoteRecord;
use regex::Regex;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Node, Selector};

use crate::cleanup::Cleaner;
use crate::kana;

/// Definitions longer than this are replaced by a link to the page
const MAX_DEFINITION_CHARS: usize = 400;

const EXAMPLE_DISCLAIMER: &str = "日本語例文用例辞書はプログラムで機械的に例文を生成しているため";

/// Everything after one of these is page furniture
const TRAILERS: &[&str] = &[
    "» 類語の一覧を見る",
    "[続きの解説]",
    "[可能]",
    "出典:",
    "[用法]",
    "[補説]",
    "[下接語] ",
];

fn kanji_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?:［常用漢字］　)?(?:［.］(?:[ア-ヺ]+　?)*)?(?:（.）(?:（[ア-ヺ]+）)?)?(?:（.）(?:（[ア-ヺ]+）)?)?　(?:［.］(?:[あ-ゔ]+　?)*)",
        )
        .expect("Invalid kanji header pattern")
    })
}

fn topic_lead() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s?「?.+?」?とは?(?:（.+?）)?は、").expect("Invalid topic lead pattern")
    })
}

fn query_noise() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:<|｠|〔違い〕|\[派生\]).+|（.+?）").expect("Invalid query noise pattern")
    })
}

/// [`RemoteLookup`] over weblio.jp pages
pub struct WeblioLookup {
    client: Client,
    base_url: String,
    throttle: Duration,
    cleaner: Cleaner,
}

impl WeblioLookup {
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            throttle: Duration::from_millis(config.throttle_ms),
            cleaner: Cleaner::new(),
        })
    }

    fn fetch_page(&self, url: &str) -> Result<Option<String>, RemoteError> {
        let response = self.client.get(url).send()?;
        match response.status() {
            StatusCode::OK => Ok(Some(response.text()?)),
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(RemoteError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            }),
        }
    }
}

impl RemoteLookup for WeblioLookup {
    fn name(&self) -> &str {
        "Weblio"
    }

    fn lookup(
        &self,
        query: &str,
        desired_reading: Option<&str>,
    ) -> Result<Vec<RemoteRecord>, RemoteError> {
        let query = clean_query(query);
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}{query}", self.base_url);
        tracing::debug!("GET {url}");
        let page = self.fetch_page(&url);
        thread::sleep(self.throttle);

        let Some(html) = page? else {
            return Ok(Vec::new());
        };

        let records = parse_page(&html, &query, &url)
            .into_iter()
            .filter(|record| desired_reading.is_none_or(|r| record.reading == r))
            .filter_map(|mut record| {
                record.definition =
                    self.cleaner
                        .clean(self.name(), &record.word, &record.reading, &record.definition)?;
                Some(record)
            })
            .collect();
        Ok(records)
    }
}

/// The page title Weblio files a query under
pub fn clean_query(query: &str) -> String {
    let query = query_noise().replace_all(query.trim(), "");
    let query = query.rsplit('／').next().unwrap_or_default();
    query.strip_prefix('っ').unwrap_or(query).trim().to_string()
}

/// Extracts one record per dictionary section of a Weblio page
pub fn parse_page(html: &str, query: &str, url: &str) -> Vec<RemoteRecord> {
    let document = Html::parse_document(html);
    let Ok(section_sel) = Selector::parse("div.pbarTL, h2.midashigo") else {
        return Vec::new();
    };

    let mut records = Vec::new();
    let mut dictionary = String::from("Weblio");

    for element in document.select(&section_sel) {
        if element.value().name() == "div" {
            let name = element.text().collect::<String>().trim().to_string();
            if !name.is_empty() {
                dictionary = name;
            }
            continue;
        }

        let heading = element.text().collect::<String>();
        if heading.trim_end().ends_with("例文・使い方・用例・文例") {
            continue;
        }

        let Some(block) = element
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "div")
        else {
            tracing::debug!("No text block after {}", heading.trim());
            continue;
        };

        let (content, reading) = section_text(block, query);
        if content.contains(EXAMPLE_DISCLAIMER) {
            continue;
        }
        if reading.as_deref() == Some("null") {
            continue;
        }

        let word = element
            .value()
            .attr("title")
            .map(str::to_string)
            .unwrap_or_else(|| query.to_string());
        let reading = kana::hiragana_only(reading.as_deref().unwrap_or(&word));

        let content = strip_furniture(&content, query);
        let definition = if content.chars().count() < MAX_DEFINITION_CHARS {
            content
        } else {
            format!(r#"<a href="{url}" title="{word} Definition from Weblio">{word}</a>"#)
        };

        records.push(RemoteRecord {
            source: dictionary.clone(),
            word,
            reading,
            definition,
        });
    }

    records
}

/// The text of a definition block and the reading it announces, if any
fn section_text(block: ElementRef<'_>, query: &str) -> (String, Option<String>) {
    let body_start = Selector::parse("br.AM")
        .ok()
        .and_then(|sel| block.select(&sel).next());
    let nodes: Vec<_> = match body_start {
        Some(br) => br.next_siblings().collect(),
        None => block.children().collect(),
    };

    let mut parts = Vec::new();
    let mut reading = None;
    for node in nodes {
        let text = match node.value() {
            Node::Text(text) => text.trim().to_string(),
            Node::Element(el) => {
                if el.classes().any(|c| c == "synonymsUnderDictWrp")
                    || el.name().ends_with("publish-date")
                {
                    continue;
                }
                ElementRef::wrap(node)
                    .map(|el| el.text().map(str::trim).collect::<String>())
                    .unwrap_or_default()
            }
            _ => continue,
        };

        match classify(&text, query) {
            Line::Skip => {}
            Line::Reading(found) => {
                reading.get_or_insert(found);
            }
            Line::Text(text) => parts.push(text),
        }
    }

    (parts.concat().trim().to_string(), reading)
}

enum Line {
    Skip,
    Reading(String),
    Text(String),
}

fn classify(text: &str, query: &str) -> Line {
    let skip = [
        "別表記".to_string(),
        format!("「{query}」の意味・「{query}」とは"),
        "の意味を調べる".to_string(),
        "とは / 意味".to_string(),
    ];
    if skip.iter().any(|phrase| text.contains(phrase.as_str())) {
        return Line::Skip;
    }
    if text.contains("読み方") {
        return Line::Reading(text.replace("読み方：", ""));
    }
    Line::Text(topic_lead().replace(text, "").into_owned())
}

fn strip_furniture(content: &str, query: &str) -> String {
    let mut content = kanji_header().replace_all(content, "").into_owned();

    let per_word = [
        format!("({query} から転送)"),
        format!("「{query}」の発音・読み方"),
        format!("「{query}」の類語、言い換え表現"),
        format!("「{query}」の熟語・言い回し"),
        format!("「{query}」の定義を英語で解説"),
        format!("「{query}」の類語"),
        format!("「{query}」に関連する用語・表現"),
        format!("「{query}」とは・「{query}」の詳しい解説"),
        format!("「{query}」の語源・由来"),
        format!("「{query}」の類義語"),
        format!("「{query}」に似た言葉"),
    ];
    for trailer in TRAILERS.iter().copied().chain(per_word.iter().map(String::as_str)) {
        if let Some(at) = content.find(trailer) {
            content.truncate(at);
        }
    }

    let lead = format!("「{query}」とは、");
    let content = content.strip_prefix(&lead).unwrap_or(&content);
    content.replace('\u{a0}', " ").trim().to_string()
}
