//! XML document parsing
//!
//! Transforms a hierarchical book/chapter/verse document into flat
//! [`TextUnit`] records. The whole document is parsed into a DOM first;
//! a document that is not well-formed fails before anything is written.

use crate::canon;
use crate::config::ImportConfig;
use crate::error::{Result, VersebaseError};
use crate::storage::TextUnit;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Parser for book/chapter/verse source documents
pub struct DocumentParser {
    whitespace_regex: Regex,
    progress_every: usize,
}

impl DocumentParser {
    pub fn new(config: &ImportConfig) -> Result<Self> {
        // \s is Unicode-aware and covers NBSP along with ordinary runs
        let whitespace_regex = Regex::new(r"\s+").map_err(|e| {
            VersebaseError::Generic(format!("Failed to compile whitespace regex: {}", e))
        })?;

        Ok(Self {
            whitespace_regex,
            progress_every: config.progress_every.max(1),
        })
    }

    /// Parse a source document into text units.
    ///
    /// Walks book elements, their direct-child chapter elements and those
    /// chapters' direct-child verse elements only - unexpected depths are
    /// never picked up. Skip rules (none of these are errors):
    /// - a book whose ordinal has no canonical-name mapping
    /// - a chapter or verse with a missing/zero `number` attribute
    /// - a verse whose normalized text is empty
    ///
    /// `progress` is invoked with the running count every Nth accumulated
    /// record, throttled so large documents don't flood the caller.
    pub fn parse<F>(&self, collection_id: &str, xml: &str, mut progress: F) -> Result<Vec<TextUnit>>
    where
        F: FnMut(usize),
    {
        let doc = roxmltree::Document::parse(xml)?;
        let root = doc.root_element();

        let mut units = Vec::new();

        for book_node in root.children().filter(|n| n.has_tag_name("book")) {
            let Some(book_name) = element_number(&book_node).and_then(canon::name_for_ordinal)
            else {
                log::warn!(
                    "Skipping book with unmapped ordinal {:?}",
                    book_node.attribute("number")
                );
                continue;
            };

            for chapter_node in book_node.children().filter(|n| n.has_tag_name("chapter")) {
                let Some(chapter) = element_number(&chapter_node) else {
                    continue;
                };

                for verse_node in chapter_node.children().filter(|n| n.has_tag_name("verse")) {
                    let Some(verse) = element_number(&verse_node) else {
                        continue;
                    };

                    let text = self.normalize_text(&text_content(&verse_node));
                    if text.is_empty() {
                        continue;
                    }

                    units.push(TextUnit::new(collection_id, book_name, chapter, verse, text));

                    if units.len() % self.progress_every == 0 {
                        progress(units.len());
                    }
                }
            }
        }

        Ok(units)
    }

    /// Collapse whitespace runs (including non-breaking space) to a single
    /// ASCII space and trim the ends; the text is NFC-normalized first.
    pub fn normalize_text(&self, text: &str) -> String {
        let composed: String = text.nfc().collect();
        self.whitespace_regex
            .replace_all(&composed, " ")
            .trim()
            .to_string()
    }
}

/// Read a 1-based `number` attribute; `None` for missing, unparsable or zero
fn element_number(node: &roxmltree::Node) -> Option<u32> {
    node.attribute("number")
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|&n| n > 0)
}

/// Full text content of an element, in document order
fn text_content(node: &roxmltree::Node) -> String {
    node.descendants()
        .filter_map(|n| n.text())
        .collect::<String>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> DocumentParser {
        DocumentParser::new(&ImportConfig::default()).unwrap()
    }

    const FIXTURE: &str = r#"
        <bible>
          <book number="1">
            <chapter number="1">
              <verse number="2">And the earth was without form, and void</verse>
              <verse number="1">In the beginning God created the heaven and the earth</verse>
            </chapter>
          </book>
          <book number="2">
            <chapter number="1">
              <verse number="1">Now these are the names</verse>
            </chapter>
          </book>
        </bible>
    "#;

    #[test]
    fn test_parse_fixture() {
        let units = parser().parse("kjv", FIXTURE, |_| {}).unwrap();
        assert_eq!(units.len(), 3);
        assert_eq!(units[0].book, "Genesis");
        assert_eq!(units[0].verse, 2);
        assert_eq!(units[2].book, "Exodus");
        assert_eq!(units[2].key, "Exodus|1|1");
    }

    #[test]
    fn test_malformed_document_fails() {
        let result = parser().parse("kjv", "<bible><book number=\"1\">", |_| {});
        assert!(matches!(
            result,
            Err(crate::error::VersebaseError::MalformedSource(_))
        ));
    }

    #[test]
    fn test_skips_book_without_mapping() {
        let xml = r#"
            <bible>
              <book number="99">
                <chapter number="1"><verse number="1">Apocryphal text</verse></chapter>
              </book>
              <book number="1">
                <chapter number="1"><verse number="1">Kept</verse></chapter>
              </book>
            </bible>
        "#;
        let units = parser().parse("kjv", xml, |_| {}).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].book, "Genesis");
    }

    #[test]
    fn test_skips_bad_verses() {
        let xml = r#"
            <bible>
              <book number="1">
                <chapter number="1">
                  <verse>No ordinal</verse>
                  <verse number="0">Zero ordinal</verse>
                  <verse number="2">   </verse>
                  <verse number="3">Kept</verse>
                </chapter>
              </book>
            </bible>
        "#;
        let units = parser().parse("kjv", xml, |_| {}).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].verse, 3);
    }

    #[test]
    fn test_ignores_nested_depths() {
        // A verse nested under an unexpected wrapper is not a direct child
        // of a chapter and must not be picked up.
        let xml = r#"
            <bible>
              <book number="1">
                <chapter number="1">
                  <section><verse number="1">Hidden</verse></section>
                  <verse number="2">Visible</verse>
                </chapter>
              </book>
            </bible>
        "#;
        let units = parser().parse("kjv", xml, |_| {}).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].verse, 2);
    }

    #[test]
    fn test_whitespace_normalization() {
        let xml = "<bible><book number=\"1\"><chapter number=\"1\">\
                   <verse number=\"1\">  In\u{a0}the \t beginning\n God  </verse>\
                   </chapter></book></bible>";
        let units = parser().parse("kjv", xml, |_| {}).unwrap();
        assert_eq!(units[0].text, "In the beginning God");
    }

    #[test]
    fn test_progress_throttled() {
        let config = ImportConfig { progress_every: 2 };
        let parser = DocumentParser::new(&config).unwrap();

        let mut verses = String::new();
        for i in 1..=5 {
            verses.push_str(&format!("<verse number=\"{i}\">Verse text {i}</verse>"));
        }
        let xml = format!(
            "<bible><book number=\"1\"><chapter number=\"1\">{verses}</chapter></book></bible>"
        );

        let mut reported = Vec::new();
        parser.parse("kjv", &xml, |n| reported.push(n)).unwrap();
        // Every 2nd accumulated record, not every record
        assert_eq!(reported, vec![2, 4]);
    }
}
