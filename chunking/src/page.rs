//! Page records: the coarse-grained retrieval unit.

use serde::{Deserialize, Serialize};

/// Classification of a page within the claim document.
///
/// `Overview` pages synthesize the whole claim and are always surfaced
/// on the summary route; `Details` pages cover a single event and
/// compete on similarity rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageKind {
    Overview,
    Details,
}

/// A full source page of the claim document, with the metadata supplied
/// by the ingestion collaborator.
///
/// Pages are created once and never mutated; the [`crate::PageStore`]
/// owns them. Unknown fields are rejected at deserialization so a
/// malformed ingestion payload fails loudly instead of carrying
/// unchecked baggage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Page {
    /// Stable key, `page_{page_number}`.
    pub id: String,

    /// 1-based position in the source document.
    pub page_number: u32,

    /// Section header, e.g. "Event 1: Initial Collision".
    pub header: String,

    /// Event date as supplied by ingestion.
    pub date: String,

    /// People and organizations involved, in document order.
    pub involved_parties: Vec<String>,

    /// Overview or Details.
    pub kind: PageKind,

    /// Full body text.
    pub text: String,

    /// Character count of `text`.
    pub char_count: usize,
}

impl Page {
    /// Create a page record. The id is derived from the page number and
    /// the character count is computed from the text.
    pub fn new(
        page_number: u32,
        header: impl Into<String>,
        date: impl Into<String>,
        involved_parties: Vec<String>,
        kind: PageKind,
        text: impl Into<String>,
    ) -> Self {
        let text = text.into();
        Self {
            id: format!("page_{page_number}"),
            page_number,
            header: header.into(),
            date: date.into(),
            involved_parties,
            kind,
            char_count: text.chars().count(),
            text,
        }
    }

    /// Whether this page is always included on the summary route.
    pub fn is_overview(&self) -> bool {
        self.kind == PageKind::Overview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn derives_id_and_char_count() {
        let page = Page::new(
            3,
            "Event 2: Emergency Response",
            "2024-01-15 09:31:22",
            vec!["Medic Unit 47".to_string()],
            PageKind::Details,
            "First responders arrived at the scene.",
        );

        assert_eq!(page.id, "page_3");
        assert_eq!(page.char_count, page.text.chars().count());
        assert!(!page.is_overview());
    }

    #[test]
    fn rejects_unknown_fields() {
        let raw = r#"{
            "id": "page_1",
            "page_number": 1,
            "header": "Overview",
            "date": "2024-01-15",
            "involved_parties": [],
            "kind": "Overview",
            "text": "x",
            "char_count": 1,
            "surprise": true
        }"#;

        assert!(serde_json::from_str::<Page>(raw).is_err());
    }
}
