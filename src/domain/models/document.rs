use serde::{Deserialize, Serialize};

const SNIPPET_CHARS: usize = 200;

/// A grounding document as projected by the search service.
///
/// Schema documents carry `contentType`, support documents carry
/// `documentType`; both land in `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedDocument {
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub content: String,

    #[serde(default, alias = "contentType", alias = "documentType")]
    pub kind: String,

    #[serde(default)]
    pub module: Option<String>,
}

impl RetrievedDocument {
    pub fn reference(&self) -> DocumentReference {
        DocumentReference {
            id: self.id.clone(),
            title: self.title.clone(),
            snippet: snippet(&self.content),
            kind: self.kind.clone(),
        }
    }
}

/// Short pointer to a grounding document, returned with an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReference {
    pub id: String,
    pub title: String,
    pub snippet: String,
    pub kind: String,
}

fn snippet(content: &str) -> String {
    if content.chars().count() <= SNIPPET_CHARS {
        return content.to_string();
    }
    let mut cut: String = content.chars().take(SNIPPET_CHARS).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_accepts_both_type_fields() {
        let schema: RetrievedDocument =
            serde_json::from_str(r#"{"id":"1","title":"Sales","content":"x","contentType":"schema"}"#)
                .expect("schema doc");
        let support: RetrievedDocument =
            serde_json::from_str(r#"{"id":"2","title":"FAQ","content":"y","documentType":"faq"}"#)
                .expect("support doc");
        assert_eq!(schema.kind, "schema");
        assert_eq!(support.kind, "faq");
    }

    #[test]
    fn test_snippet_truncates_on_char_boundary() {
        let doc = RetrievedDocument {
            id: "1".into(),
            title: "t".into(),
            content: "è".repeat(250),
            kind: "schema".into(),
            module: None,
        };
        let reference = doc.reference();
        assert_eq!(reference.snippet.chars().count(), 203);
        assert!(reference.snippet.ends_with("..."));
    }
}
