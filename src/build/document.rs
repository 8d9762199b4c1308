use serde::{Deserialize, Serialize};

// =============================================================================
// Structured document model
// =============================================================================

/// An inline span inside a paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "camelCase")]
pub enum Inline {
    Text { text: String },
}

impl Inline {
    pub fn text(text: impl Into<String>) -> Self {
        Inline::Text { text: text.into() }
    }
}

/// A block of a structured document. Clients switch on the `t` tag, so the
/// set of tags is part of the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum Block {
    /// The document title with its slug.
    #[serde(rename = "h1")]
    Heading { text: String, id: String },

    /// A standalone image line.
    #[serde(rename = "img")]
    Image { src: String, alt: String },

    #[serde(rename = "p")]
    Paragraph { inlines: Vec<Inline> },

    /// The signature line, without its `Escribe:` prefix.
    #[serde(rename = "author")]
    Author { text: String },

    /// A detected `Artículo Nº <n>` marker.
    #[serde(rename = "articleNo")]
    ArticleNo { value: u64 },
}

/// The JSON form of one canonical `<id>.md` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredDoc {
    pub id: u64,
    pub titulo: String,
    pub autor: Option<String>,
    pub bloques: Vec<Block>,
}

/// One row of the flat docs index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRow {
    pub id: u64,
    pub titulo: String,
    pub autor: String,
}

impl From<&StructuredDoc> for IndexRow {
    fn from(doc: &StructuredDoc) -> Self {
        IndexRow {
            id: doc.id,
            titulo: doc.titulo.clone(),
            autor: doc.autor.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_block_tags() {
        let blocks = vec![
            Block::Heading {
                text: "Hola".to_string(),
                id: "hola".to_string(),
            },
            Block::Image {
                src: "a.png".to_string(),
                alt: "".to_string(),
            },
            Block::Paragraph {
                inlines: vec![Inline::text("x")],
            },
            Block::Author {
                text: "Alfa".to_string(),
            },
            Block::ArticleNo { value: 4 },
        ];

        assert_eq!(
            serde_json::to_value(&blocks).unwrap(),
            json!([
                {"t": "h1", "text": "Hola", "id": "hola"},
                {"t": "img", "src": "a.png", "alt": ""},
                {"t": "p", "inlines": [{"t": "text", "text": "x"}]},
                {"t": "author", "text": "Alfa"},
                {"t": "articleNo", "value": 4}
            ])
        );
    }

    #[test]
    fn test_index_row_without_author() {
        let doc = StructuredDoc {
            id: 3,
            titulo: "T".to_string(),
            autor: None,
            bloques: vec![],
        };
        let row = IndexRow::from(&doc);
        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            json!({"id": 3, "titulo": "T", "autor": ""})
        );
        assert_eq!(
            serde_json::to_value(&doc).unwrap()["autor"],
            serde_json::Value::Null
        );
    }
}
