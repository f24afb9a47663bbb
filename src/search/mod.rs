//! Tantivy-based search index module.
//!
//! Provides full-text search over meetings with field boosting. Indexed
//! fields are the title, the plain-text content mirror, and tags; trashed
//! meetings are removed from the index on soft delete.

use std::path::Path;
use std::sync::Arc;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, Occur, QueryParser};
use tantivy::schema::{Field, Schema, Value, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument};
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::Meeting;

/// Field boost values: a title hit outranks a body hit.
const BOOST_TITLE: f32 = 10.0;
const BOOST_CONTENT: f32 = 6.0;
const BOOST_TAGS: f32 = 4.0;

/// Search result with meeting id and relevance score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub meeting_id: String,
    pub score: f32,
}

/// Search index schema fields.
struct SearchFields {
    meeting_id: Field,
    title: Field,
    content: Field,
    tags: Field,
}

/// Tantivy search index for meetings.
pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    writer: Arc<RwLock<IndexWriter>>,
    fields: SearchFields,
}

impl SearchIndex {
    /// Create or open a search index at the specified path.
    pub fn open(index_path: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(index_path)
            .map_err(|e| AppError::Search(format!("Failed to create index directory: {}", e)))?;

        // Define schema
        let mut schema_builder = Schema::builder();
        let meeting_id = schema_builder.add_text_field("meeting_id", STRING | STORED);
        let title = schema_builder.add_text_field("title", TEXT | STORED);
        let content = schema_builder.add_text_field("content", TEXT);
        let tags = schema_builder.add_text_field("tags", TEXT);
        let schema = schema_builder.build();

        let fields = SearchFields {
            meeting_id,
            title,
            content,
            tags,
        };

        // Try to open existing index or create new one
        let index = Index::open_in_dir(index_path)
            .or_else(|_| Index::create_in_dir(index_path, schema.clone()))
            .map_err(|e| AppError::Search(format!("Failed to open/create index: {}", e)))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e| AppError::Search(format!("Failed to create reader: {}", e)))?;

        let writer = index
            .writer(50_000_000) // 50MB buffer
            .map_err(|e| AppError::Search(format!("Failed to create writer: {}", e)))?;

        Ok(Self {
            index,
            reader,
            writer: Arc::new(RwLock::new(writer)),
            fields,
        })
    }

    /// Rebuild the entire index from live meetings.
    pub async fn rebuild(&self, meetings: &[Meeting]) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        // Clear existing index
        writer.delete_all_documents()?;

        for meeting in meetings {
            let doc = self.create_document(meeting);
            writer.add_document(doc)?;
        }

        writer.commit()?;

        // Reload reader to see new documents
        self.reader.reload()?;

        tracing::info!("Search index rebuilt with {} meetings", meetings.len());
        Ok(())
    }

    /// Index a single meeting, replacing any previous document for it.
    pub async fn index_meeting(&self, meeting: &Meeting) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        let term = tantivy::Term::from_field_text(self.fields.meeting_id, &meeting.id);
        writer.delete_term(term);

        let doc = self.create_document(meeting);
        writer.add_document(doc)?;
        writer.commit()?;

        self.reader.reload()?;

        Ok(())
    }

    /// Remove a meeting from the index.
    pub async fn remove_meeting(&self, meeting_id: &str) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        let term = tantivy::Term::from_field_text(self.fields.meeting_id, meeting_id);
        writer.delete_term(term);
        writer.commit()?;

        self.reader.reload()?;

        Ok(())
    }

    /// Search for meetings matching the query.
    pub fn search(
        &self,
        query_str: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SearchResult>, AppError> {
        if query_str.trim().is_empty() {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();

        let query_parser = QueryParser::for_index(
            &self.index,
            vec![self.fields.title, self.fields.content, self.fields.tags],
        );

        let base_query = query_parser
            .parse_query(query_str)
            .map_err(|e| AppError::Search(format!("Invalid search query: {}", e)))?;

        // Create field-specific boosted queries
        let mut subqueries: Vec<(Occur, Box<dyn tantivy::query::Query>)> = Vec::new();

        let field_queries = [
            (self.fields.title, BOOST_TITLE),
            (self.fields.content, BOOST_CONTENT),
            (self.fields.tags, BOOST_TAGS),
        ];

        for (field, boost) in field_queries {
            let field_parser = QueryParser::for_index(&self.index, vec![field]);
            if let Ok(field_query) = field_parser.parse_query(query_str) {
                let boosted = BoostQuery::new(field_query, boost);
                subqueries.push((Occur::Should, Box::new(boosted)));
            }
        }

        // Combine with OR semantics
        let combined_query = if subqueries.is_empty() {
            base_query
        } else {
            Box::new(BooleanQuery::new(subqueries))
        };

        let top_docs = searcher
            .search(&combined_query, &TopDocs::with_limit(limit + offset))
            .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        let results: Vec<SearchResult> = top_docs
            .into_iter()
            .skip(offset)
            .take(limit)
            .filter_map(|(score, doc_address)| {
                let doc: TantivyDocument = searcher.doc(doc_address).ok()?;
                let meeting_id = doc
                    .get_first(self.fields.meeting_id)?
                    .as_str()?
                    .to_string();
                Some(SearchResult { meeting_id, score })
            })
            .collect();

        Ok(results)
    }

    /// Create a Tantivy document from a meeting.
    fn create_document(&self, meeting: &Meeting) -> TantivyDocument {
        let content_text = meeting
            .content_text
            .clone()
            .unwrap_or_else(|| extract_text(&meeting.content));
        let tags = meeting
            .tags
            .as_ref()
            .map(|t| t.join(" "))
            .unwrap_or_default();

        doc!(
            self.fields.meeting_id => meeting.id.clone(),
            self.fields.title => meeting.title.clone(),
            self.fields.content => content_text,
            self.fields.tags => tags
        )
    }
}

/// Flatten a rich-text editor JSON tree into plain text.
///
/// Collects every string under a `text` key, in document order. This is
/// the server-side mirror used when the client does not supply one.
pub fn extract_text(value: &serde_json::Value) -> String {
    let mut out = Vec::new();
    collect_text(value, &mut out);
    out.join(" ")
}

fn collect_text(value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::Object(map) => {
            if let Some(serde_json::Value::String(text)) = map.get("text") {
                if !text.trim().is_empty() {
                    out.push(text.trim().to_string());
                }
            }
            for (key, child) in map {
                if key != "text" {
                    collect_text(child, out);
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                collect_text(item, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccessLevel;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_meeting(id: &str, title: &str, text: &str) -> Meeting {
        Meeting {
            id: id.to_string(),
            title: title.to_string(),
            content: json!({}),
            content_text: Some(text.to_string()),
            template_id: None,
            project_id: None,
            created_by: "user-1".to_string(),
            access_level: AccessLevel::Team,
            tags: None,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn test_search_index_creation() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();

        let meetings = vec![
            create_test_meeting("1", "Sprint Planning", "velocity and backlog grooming"),
            create_test_meeting("2", "Quarterly Review", "revenue targets and hiring"),
        ];

        index.rebuild(&meetings).await.unwrap();

        let results = index.search("sprint", 10, 0).unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].meeting_id, "1");
    }

    #[tokio::test]
    async fn test_search_empty_query() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();

        let results = index.search("", 10, 0).unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_remove_meeting() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();

        let meetings = vec![create_test_meeting("1", "Retrospective", "what went well")];
        index.rebuild(&meetings).await.unwrap();

        index.remove_meeting("1").await.unwrap();
        let results = index.search("retrospective", 10, 0).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_extract_text_walks_nested_nodes() {
        let content = json!({
            "type": "doc",
            "content": [
                { "type": "paragraph", "content": [
                    { "type": "text", "text": "Decisions from" },
                    { "type": "text", "text": "the planning call" }
                ]},
                { "type": "bulletList", "content": [
                    { "type": "listItem", "content": [
                        { "type": "paragraph", "content": [
                            { "type": "text", "text": "ship it" }
                        ]}
                    ]}
                ]}
            ]
        });

        let text = extract_text(&content);
        assert_eq!(text, "Decisions from the planning call ship it");
    }

    #[test]
    fn test_extract_text_empty_doc() {
        assert_eq!(extract_text(&json!({})), "");
        assert_eq!(extract_text(&serde_json::Value::Null), "");
    }
}
