//! Standalone document storage, independent of any account.

use thiserror::Error;

use crate::db::{NewDocument, Store};
use crate::models::Document;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Could not be saved: {0}")]
    CouldNotBeSaved(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for DocumentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[derive(Clone)]
pub struct DocumentService {
    store: Store,
}

impl DocumentService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Stores a document without attaching it to an account.
    pub async fn upload(
        &self,
        name: String,
        extension: String,
        content: Vec<u8>,
    ) -> Result<Document, DocumentError> {
        if self.store.get_document_by_name(&name).await?.is_some() {
            return Err(DocumentError::CouldNotBeSaved(format!(
                "A document named \"{name}\" already exists"
            )));
        }

        let row = self
            .store
            .insert_document(NewDocument {
                name,
                extension,
                content,
                account_id: None,
            })
            .await?;

        metrics::counter!("documents_uploaded_total").increment(1);
        Ok(Document::from(row))
    }

    pub async fn get(&self, id: i64) -> Result<Document, DocumentError> {
        let row = self
            .store
            .get_document_by_id(id)
            .await?
            .ok_or_else(|| DocumentError::NotFound(format!("No document with ID {id}")))?;
        Ok(Document::from(row))
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Document, DocumentError> {
        let row = self
            .store
            .get_document_by_name(name)
            .await?
            .ok_or_else(|| DocumentError::NotFound(format!("No document named \"{name}\"")))?;
        Ok(Document::from(row))
    }

    pub async fn delete(&self, id: i64) -> Result<(), DocumentError> {
        let deleted = self.store.delete_document(id).await?;
        if !deleted {
            return Err(DocumentError::NotFound(format!("No document with ID {id}")));
        }
        Ok(())
    }
}
