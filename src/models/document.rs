use serde::{Deserialize, Serialize};

use crate::entities::documents;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: i64,
    pub name: String,
    pub extension: String,
    #[serde(default)]
    pub content: Vec<u8>,
}

impl From<documents::Model> for Document {
    fn from(model: documents::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            extension: model.extension,
            content: model.content,
        }
    }
}
