//! Editable item payloads for the FAQ, popular-posts and flexible-content
//! lists, plus a free-form JSON payload.
use crate::icon::Icon;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("unknown field: {0}")]
    Unknown(String),
    #[error("field {field} expects {expected}")]
    Type {
        field: String,
        expected: &'static str,
    },
}

/// A local file that must travel alongside the JSON body as a multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub field: String,
    pub path: PathBuf,
}

pub trait ItemPayload: Serialize + DeserializeOwned + Clone + Default + Send + Sync + 'static {
    /// Replace a single field, addressed by its wire name.
    fn set_field(&mut self, field: &str, value: Value) -> Result<(), FieldError>;

    /// Local files attached to this payload.
    fn uploads(&self) -> Vec<Upload> {
        Vec::new()
    }
}

fn string_field(field: &str, value: Value) -> Result<String, FieldError> {
    match value {
        Value::String(s) => Ok(s),
        Value::Null => Ok(String::new()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(FieldError::Type {
            field: field.to_string(),
            expected: "a string",
        }),
    }
}

fn optional_string_field(field: &str, value: Value) -> Result<Option<String>, FieldError> {
    let s = string_field(field, value)?;
    Ok(Some(s).filter(|s| !s.is_empty()))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

impl ItemPayload for FaqEntry {
    fn set_field(&mut self, field: &str, value: Value) -> Result<(), FieldError> {
        match field {
            "question" => self.question = string_field(field, value)?,
            "answer" => self.answer = string_field(field, value)?,
            _ => return Err(FieldError::Unknown(field.to_string())),
        }
        Ok(())
    }
}

/// Reference to a post pinned in the popular-posts list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularPost {
    #[serde(default)]
    pub post_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl ItemPayload for PopularPost {
    fn set_field(&mut self, field: &str, value: Value) -> Result<(), FieldError> {
        match field {
            "postId" => self.post_id = string_field(field, value)?,
            "title" => self.title = optional_string_field(field, value)?,
            _ => return Err(FieldError::Unknown(field.to_string())),
        }
        Ok(())
    }
}

/// A block of the flexible-content page builder.
///
/// `image` holds the URL of an already uploaded image. `image_file` is a
/// local file waiting to be uploaded with the next save; it is accepted on
/// input but never serialized, so the backend's echo clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSection {
    #[serde(default)]
    pub heading: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing)]
    pub image_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
}

impl ItemPayload for ContentSection {
    fn set_field(&mut self, field: &str, value: Value) -> Result<(), FieldError> {
        match field {
            "heading" => self.heading = string_field(field, value)?,
            "body" => self.body = string_field(field, value)?,
            "image" => self.image = optional_string_field(field, value)?,
            "imageFile" => {
                self.image_file = optional_string_field(field, value)?.map(PathBuf::from)
            }
            "icon" => {
                self.icon = optional_string_field(field, value)?.map(|name| Icon::resolve(&name))
            }
            _ => return Err(FieldError::Unknown(field.to_string())),
        }
        Ok(())
    }

    fn uploads(&self) -> Vec<Upload> {
        self.image_file
            .iter()
            .map(|path| Upload {
                field: "image".to_string(),
                path: path.clone(),
            })
            .collect()
    }
}

/// Free-form payload: any field may be set.
impl ItemPayload for Map<String, Value> {
    fn set_field(&mut self, field: &str, value: Value) -> Result<(), FieldError> {
        self.insert(field.to_string(), value);
        Ok(())
    }
}
