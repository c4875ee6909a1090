//! Shopify Admin GraphQL wire types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Resource classification requested for every staged upload and file
pub const RESOURCE_FILE: &str = "FILE";

pub const STAGED_UPLOADS_CREATE: &str = r#"
mutation stagedUploadsCreate($input: [StagedUploadInput!]!) {
  stagedUploadsCreate(input: $input) {
    stagedTargets {
      resourceUrl
      url
      parameters {
        name
        value
      }
    }
    userErrors {
      field
      message
    }
  }
}
"#;

pub const FILE_CREATE: &str = r#"
mutation fileCreate($files: [FileCreateInput!]!) {
  fileCreate(files: $files) {
    files {
      id
      ... on GenericFile {
        url
        id
      }
      ... on MediaImage {
        image {
          url
        }
        id
      }
    }
    userErrors {
      field
      message
    }
  }
}
"#;

/// GraphQL request body
#[derive(Debug, Serialize)]
pub struct GraphQlRequest<'a, V> {
    pub query: &'a str,
    pub variables: V,
}

/// GraphQL response envelope
#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Option<Vec<Value>>,
}

/// Domain-level validation failure returned inside a successful response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

// ============================================================================
// stagedUploadsCreate
// ============================================================================

/// One staged upload slot request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedUploadInput {
    pub filename: String,
    pub mime_type: String,
    pub resource: &'static str,
    /// Shopify's `UnsignedInt64` travels as a decimal string
    #[serde(serialize_with = "serialize_u64_as_string")]
    pub file_size: u64,
}

fn serialize_u64_as_string<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&value.to_string())
}

#[derive(Debug, Serialize)]
pub struct StagedUploadsCreateVariables<'a> {
    pub input: [&'a StagedUploadInput; 1],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedUploadsCreateData {
    pub staged_uploads_create: Option<StagedUploadsCreatePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedUploadsCreatePayload {
    #[serde(default)]
    pub staged_targets: Vec<StagedTarget>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

/// A pre-signed, single-use upload location
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedTarget {
    /// Direct upload URL on the storage provider
    pub url: String,
    /// Shopify-internal locator passed to `fileCreate`
    pub resource_url: String,
    /// Form fields in the exact order they must be sent
    #[serde(default)]
    pub parameters: Vec<StagedParameter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StagedParameter {
    pub name: String,
    pub value: String,
}

// ============================================================================
// fileCreate
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCreateInput {
    pub alt: String,
    pub content_type: &'static str,
    pub original_source: String,
}

#[derive(Debug, Serialize)]
pub struct FileCreateVariables<'a> {
    pub files: [&'a FileCreateInput; 1],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCreateData {
    pub file_create: Option<FileCreatePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCreatePayload {
    #[serde(default)]
    pub files: Vec<FileNode>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

/// A created file as returned by `fileCreate`
///
/// `GenericFile` carries `url` directly, `MediaImage` nests it in `image`.
#[derive(Debug, Clone, Deserialize)]
pub struct FileNode {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub image: Option<ImageNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageNode {
    #[serde(default)]
    pub url: Option<String>,
}

/// Kind of file object Shopify materialized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Generic,
    Image,
}

/// A registered file with its public URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreatedFile {
    Generic { id: String, url: String },
    Image { id: String, url: String },
}

impl CreatedFile {
    /// Resolve a `fileCreate` node into one of the two shapes
    ///
    /// Returns `None` when neither a direct nor a nested image URL exists.
    pub fn from_node(node: FileNode) -> Option<Self> {
        let FileNode { id, url, image } = node;
        match (url, image.and_then(|image| image.url)) {
            (Some(url), _) => Some(CreatedFile::Generic { id, url }),
            (None, Some(url)) => Some(CreatedFile::Image { id, url }),
            (None, None) => None,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            CreatedFile::Generic { id, .. } | CreatedFile::Image { id, .. } => id,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            CreatedFile::Generic { url, .. } | CreatedFile::Image { url, .. } => url,
        }
    }

    pub fn kind(&self) -> FileKind {
        match self {
            CreatedFile::Generic { .. } => FileKind::Generic,
            CreatedFile::Image { .. } => FileKind::Image,
        }
    }
}
