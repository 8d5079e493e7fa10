//! Request payloads for the write operations.

use std::collections::BTreeMap;
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;

use crate::error::Result;

/// Request to create a repository for the authenticated user.
#[derive(Debug, Clone, Serialize)]
pub struct CreateRepository {
    /// Repository name.
    pub name: String,

    /// Repository description.
    pub description: String,

    /// Whether the repository is private.
    pub private: bool,

    /// `.gitignore` template to apply, e.g. `"Rust"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gitignore_template: Option<String>,

    /// License keyword to apply, e.g. `"mit"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_template: Option<String>,
}

impl CreateRepository {
    /// A private repository with the default description.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: "Repository created using hubkit.".into(),
            private: true,
            gitignore_template: None,
            license_template: None,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Make the repository public or private.
    #[must_use]
    pub const fn public(mut self, public: bool) -> Self {
        self.private = !public;
        self
    }

    /// Apply a `.gitignore` template.
    #[must_use]
    pub fn gitignore(mut self, template: impl Into<String>) -> Self {
        self.gitignore_template = Some(template.into());
        self
    }

    /// Apply a license.
    #[must_use]
    pub fn license(mut self, license: impl Into<String>) -> Self {
        self.license_template = Some(license.into());
        self
    }
}

/// A file to upload in a gist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    /// File name inside the gist.
    pub filename: String,

    /// File content.
    pub content: String,
}

impl File {
    /// Create a file from in-memory content.
    #[must_use]
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }

    /// Read a file from disk, naming it after the path's file name.
    ///
    /// # Errors
    /// Returns error if the file can't be read.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let filename = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self { filename, content })
    }
}

/// Request to create a gist.
#[derive(Debug, Clone)]
pub struct CreateGist {
    /// Files to upload.
    pub files: Vec<File>,

    /// Gist description.
    pub description: String,

    /// Whether the gist is public.
    pub public: bool,
}

impl CreateGist {
    /// A public gist with the default description.
    #[must_use]
    pub fn new(files: Vec<File>) -> Self {
        Self {
            files,
            description: "Gist from hubkit".into(),
            public: true,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Make the gist public or secret.
    #[must_use]
    pub const fn public(mut self, public: bool) -> Self {
        self.public = public;
        self
    }

    /// The JSON body the gists API expects.
    pub(crate) fn body(&self) -> GistBody<'_> {
        GistBody {
            description: &self.description,
            public: self.public,
            files: self
                .files
                .iter()
                .map(|f| {
                    (
                        f.filename.as_str(),
                        GistFileBody {
                            filename: &f.filename,
                            content: &f.content,
                        },
                    )
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct GistBody<'a> {
    description: &'a str,
    public: bool,
    files: BTreeMap<&'a str, GistFileBody<'a>>,
}

#[derive(Debug, Serialize)]
struct GistFileBody<'a> {
    filename: &'a str,
    content: &'a str,
}

/// Request to add a file to a repository.
#[derive(Debug, Clone)]
pub struct AddFile {
    /// Path of the file inside the repository.
    pub path: String,

    /// Commit message.
    pub message: String,

    /// File content (plain text; encoded on the wire).
    pub content: String,

    /// Target branch; the repository default when unset.
    pub branch: Option<String>,
}

impl AddFile {
    /// The JSON body the contents API expects.
    pub(crate) fn body(&self) -> AddFileBody<'_> {
        AddFileBody {
            message: &self.message,
            content: BASE64.encode(self.content.as_bytes()),
            branch: self.branch.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AddFileBody<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}
