use semver::Version;
use serde::{Deserialize, Serialize};

/// Fixed description of a page, set once when the controller is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    /// Page id, also the prefix of its action ids by convention.
    pub page_id: String,
    /// Display name.
    pub name: String,
    /// Short description.
    pub description: String,
    /// Grouping used by the console navigation.
    pub category: String,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Permissions needed to open the page at all.
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Page version.
    pub version: Version,
}

/// Builder for [`PageMetadata`].
///
/// ```rust,ignore
/// let config = PageConfig::new("objects", "Objects")
///     .describe("Browse and edit records")
///     .with_permission("objects:read");
/// ```
#[derive(Debug, Clone)]
pub struct PageConfig {
    metadata: PageMetadata,
}

impl PageConfig {
    /// Page with an id and display name.
    pub fn new(page_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            metadata: PageMetadata {
                page_id: page_id.into(),
                name: name.into(),
                description: String::new(),
                category: "general".to_owned(),
                tags: Vec::new(),
                permissions: Vec::new(),
                version: Version::new(1, 0, 0),
            },
        }
    }

    /// Set the description.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = description.into();
        self
    }

    /// Set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.metadata.category = category.into();
        self
    }

    /// Add a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.metadata.tags.push(tag.into());
        self
    }

    /// Add a page-level permission.
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.metadata.permissions.push(permission.into());
        self
    }

    /// Set the version.
    pub fn with_version(mut self, major: u64, minor: u64, patch: u64) -> Self {
        self.metadata.version = Version::new(major, minor, patch);
        self
    }

    /// Finish.
    pub fn build(self) -> PageMetadata {
        self.metadata
    }
}

impl From<PageConfig> for PageMetadata {
    fn from(config: PageConfig) -> Self {
        config.build()
    }
}
