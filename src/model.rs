use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of an article. Servers may send it as a number or a string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ArticleId(String);

impl ArticleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ArticleId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(n) => ArticleId(n.to_string()),
            Raw::Text(s) => ArticleId(s),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Article {
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    pub fn date_line(&self) -> String {
        self.created_at.format("%Y-%m-%d %H:%M").to_string()
    }
}

/// Fields sent when creating an article: text plus the raw files to upload.
#[derive(Clone, Debug, PartialEq)]
pub struct NewArticle {
    pub title: String,
    pub description: String,
    pub files: Vec<ImageFile>,
}

/// Fields sent when updating an article. Images are already references.
#[derive(Clone, Debug, PartialEq)]
pub struct ArticlePatch {
    pub title: String,
    pub description: String,
    pub images: Vec<String>,
}

/// A local image picked by the user, not yet read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageFile {
    path: PathBuf,
}

impl ImageFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// MIME type from the extension, `None` when the file is not an image.
    pub fn mime(&self) -> Option<&'static str> {
        let ext = self.path.extension()?.to_str()?.to_ascii_lowercase();
        let mime = match ext.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "bmp" => "image/bmp",
            "svg" => "image/svg+xml",
            "ico" => "image/x-icon",
            "tif" | "tiff" => "image/tiff",
            "avif" => "image/avif",
            _ => return None,
        };
        Some(mime)
    }

    /// `file://` reference used when the article only lives locally.
    pub fn local_reference(&self) -> String {
        let absolute = std::path::absolute(&self.path).unwrap_or_else(|_| self.path.clone());
        reqwest::Url::from_file_path(&absolute)
            .map(|u| u.to_string())
            .unwrap_or_else(|()| absolute.display().to_string())
    }
}

/// Parse the comma-separated path list typed into the image picker.
pub fn parse_image_paths(input: &str) -> Vec<ImageFile> {
    input
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(ImageFile::new)
        .collect()
}

/// Built-in collection shown when the backend cannot be reached.
pub fn sample_articles() -> Vec<Article> {
    let now = Utc::now();
    vec![
        Article {
            id: ArticleId::new("1"),
            title: "Tech Conference 2024 Announced".to_string(),
            description: "Join us for the biggest technology conference of the year featuring the latest innovations in AI, blockchain, and cloud computing. This event will bring together industry leaders, innovators, and tech enthusiasts from around the world.".to_string(),
            images: vec![
                "https://images.unsplash.com/photo-1540575467063-178a50c2df87?w=400".to_string(),
                "https://images.unsplash.com/photo-1505373877841-8d25f7d46678?w=400".to_string(),
            ],
            created_at: now,
        },
        Article {
            id: ArticleId::new("2"),
            title: "New Product Launch".to_string(),
            description: "We're excited to announce the launch of our revolutionary new product that will change the way you work and communicate with your team members.".to_string(),
            images: vec![
                "https://images.unsplash.com/photo-1556742049-0cfed4f6a45d?w=400".to_string(),
            ],
            created_at: now,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_numeric_and_string_ids() {
        let json = r#"[
            {"id": 7, "title": "A", "description": "a", "images": ["x"], "createdAt": "2024-05-01T10:00:00Z"},
            {"id": "abc", "title": "B", "description": "b"}
        ]"#;
        let articles: Vec<Article> = serde_json::from_str(json).unwrap();

        assert_eq!(articles[0].id, ArticleId::new("7"));
        assert_eq!(articles[0].images, vec!["x".to_string()]);
        assert_eq!(articles[0].date_line(), "2024-05-01 10:00");
        assert_eq!(articles[1].id.as_str(), "abc");
        assert!(articles[1].images.is_empty());
    }

    #[test]
    fn serializes_camel_case() {
        let article = sample_articles().remove(1);
        let value = serde_json::to_value(&article).unwrap();
        assert!(value.get("createdAt").is_some());
        assert_eq!(value["id"], "2");
    }

    #[test]
    fn mime_follows_extension() {
        assert_eq!(ImageFile::new("a/B.JPG").mime(), Some("image/jpeg"));
        assert_eq!(ImageFile::new("x.webp").mime(), Some("image/webp"));
        assert_eq!(ImageFile::new("notes.txt").mime(), None);
        assert_eq!(ImageFile::new("noext").mime(), None);
    }

    #[test]
    fn local_reference_is_file_url() {
        let r = ImageFile::new("/tmp/pic one.png").local_reference();
        assert_eq!(r, "file:///tmp/pic%20one.png");
    }

    #[test]
    fn parses_picker_input() {
        let files = parse_image_paths(" a.png, ,b.jpg,");
        assert_eq!(files, vec![ImageFile::new("a.png"), ImageFile::new("b.jpg")]);
    }

    #[test]
    fn sample_collection_has_two_articles() {
        let samples = sample_articles();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].images.len(), 2);
        assert_ne!(samples[0].id, samples[1].id);
    }
}
