use std::future::Future;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::model::{Article, ArticleId, ArticlePatch, NewArticle};

/// The remote news API. Implemented over HTTP in production and by fakes in tests.
pub trait NewsBackend {
    fn fetch_all(&self) -> impl Future<Output = ApiResult<Vec<Article>>> + Send;

    fn create(&self, article: &NewArticle) -> impl Future<Output = ApiResult<Article>> + Send;

    fn update(
        &self,
        id: &ArticleId,
        patch: &ArticlePatch,
    ) -> impl Future<Output = ApiResult<Article>> + Send;

    fn delete(&self, id: &ArticleId) -> impl Future<Output = ApiResult<()>> + Send;
}

#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: Client,
    config: Config,
}

impl HttpBackend {
    pub fn new(config: Config) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent("newsdesk/0.1 (Rust; TUI)")
            .build()?;
        Ok(Self { client, config })
    }

    async fn execute(&self, request: RequestBuilder, timeout: Duration) -> ApiResult<Response> {
        request
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(e, timeout))?
            .error_for_status()
            .map_err(|e| ApiError::from_reqwest(e, timeout))
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        timeout: Duration,
    ) -> ApiResult<T> {
        self.execute(request, timeout)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ApiError::from_reqwest(e, timeout))
    }

    /// Whether an image reference can currently be displayed.
    pub async fn image_available(&self, reference: &str) -> bool {
        if reference.starts_with("data:") {
            return true;
        }
        let Ok(url) = Url::parse(reference) else {
            return false;
        };

        match url.scheme() {
            "file" => match url.to_file_path() {
                Ok(path) => tokio::fs::try_exists(&path).await.unwrap_or(false),
                Err(()) => false,
            },
            "http" | "https" => {
                let timeout = self.config.read_timeout;
                let head = self.client.head(url.clone()).timeout(timeout).send().await;
                match head {
                    Ok(r) if r.status() == StatusCode::METHOD_NOT_ALLOWED => self
                        .client
                        .get(url)
                        .timeout(timeout)
                        .send()
                        .await
                        .map(|r| r.status().is_success())
                        .unwrap_or(false),
                    Ok(r) => r.status().is_success(),
                    Err(_) => false,
                }
            }
            _ => false,
        }
    }
}

impl NewsBackend for HttpBackend {
    async fn fetch_all(&self) -> ApiResult<Vec<Article>> {
        let url = self.config.news_url();
        debug!(%url, "fetching articles");
        self.execute_json(self.client.get(url), self.config.read_timeout)
            .await
    }

    async fn create(&self, article: &NewArticle) -> ApiResult<Article> {
        let timeout = self.config.write_timeout;
        let mut form = Form::new()
            .text("title", article.title.clone())
            .text("description", article.description.clone());

        for file in &article.files {
            let bytes = tokio::fs::read(file.path())
                .await
                .map_err(|source| ApiError::Upload {
                    path: file.path().to_path_buf(),
                    source,
                })?;
            let mut part = Part::bytes(bytes).file_name(file.name());
            if let Some(mime) = file.mime() {
                part = part
                    .mime_str(mime)
                    .map_err(|e| ApiError::from_reqwest(e, timeout))?;
            }
            form = form.part("images", part);
        }

        let url = self.config.news_url();
        debug!(%url, files = article.files.len(), "creating article");
        self.execute_json(self.client.post(url).multipart(form), timeout)
            .await
    }

    async fn update(&self, id: &ArticleId, patch: &ArticlePatch) -> ApiResult<Article> {
        let mut form = Form::new()
            .text("title", patch.title.clone())
            .text("description", patch.description.clone());
        for image in &patch.images {
            form = form.text("images", image.clone());
        }

        let url = self.config.article_url(id.as_str());
        debug!(%url, images = patch.images.len(), "updating article");
        self.execute_json(self.client.put(url).multipart(form), self.config.write_timeout)
            .await
    }

    async fn delete(&self, id: &ArticleId) -> ApiResult<()> {
        let url = self.config.article_url(id.as_str());
        debug!(%url, "deleting article");
        self.execute(self.client.delete(url), self.config.read_timeout)
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ImageFile;
    use axum::extract::{Multipart, Path};
    use axum::routing::{get, put};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn backend(base: &str) -> HttpBackend {
        backend_with_timeouts(base, "2", "2")
    }

    fn backend_with_timeouts(base: &str, read: &str, write: &str) -> HttpBackend {
        let config = Config::from_lookup(|key| match key {
            "NEWSDESK_API_URL" => Some(base.to_string()),
            "NEWSDESK_READ_TIMEOUT_SECS" => Some(read.to_string()),
            "NEWSDESK_WRITE_TIMEOUT_SECS" => Some(write.to_string()),
            _ => None,
        })
        .unwrap();
        HttpBackend::new(config).unwrap()
    }

    /// Echoes the multipart body back as an article, so tests can inspect what was sent.
    async fn echo(id: &str, mut multipart: Multipart) -> Json<Value> {
        let mut title = String::new();
        let mut description = String::new();
        let mut images = Vec::new();
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await.unwrap();
            let text = String::from_utf8_lossy(&data).into_owned();
            match name.as_str() {
                "title" => title = text,
                "description" => description = text,
                "images" => images.push(match file_name {
                    Some(f) => format!(
                        "https://cdn.test/{f}?type={}&bytes={}",
                        content_type.unwrap_or_default(),
                        data.len()
                    ),
                    None => text,
                }),
                _ => {}
            }
        }
        Json(json!({
            "id": id,
            "title": title,
            "description": description,
            "images": images,
            "createdAt": "2024-01-01T00:00:00Z",
        }))
    }

    fn router() -> Router {
        Router::new()
            .route(
                "/api/news",
                get(|| async {
                    Json(json!([
                        {"id": 1, "title": "One", "description": "first", "images": []},
                        {"id": 2, "title": "Two", "description": "second", "images": ["u"]}
                    ]))
                })
                .post(|mp: Multipart| echo("srv-1", mp)),
            )
            .route(
                "/api/news/:id",
                put(|Path(id): Path<String>, mp: Multipart| async move { echo(&id, mp).await })
                    .delete(|| async { axum::http::StatusCode::NO_CONTENT }),
            )
    }

    #[tokio::test]
    async fn lists_articles() {
        let base = serve(router()).await;
        let articles = backend(&base).fetch_all().await.unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].id, ArticleId::new("1"));
        assert_eq!(articles[1].images, vec!["u".to_string()]);
    }

    #[tokio::test]
    async fn creates_with_file_parts_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.jpg");
        std::fs::write(&a, b"1234").unwrap();
        std::fs::write(&b, b"12").unwrap();

        let base = serve(router()).await;
        let created = backend(&base)
            .create(&NewArticle {
                title: "T".into(),
                description: "D".into(),
                files: vec![ImageFile::new(&a), ImageFile::new(&b)],
            })
            .await
            .unwrap();

        assert_eq!(created.id, ArticleId::new("srv-1"));
        assert_eq!(created.title, "T");
        assert_eq!(
            created.images,
            vec![
                "https://cdn.test/a.png?type=image/png&bytes=4".to_string(),
                "https://cdn.test/b.jpg?type=image/jpeg&bytes=2".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn create_fails_when_file_is_missing() {
        let base = serve(router()).await;
        let err = backend(&base)
            .create(&NewArticle {
                title: "T".into(),
                description: "D".into(),
                files: vec![ImageFile::new("/definitely/not/here.png")],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Upload { .. }));
    }

    #[tokio::test]
    async fn updates_with_image_references() {
        let base = serve(router()).await;
        let updated = backend(&base)
            .update(
                &ArticleId::new("9"),
                &ArticlePatch {
                    title: "New".into(),
                    description: "Body".into(),
                    images: vec!["https://x/1.png".into(), "https://x/2.png".into()],
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.id, ArticleId::new("9"));
        assert_eq!(updated.images, vec!["https://x/1.png", "https://x/2.png"]);
    }

    #[tokio::test]
    async fn deletes() {
        let base = serve(router()).await;
        backend(&base).delete(&ArticleId::new("1")).await.unwrap();
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let failing = Router::new().route(
            "/api/news",
            get(|| async { axum::http::StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let base = serve(failing).await;
        let err = backend(&base).fetch_all().await.unwrap_err();
        assert!(matches!(err, ApiError::Status(s) if s == StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[tokio::test]
    async fn unreachable_backend_is_an_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = backend(&format!("http://{addr}")).fetch_all().await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_) | ApiError::Timeout(_)));
    }

    fn stalled_router() -> Router {
        let stall = || async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(json!([]))
        };
        Router::new()
            .route("/api/news", get(stall).post(stall))
            .route("/api/news/:id", put(stall).delete(stall))
    }

    #[tokio::test]
    async fn stalled_reads_time_out() {
        let base = serve(stalled_router()).await;
        let backend = backend_with_timeouts(&base, "1", "5");

        let started = std::time::Instant::now();
        let err = backend.fetch_all().await.unwrap_err();
        assert!(matches!(err, ApiError::Timeout(t) if t == Duration::from_secs(1)));
        assert!(started.elapsed() < Duration::from_millis(2500));

        let err = backend.delete(&ArticleId::new("1")).await.unwrap_err();
        assert!(matches!(err, ApiError::Timeout(t) if t == Duration::from_secs(1)));

        let completion = crate::page::fetch_articles(&backend).await;
        assert!(matches!(&completion, crate::page::Completion::Loaded(s) if !s.is_remote()));
    }

    #[tokio::test]
    async fn stalled_writes_use_the_write_timeout() {
        let base = serve(stalled_router()).await;
        let backend = backend_with_timeouts(&base, "5", "1");
        let err = backend
            .update(
                &ArticleId::new("1"),
                &ArticlePatch {
                    title: "T".into(),
                    description: "D".into(),
                    images: vec![],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Timeout(t) if t == Duration::from_secs(1)));
    }

    #[tokio::test]
    async fn probes_local_references() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("pic.png");
        std::fs::write(&file, b"x").unwrap();

        let backend = backend("http://127.0.0.1:9");
        assert!(backend.image_available("data:image/png;base64,AAAA").await);
        assert!(backend.image_available(&ImageFile::new(&file).local_reference()).await);
        assert!(!backend.image_available("file:///definitely/not/here.png").await);
        assert!(!backend.image_available("not a url").await);
    }
}
