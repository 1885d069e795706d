//! Turns picked image files into `data:` URL previews.
//!
//! All files are read concurrently and the results are joined back in the
//! order they were picked. A file that cannot be read, or that is not an
//! image, is skipped: it is dropped from the batch entirely so previews and
//! files stay aligned, and reported in [`PreviewBatch::skipped`].

use std::future::Future;
use std::io;

use base64::{engine::general_purpose, Engine as _};
use futures_util::future::join_all;
use tracing::warn;

use crate::model::ImageFile;

/// Source of file bytes.
pub trait BlobReader {
    fn read(&self, file: &ImageFile) -> impl Future<Output = io::Result<Vec<u8>>> + Send;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FsReader;

impl BlobReader for FsReader {
    async fn read(&self, file: &ImageFile) -> io::Result<Vec<u8>> {
        tokio::fs::read(file.path()).await
    }
}

/// A picked file together with its rendered preview.
#[derive(Clone, Debug, PartialEq)]
pub struct PreviewImage {
    pub file: ImageFile,
    pub preview: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SkippedImage {
    pub file: ImageFile,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PreviewBatch {
    pub ready: Vec<PreviewImage>,
    pub skipped: Vec<SkippedImage>,
}

pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, general_purpose::STANDARD.encode(bytes))
}

pub async fn build_previews<R>(reader: &R, files: Vec<ImageFile>) -> PreviewBatch
where
    R: BlobReader + Sync,
{
    let reads = files.iter().map(|file| async move {
        let mime = file
            .mime()
            .ok_or_else(|| "not an image file".to_string())?;
        let bytes = reader.read(file).await.map_err(|e| e.to_string())?;
        Ok::<_, String>(data_url(mime, &bytes))
    });

    // join_all yields results in input order, whatever order the reads finish in.
    let results = join_all(reads).await;

    let mut batch = PreviewBatch::default();
    for (file, result) in files.into_iter().zip(results) {
        match result {
            Ok(preview) => batch.ready.push(PreviewImage { file, preview }),
            Err(reason) => {
                warn!(path = %file.path().display(), %reason, "skipping image preview");
                batch.skipped.push(SkippedImage { file, reason });
            }
        }
    }
    batch
}
