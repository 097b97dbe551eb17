//! Upload user images to the media host.

use std::io::Write;
use std::sync::Arc;

use cloudinary::upload::result::UploadResult;
use cloudinary::upload::{Source, Upload, UploadOptions};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::config::Media;

type Result<T> = std::result::Result<T, MediaError>;

#[derive(thiserror::Error, Debug)]
pub enum MediaError {
    #[error("no media host configured")]
    NotConfigured,
    #[error("failed to stage upload file: {0}")]
    Io(#[from] std::io::Error),
    #[error("media host rejected upload: {0}")]
    Host(String),
}

/// Media host (Cloudinary) instance manager.
///
/// Built once at startup from the configuration file and shared through the
/// application state. Credentials are never reloaded per request.
#[derive(Clone, Default)]
pub struct MediaManager {
    client: Option<Arc<Upload>>,
}

impl MediaManager {
    /// Create a new [`MediaManager`].
    pub fn new(config: &Media) -> Self {
        let client = Upload::new(
            config.api_key.clone(),
            config.cloud_name.clone(),
            config.api_secret.clone(),
        );

        tracing::info!(cloud_name = %config.cloud_name, "media host configured");

        Self {
            client: Some(Arc::new(client)),
        }
    }

    /// Upload an image buffer and return its public URL.
    ///
    /// The buffer is staged through a temporary file which is removed when
    /// the handle drops, whether the upload succeeded or not.
    pub async fn upload(&self, buffer: &[u8]) -> Result<String> {
        let Some(client) = &self.client else {
            return Err(MediaError::NotConfigured);
        };

        let public_id = Uuid::new_v4().simple().to_string();
        let options = UploadOptions::new().set_public_id(public_id);

        let mut temp_file = NamedTempFile::new()?;
        temp_file.write_all(buffer)?;
        let path_buf = temp_file.path().to_path_buf();

        let result = client
            .image(Source::Path(path_buf), &options)
            .await
            .map_err(|err| MediaError::Host(err.to_string()))?;

        match result {
            UploadResult::Success(response) => Ok(response.secure_url),
            UploadResult::Error(err) => {
                Err(MediaError::Host(err.error.message))
            },
        }
    }
}
