//! Resolves a Telegram file id to raw bytes: `getFile`, then download.

use tracing::debug;

use crate::error::FetchError;
use crate::telegram::TelegramClient;

/// A file id together with the server-side path returned by `getFile`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReference {
    pub file_id: String,
    pub file_path: String,
}

/// Looks up the server-side path for `file_id`.
///
/// # Errors
/// Returns a lookup error if the API call fails, reports `ok: false`, or
/// omits `file_path`.
pub async fn resolve(client: &TelegramClient, file_id: &str) -> Result<FileReference, FetchError> {
    let file = client
        .get_file(file_id)
        .await
        .map_err(|source| FetchError::Lookup {
            file_id: file_id.to_string(),
            source,
        })?;

    let file_path = file
        .file_path
        .filter(|path| !path.trim().is_empty())
        .ok_or_else(|| FetchError::MissingFilePath {
            file_id: file_id.to_string(),
        })?;

    Ok(FileReference {
        file_id: file_id.to_string(),
        file_path,
    })
}

/// Downloads the content behind a resolved reference.
///
/// # Errors
/// Returns a download error on transport failure or any non-200 status.
pub async fn download(
    client: &TelegramClient,
    reference: &FileReference,
) -> Result<Vec<u8>, FetchError> {
    client
        .download_file(&reference.file_path)
        .await
        .map_err(|source| FetchError::Download {
            file_path: reference.file_path.clone(),
            source,
        })
}

/// Fetches a file end to end. A failed lookup never triggers a download.
///
/// # Errors
/// Returns the first failing step's error.
pub async fn fetch_file(client: &TelegramClient, file_id: &str) -> Result<Vec<u8>, FetchError> {
    let reference = resolve(client, file_id).await?;
    let bytes = download(client, &reference).await?;
    debug!(
        file_id = %reference.file_id,
        file_path = %reference.file_path,
        bytes = bytes.len(),
        "downloaded file"
    );
    Ok(bytes)
}
