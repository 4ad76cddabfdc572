//! Streaming multipart bodies to staged files on disk.

use crate::error::AppError;
use crate::ports::media::StagedFile;
use axum::body::Bytes;
use axum::extract::Multipart;
use axum::BoxError;
use futures::{Stream, TryStreamExt};
use std::collections::HashMap;
use std::io;
use std::path::{Component, Path};
use tokio::{fs::File, io::BufWriter};
use tokio_util::io::StreamReader;

/// Text fields and files of one multipart request.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, StagedFile>,
}

impl MultipartForm {
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    pub fn file(&mut self, name: &str) -> Option<StagedFile> {
        self.files.remove(name)
    }
}

/// Read every field, staging files under `temp_dir`. Empty file inputs are ignored.
pub async fn read_multipart(
    mut multipart: Multipart,
    temp_dir: &Path,
) -> Result<MultipartForm, AppError> {
    tokio::fs::create_dir_all(temp_dir)
        .await
        .map_err(|err| AppError::Internal(format!("cannot create {:?}: {}", temp_dir, err)))?;

    let mut form = MultipartForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(err.body_text()))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        let file_name = match field.file_name() {
            Some(file_name) => file_name.to_owned(),
            None => {
                let value = field
                    .text()
                    .await
                    .map_err(|err| AppError::bad_request(err.body_text()))?;
                form.fields.insert(name, value);
                continue;
            }
        };
        if file_name.is_empty() {
            continue;
        }
        if !path_is_valid(Path::new(&file_name)) {
            return Err(AppError::bad_request("Invalid file name"));
        }

        let suffix = Path::new(&file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        let staged = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&suffix)
            .tempfile_in(temp_dir)
            .map_err(|err| AppError::Internal(format!("cannot stage upload: {}", err)))?
            .into_temp_path();

        tracing::debug!("staging {} as {:?}", file_name, staged);
        stream_to_file(&staged, field).await?;
        form.files.insert(
            name,
            StagedFile {
                path: staged,
                file_name,
            },
        );
    }
    Ok(form)
}

// Save a `Stream` to a file
pub async fn stream_to_file<S, E>(path: &Path, stream: S) -> Result<(), AppError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<BoxError>,
{
    async {
        let body_with_io_error = stream.map_err(|err| io::Error::new(io::ErrorKind::Other, err));
        let body_reader = StreamReader::new(body_with_io_error);
        futures::pin_mut!(body_reader);

        let mut file = BufWriter::new(File::create(path).await?);
        tokio::io::copy(&mut body_reader, &mut file).await?;
        tokio::io::AsyncWriteExt::flush(&mut file).await?;

        Ok::<_, io::Error>(())
    }
    .await
    .map_err(|err| AppError::Internal(err.to_string()))
}

/// A client file name must be a single plain component.
pub fn path_is_valid(path: &Path) -> bool {
    let mut components = path.components();
    matches!(components.next(), Some(Component::Normal(_))) && components.next().is_none()
}
