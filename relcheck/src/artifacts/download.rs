//! Artifact download through the CI redirect

use std::path::Path;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use reqwest::{Client, StatusCode};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info};

use crate::errors::VerifyError;
use crate::filesys::file::File;
use crate::http::ci_api::CiApi;
use crate::http::client::user_agent;

/// Largest single write to the destination file
pub const CHUNK_SIZE: usize = 16 * 1024;

/// Downloads artifact archives to local files
pub struct BlobDownloader<C: CiApi + ?Sized> {
    ci: Arc<C>,
    storage: Client,
}

impl<C: CiApi + ?Sized> BlobDownloader<C> {
    pub fn new(ci: Arc<C>) -> Result<Self, VerifyError> {
        let storage = Client::builder().user_agent(user_agent()).build()?;
        Ok(Self { ci, storage })
    }

    /// Download `download_url` into `destination`, returning the bytes written.
    ///
    /// The CI endpoint must answer with a 302 pointing at blob storage;
    /// anything else fails before the destination is created. A failure
    /// mid-stream leaves the partial file in place.
    pub async fn download_artifact(
        &self,
        download_url: &str,
        destination: &Path,
    ) -> Result<u64, VerifyError> {
        let response = self.ci.raw_get(download_url).await?;

        let location = match (response.status, response.location) {
            (status, Some(location)) if status == StatusCode::FOUND.as_u16() => location,
            (status, _) => {
                error!("Artifact endpoint answered {} instead of a redirect", status);
                return Err(VerifyError::UnexpectedResponse {
                    status,
                    body: response.body,
                });
            }
        };
        debug!("Artifact redirected to blob storage");

        let blob = self.storage.get(&location).send().await?.error_for_status()?;

        let target = File::new(destination);
        let mut handle = target.create().await?;
        let written = write_chunked(Box::pin(blob.bytes_stream()), &mut handle).await?;

        info!("Downloaded {} bytes to {}", written, destination.display());
        Ok(written)
    }
}

/// Append every item of `stream` to `sink` in order, never writing more than
/// [`CHUNK_SIZE`] bytes at once. The sink is flushed before returning.
pub async fn write_chunked<S, B, E, W>(mut stream: S, sink: &mut W) -> Result<u64, VerifyError>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Into<VerifyError>,
    W: AsyncWrite + Unpin,
{
    let mut written: u64 = 0;
    while let Some(item) = stream.next().await {
        let bytes = item.map_err(Into::into)?;
        for piece in bytes.as_ref().chunks(CHUNK_SIZE) {
            sink.write_all(piece).await?;
            written += piece.len() as u64;
        }
    }
    sink.flush().await?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use futures::stream;

    use super::*;

    /// Sink that records the size of every write it receives
    #[derive(Default)]
    struct RecordingSink {
        data: Vec<u8>,
        writes: Vec<usize>,
    }

    impl AsyncWrite for RecordingSink {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            self.data.extend_from_slice(buf);
            self.writes.push(buf.len());
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_large_items_are_split() {
        let payload: Vec<u8> = (0..(CHUNK_SIZE * 2 + 100)).map(|i| (i % 251) as u8).collect();
        let items = vec![Ok::<_, io::Error>(payload.clone())];
        let mut sink = RecordingSink::default();

        let written = write_chunked(stream::iter(items), &mut sink).await.unwrap();

        assert_eq!(written, payload.len() as u64);
        assert_eq!(sink.data, payload);
        assert_eq!(sink.writes, vec![CHUNK_SIZE, CHUNK_SIZE, 100]);
    }

    #[tokio::test]
    async fn test_items_are_written_in_stream_order() {
        let items = vec![
            Ok::<_, io::Error>(b"first-".to_vec()),
            Ok(b"second-".to_vec()),
            Ok(b"third".to_vec()),
        ];
        let mut sink = RecordingSink::default();

        write_chunked(stream::iter(items), &mut sink).await.unwrap();

        assert_eq!(sink.data, b"first-second-third");
        assert!(sink.writes.iter().all(|size| *size <= CHUNK_SIZE));
    }

    #[tokio::test]
    async fn test_stream_error_stops_the_copy() {
        let items = vec![
            Ok(b"partial".to_vec()),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
            Ok(b"never".to_vec()),
        ];
        let mut sink = RecordingSink::default();

        let result = write_chunked(stream::iter(items), &mut sink).await;

        assert!(matches!(result, Err(VerifyError::IoError(_))));
        assert_eq!(sink.data, b"partial");
    }
}
