use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;

/// Byte source handed to a session for a single object write.
pub type ObjectReader<'a> = Box<dyn AsyncRead + Unpin + Send + 'a>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Failed to write {path}: {message}")]
    Write { path: String, message: String },

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Failed to delete {path}: {message}")]
    Delete { path: String, message: String },

    #[error("Operation cancelled")]
    Cancelled,
}

/// Opens sessions against a remote object store for a fixed bucket.
///
/// Providers hold only immutable configuration (the credential blob and the
/// bucket name). Every call to [`StorageProvider::open_session`] builds a fresh
/// client; nothing is cached or pooled between calls.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Short identifier used in logs and the health endpoint.
    fn name(&self) -> &'static str;

    fn bucket(&self) -> &str;

    async fn open_session(&self) -> Result<Box<dyn StorageSession>, StoreError>;
}

/// An authenticated handle on the remote store.
///
/// Callers must finish with [`StorageSession::close`]. Dropping a session
/// without closing it (for instance while unwinding) still releases the
/// underlying client.
#[async_trait]
pub trait StorageSession: Send + Sync {
    /// Streams all bytes from `reader` to `path`, replacing any existing object.
    ///
    /// The object only becomes visible once the stream has been fully copied.
    /// On failure or cancellation the in-progress upload is aborted and the
    /// previous state of `path` is left untouched. Cancellation is observed
    /// while bytes are streamed; a commit that has started runs to completion.
    async fn write_object<'a>(
        &self,
        path: &str,
        reader: ObjectReader<'a>,
        cancel: &CancellationToken,
    ) -> Result<u64, StoreError>;

    async fn delete_object(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<(), StoreError>;

    async fn close(self: Box<Self>);
}

/// Reads until `limit` bytes are buffered or the source is exhausted.
pub(crate) async fn read_chunk<R>(reader: &mut R, limit: usize) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buffer = vec![0u8; limit];
    let mut filled = 0;
    while filled < limit {
        let read = reader.read(&mut buffer[filled..]).await?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    buffer.truncate(filled);
    Ok(buffer)
}
