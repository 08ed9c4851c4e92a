#![cfg(feature = "s3")]

use super::{Location, ObjectStore};
use aws_sdk_s3::{primitives::ByteStream, Client};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::io::{Error, ErrorKind, Result};

/// S3 bucket access through an explicitly configured client
#[derive(Clone)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Client configured from the standard AWS environment and profile chain
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config))
    }

    fn bucket_and_key(location: &Location) -> Result<(&str, &str)> {
        match location {
            Location::S3 { bucket, key } => Ok((bucket.as_str(), key.as_str())),
            other => Err(Error::new(
                ErrorKind::Unsupported,
                format!("S3Store cannot reach {other}"),
            )),
        }
    }
}

impl fmt::Debug for S3Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Store").finish_non_exhaustive()
    }
}

impl ObjectStore for S3Store {
    fn get<'a>(&'a self, location: &'a Location) -> BoxFuture<'a, Result<Vec<u8>>> {
        async move {
            let (bucket, key) = Self::bucket_and_key(location)?;
            let response = self
                .client
                .get_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| Error::new(ErrorKind::NotConnected, format!("{e:?}")))?;
            let bytes = response.body.collect().await.map_err(|err| {
                Error::new(
                    ErrorKind::Interrupted,
                    format!("Failed to read from S3 download stream: {err:?}"),
                )
            })?;
            Ok(bytes.into_bytes().to_vec())
        }
        .boxed()
    }

    fn put<'a>(&'a self, location: &'a Location, bytes: Vec<u8>) -> BoxFuture<'a, Result<()>> {
        async move {
            let (bucket, key) = Self::bucket_and_key(location)?;
            self.client
                .put_object()
                .bucket(bucket)
                .key(key)
                .content_type("image/tiff")
                .body(ByteStream::from(bytes))
                .send()
                .await
                .map_err(|e| Error::new(ErrorKind::NotConnected, format!("{e:?}")))?;
            Ok(())
        }
        .boxed()
    }
}
