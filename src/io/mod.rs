// Storage handles
//   Location names an object on local disk or in an S3 bucket
//   ObjectStore reads and writes whole objects; handles are passed in explicitly
//   RoutingStore picks the handle matching a location

use std::fmt;
use std::io::{Error, ErrorKind, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub mod s3;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    Local(PathBuf),
    S3 { bucket: String, key: String },
}

impl Location {
    /// `s3://bucket/key` or a filesystem path
    pub fn parse(s: &str) -> Result<Self> {
        match s.strip_prefix("s3://") {
            Some(rest) => {
                let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
                if bucket.is_empty() {
                    return Err(Error::new(
                        ErrorKind::InvalidInput,
                        format!("Missing bucket in {s}"),
                    ));
                }
                Ok(Location::S3 {
                    bucket: bucket.to_string(),
                    key: key.trim_matches('/').to_string(),
                })
            }
            None if s.is_empty() => Err(Error::new(ErrorKind::InvalidInput, "Empty location")),
            None => Ok(Location::Local(PathBuf::from(s))),
        }
    }

    pub fn local<P: AsRef<Path>>(path: P) -> Self {
        Location::Local(path.as_ref().to_path_buf())
    }

    /// Child object `name` under this location
    pub fn join(&self, name: &str) -> Self {
        match self {
            Location::Local(path) => Location::Local(path.join(name)),
            Location::S3 { bucket, key } if key.is_empty() => Location::S3 {
                bucket: bucket.clone(),
                key: name.to_string(),
            },
            Location::S3 { bucket, key } => Location::S3 {
                bucket: bucket.clone(),
                key: format!("{}/{name}", key.trim_end_matches('/')),
            },
        }
    }

    pub fn is_s3(&self) -> bool {
        matches!(self, Location::S3 { .. })
    }
}

impl FromStr for Location {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Location::parse(s)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Local(path) => write!(f, "{}", path.display()),
            Location::S3 { bucket, key } => write!(f, "s3://{bucket}/{key}"),
        }
    }
}

#[cfg(feature = "async")]
pub use not_sync::*;
#[cfg(feature = "async")]
mod not_sync {
    use super::*;
    use futures::future::BoxFuture;
    use futures::FutureExt;

    pub trait ObjectStore: Send + Sync {
        /// Whole object at `location`
        fn get<'a>(&'a self, location: &'a Location) -> BoxFuture<'a, Result<Vec<u8>>>;

        /// Create or replace the object at `location`
        fn put<'a>(&'a self, location: &'a Location, bytes: Vec<u8>) -> BoxFuture<'a, Result<()>>;
    }

    fn wrong_store(store: &str, location: &Location) -> Error {
        Error::new(
            ErrorKind::Unsupported,
            format!("{store} cannot reach {location}"),
        )
    }

    /// Local filesystem
    #[derive(Debug, Clone, Default)]
    pub struct FsStore;

    impl ObjectStore for FsStore {
        fn get<'a>(&'a self, location: &'a Location) -> BoxFuture<'a, Result<Vec<u8>>> {
            async move {
                match location {
                    Location::Local(path) => tokio::fs::read(path).await,
                    other => Err(wrong_store("FsStore", other)),
                }
            }
            .boxed()
        }

        fn put<'a>(&'a self, location: &'a Location, bytes: Vec<u8>) -> BoxFuture<'a, Result<()>> {
            async move {
                match location {
                    Location::Local(path) => {
                        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                            tokio::fs::create_dir_all(parent).await?;
                        }
                        tokio::fs::write(path, bytes).await
                    }
                    other => Err(wrong_store("FsStore", other)),
                }
            }
            .boxed()
        }
    }

    /// Dispatches local paths to the filesystem and S3 urls to an S3 handle
    #[derive(Default)]
    pub struct RoutingStore {
        fs: FsStore,
        #[cfg(feature = "s3")]
        s3: Option<super::s3::S3Store>,
    }

    impl RoutingStore {
        pub fn new() -> Self {
            Self::default()
        }

        #[cfg(feature = "s3")]
        pub fn with_s3(mut self, store: super::s3::S3Store) -> Self {
            self.s3 = Some(store);
            self
        }

        fn route(&self, location: &Location) -> Result<&dyn ObjectStore> {
            match location {
                Location::Local(_) => Ok(&self.fs),
                #[cfg(feature = "s3")]
                Location::S3 { .. } => match &self.s3 {
                    Some(store) => Ok(store),
                    None => Err(Error::new(
                        ErrorKind::NotConnected,
                        format!("No S3 client configured for {location}"),
                    )),
                },
                #[cfg(not(feature = "s3"))]
                Location::S3 { .. } => Err(Error::new(
                    ErrorKind::Unsupported,
                    format!("S3 support not enabled for {location}"),
                )),
            }
        }
    }

    impl ObjectStore for RoutingStore {
        fn get<'a>(&'a self, location: &'a Location) -> BoxFuture<'a, Result<Vec<u8>>> {
            match self.route(location) {
                Ok(store) => store.get(location),
                Err(e) => futures::future::ready(Err(e)).boxed(),
            }
        }

        fn put<'a>(&'a self, location: &'a Location, bytes: Vec<u8>) -> BoxFuture<'a, Result<()>> {
            match self.route(location) {
                Ok(store) => store.put(location, bytes),
                Err(e) => futures::future::ready(Err(e)).boxed(),
            }
        }
    }
}
