use crate::BoxFuture;
use anyhow::Result;

/// Durable string-keyed storage underneath the session history.
pub trait KvBackend: Send + Sync {
    fn name(&self) -> &str;

    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>>>;

    fn put<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, Result<()>>;

    fn remove<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<bool>>;
}
