use std::sync::{LazyLock, Mutex, PoisonError};

static ENV_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// Every `RIDDLECHAT_*` variable the config layer reads.
const CONFIG_VARS: [&str; 4] = [
    "RIDDLECHAT_BASE_URL",
    "RIDDLECHAT_MAX_ATTEMPTS",
    "RIDDLECHAT_PERSIST_POLICY",
    "RIDDLECHAT_DATA_DIR",
];

struct Restore(Vec<(&'static str, Option<String>)>);

impl Drop for Restore {
    fn drop(&mut self) {
        for (key, previous) in self.0.drain(..) {
            // SAFETY: test-only; ENV_LOCK is held by `with_env` until after
            // this guard drops, so no other test touches the environment.
            unsafe {
                match previous {
                    Some(value) => std::env::set_var(key, value),
                    None => std::env::remove_var(key),
                }
            }
        }
    }
}

/// Run `body` with every config variable cleared except the ones given,
/// then put the environment back.
pub(crate) fn with_env<R>(vars: &[(&'static str, &str)], body: impl FnOnce() -> R) -> R {
    let _lock = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    let _restore = Restore(
        CONFIG_VARS
            .iter()
            .map(|key| (*key, std::env::var(key).ok()))
            .collect(),
    );
    for key in CONFIG_VARS {
        let value = vars.iter().find(|(k, _)| *k == key).map(|(_, v)| *v);
        // SAFETY: serialized by ENV_LOCK, restored by `_restore`.
        unsafe {
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }
    }
    body()
}
