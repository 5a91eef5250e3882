use thiserror::Error;

/// Errors returned by store updates.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A transform update failed. The store value is unchanged.
    #[error("Update '{action}' on store '{store}' failed: {source}")]
    Transform {
        store: String,
        action: String,
        #[source]
        source: anyhow::Error,
    },

    /// The store behind a setter or selector has been dropped.
    #[error("Store '{store}' is no longer alive")]
    Closed { store: String },
}
