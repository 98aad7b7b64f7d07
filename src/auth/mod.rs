pub mod store;

pub use store::{ConfigCredentialStore, CredentialStore, MemoryCredentialStore, API_KEY};

const MIN_CREDENTIAL_LEN: usize = 35;

/// Cheap pre-flight check on the credential shape: non-empty, at least 35
/// characters of `[A-Za-z0-9_-]`. Real validity is only established by the
/// service probe.
pub fn is_valid_credential_format(credential: &str) -> bool {
    credential.len() >= MIN_CREDENTIAL_LEN
        && credential
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
}
