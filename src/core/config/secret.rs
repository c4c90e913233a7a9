use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

use super::parsing::env_optional;

const KEY_BYTES: usize = 64;

/// Signing key for development setups without `SECRET_KEY`: read from the key
/// file, or generated and written there on first start.
pub(super) fn load_or_create_secret_key() -> String {
    let path = key_file_path();
    if let Some(existing) = read_key(&path) {
        return existing;
    }

    let generated = generate_key();
    match persist_key(&path, &generated) {
        Ok(()) => {
            tracing::info!(path = %path.display(), "Generated token signing key");
            generated
        }
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            // A concurrent start wrote the file first.
            read_key(&path).unwrap_or(generated)
        }
        Err(err) => {
            tracing::warn!(
                error = %err,
                path = %path.display(),
                "Signing key not persisted; tokens will not survive a restart"
            );
            generated
        }
    }
}

fn key_file_path() -> PathBuf {
    env_optional("SECRET_KEY_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(".lanexam_secret"))
}

fn read_key(path: &Path) -> Option<String> {
    let contents = fs::read_to_string(path).ok()?;
    let key = contents.trim();
    (!key.is_empty()).then(|| key.to_string())
}

fn persist_key(path: &Path, key: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = fs::OpenOptions::new().write(true).create_new(true).open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(key.as_bytes())
}

fn generate_key() -> String {
    let mut bytes = [0u8; KEY_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
