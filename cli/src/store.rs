use std::fs;
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use otf_engine::{ModifierSnapshot, ModifierStore, OtfError};

/// Decode file bytes, honoring a UTF-8/UTF-16 byte-order mark.
pub fn decode_text(bytes: Vec<u8>) -> Result<String, std::string::FromUtf8Error> {
    if let Some((enc, bom_len)) = Encoding::for_bom(&bytes) {
        let (cow, _, _) = enc.decode(&bytes[bom_len..]);
        Ok(cow.into_owned())
    } else {
        String::from_utf8(bytes)
    }
}

pub fn read_text_auto(path: &Path) -> anyhow::Result<String> {
    let bytes = fs::read(path)?;
    Ok(decode_text(bytes)?)
}

/// Bucket persisted as a JSON snapshot. A missing file is an empty bucket.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io(&self, source: std::io::Error) -> OtfError {
        OtfError::Io { path: self.path.clone(), source }
    }
}

impl ModifierStore for FileStore {
    fn save(&mut self, snapshot: &ModifierSnapshot) -> otf_engine::Result<()> {
        let json = serde_json::to_string_pretty(snapshot)?;
        fs::write(&self.path, json).map_err(|e| self.io(e))
    }

    fn load(&self) -> otf_engine::Result<Option<ModifierSnapshot>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io(e)),
        };
        let text = decode_text(bytes).map_err(|e| OtfError::Decode(e.to_string()))?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&text)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bom_is_stripped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(br#"{"modifierList":[],"currentSum":0}"#);
        assert!(decode_text(bytes).unwrap().starts_with('{'));
    }

    #[test]
    fn missing_file_is_empty_bucket() {
        let store = FileStore::new(std::env::temp_dir().join("otf-cli-no-such-bucket.json"));
        assert_eq!(store.load().unwrap(), None);
    }
}
