use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Default)]
struct SessionData {
    #[serde(flatten)]
    data: HashMap<String, String>,
}

/// The signed-in user record kept between CLI invocations (`session.toml`).
#[derive(Debug)]
pub struct SessionFile {
    path: PathBuf,
    values: HashMap<String, String>,
}

impl SessionFile {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            values: HashMap::new(),
        }
    }

    pub fn load(&mut self) -> Result<()> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            let data: SessionData = toml::from_str(&content)?;
            self.values = data.data;
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = SessionData {
            data: self.values.clone(),
        };
        let content = toml::to_string_pretty(&data)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    /// Forget the signed-in user and delete the file.
    pub fn clear(&mut self) -> Result<()> {
        self.values.clear();
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: String, value: String) {
        self.values.insert(key, value);
    }

    pub fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }

    pub fn get_user_id(&self) -> Option<&String> {
        self.get("user_id")
    }

    pub fn set_user_id(&mut self, user_id: String) {
        self.set("user_id".to_string(), user_id);
    }

    pub fn get_email(&self) -> Option<&String> {
        self.get("email")
    }

    pub fn set_email(&mut self, email: String) {
        self.set("email".to_string(), email);
    }

    pub fn get_id_token(&self) -> Option<&String> {
        self.get("id_token")
    }

    pub fn set_id_token(&mut self, token: String) {
        self.set("id_token".to_string(), token);
    }

    pub fn get_refresh_token(&self) -> Option<&String> {
        self.get("refresh_token")
    }

    pub fn set_refresh_token(&mut self, token: String) {
        self.set("refresh_token".to_string(), token);
    }

    pub fn get_token_expires(&self) -> Option<DateTime<Utc>> {
        self.get("token_expires")
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn set_token_expires(&mut self, expires: DateTime<Utc>) {
        self.set("token_expires".to_string(), expires.to_rfc3339());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_session_file_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();

        let mut session = SessionFile::new(path.clone());
        session.set_user_id("uid-1".to_string());
        session.set_email("reader@example.com".to_string());
        session.save().unwrap();

        let mut loaded = SessionFile::new(path);
        loaded.load().unwrap();
        assert_eq!(loaded.get_user_id(), Some(&"uid-1".to_string()));
        assert_eq!(loaded.get_email(), Some(&"reader@example.com".to_string()));
        assert_eq!(loaded.get_id_token(), None);
    }

    #[test]
    fn test_session_file_token_expires() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();

        let mut session = SessionFile::new(path.clone());
        let expires = Utc::now() + chrono::Duration::hours(1);
        session.set_token_expires(expires);
        session.save().unwrap();

        let mut loaded = SessionFile::new(path);
        loaded.load().unwrap();
        let loaded_expires = loaded.get_token_expires().unwrap();
        assert!((loaded_expires - expires).num_seconds().abs() < 2);
    }

    #[test]
    fn test_session_file_clear_removes_file() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();

        let mut session = SessionFile::new(path.clone());
        session.set_user_id("uid-1".to_string());
        session.save().unwrap();
        session.clear().unwrap();

        assert!(!path.exists());
        assert_eq!(session.get_user_id(), None);
    }
}
