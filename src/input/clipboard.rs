//! Clipboard abstraction and `DataTransfer` payloads
//!
//! The session talks to a [`Clipboard`] implementation for `copy`, `cut` and
//! `paste`. [`MemoryClipboard`] keeps the data in process; embedders can plug
//! in their own store behind the same trait.

use super::{InputError, InputResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;

/// Data carried by clipboard events, keyed by MIME type
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataTransfer {
    items: Vec<(String, String)>,
}

/// Maps the legacy short format names onto MIME types.
fn normalize_format(format: &str) -> String {
    match format.to_ascii_lowercase().as_str() {
        "text" => "text/plain".to_string(),
        "url" => "text/uri-list".to_string(),
        other => other.to_string(),
    }
}

impl DataTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transfer holding plain text
    pub fn from_text(text: &str) -> Self {
        let mut data = Self::new();
        data.set_data("text/plain", text);
        data
    }

    /// Stores `data` under `format`, replacing a previous entry
    pub fn set_data(&mut self, format: &str, data: &str) {
        let format = normalize_format(format);
        match self.items.iter_mut().find(|(f, _)| *f == format) {
            Some(item) => item.1 = data.to_string(),
            None => self.items.push((format, data.to_string())),
        }
    }

    /// Data stored under `format`, or an empty string
    pub fn get_data(&self, format: &str) -> String {
        let format = normalize_format(format);
        self.items
            .iter()
            .find(|(f, _)| *f == format)
            .map(|(_, d)| d.clone())
            .unwrap_or_default()
    }

    /// Formats in insertion order
    pub fn types(&self) -> Vec<&str> {
        self.items.iter().map(|(f, _)| f.as_str()).collect()
    }

    /// Removes one format, or everything when `format` is `None`
    pub fn clear_data(&mut self, format: Option<&str>) {
        match format {
            Some(format) => {
                let format = normalize_format(format);
                self.items.retain(|(f, _)| *f != format);
            }
            None => self.items.clear(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Asynchronous clipboard store
#[async_trait]
pub trait Clipboard: Send + Sync {
    /// Reads the current clipboard content
    async fn read(&self) -> InputResult<DataTransfer>;

    /// Replaces the clipboard content
    async fn write(&self, data: DataTransfer) -> InputResult<()>;

    /// Reads the plain text content
    async fn read_text(&self) -> InputResult<String> {
        Ok(self.read().await?.get_data("text/plain"))
    }

    /// Replaces the content with plain text
    async fn write_text(&self, text: &str) -> InputResult<()> {
        self.write(DataTransfer::from_text(text)).await
    }
}

/// In-process clipboard
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    data: Mutex<Option<DataTransfer>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Clipboard for MemoryClipboard {
    async fn read(&self) -> InputResult<DataTransfer> {
        Ok(self.data.lock().clone().unwrap_or_default())
    }

    async fn write(&self, data: DataTransfer) -> InputResult<()> {
        *self.data.lock() = Some(data);
        Ok(())
    }
}

/// Clipboard that refuses every access, for environments without one
#[derive(Debug, Default)]
pub struct UnavailableClipboard;

#[async_trait]
impl Clipboard for UnavailableClipboard {
    async fn read(&self) -> InputResult<DataTransfer> {
        Err(InputError::Clipboard(
            "paste without clipboard data requires a clipboard".to_string(),
        ))
    }

    async fn write(&self, _data: DataTransfer) -> InputResult<()> {
        Err(InputError::Clipboard("no clipboard available".to_string()))
    }
}
