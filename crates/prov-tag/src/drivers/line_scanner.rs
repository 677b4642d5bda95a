use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tracing::debug;

use crate::driver::{Discovery, Payload, TagDriver, TagHandle, TagId, TagTechnology};
use crate::error::DriverError;

/// Optical scanner in keyboard-wedge mode.
///
/// Handheld QR and barcode scanners usually present themselves as a
/// keyboard and "type" each decoded code followed by Enter. Every non-blank
/// line on the reader is one scan. Printed codes are read-only.
pub struct LineScannerDriver<R> {
    lines: Mutex<Lines<R>>,
    closed: AtomicBool,
}

impl LineScannerDriver<BufReader<Stdin>> {
    /// Scanner attached to the process's standard input.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R> LineScannerDriver<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self {
            lines: Mutex::new(reader.lines()),
            closed: AtomicBool::new(false),
        }
    }

    async fn next_code(lines: &mut Lines<R>) -> std::io::Result<Option<String>> {
        while let Some(line) = lines.next_line().await? {
            let code = line.trim();
            if !code.is_empty() {
                return Ok(Some(code.to_string()));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl<R> TagDriver for LineScannerDriver<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    fn is_capability_available(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }

    async fn discover(&self, timeout: Duration) -> Result<Discovery, DriverError> {
        let mut lines = self.lines.lock().await;
        match tokio::time::timeout(timeout, Self::next_code(&mut lines)).await {
            Err(_) => Ok(Discovery::TimedOut),
            Ok(Err(e)) => Err(DriverError::Io(e)),
            Ok(Ok(None)) => {
                self.closed.store(true, Ordering::Release);
                Err(DriverError::InputClosed)
            }
            Ok(Ok(Some(code))) => {
                debug!(len = code.len(), "code scanned");
                Ok(Discovery::Tag(TagHandle::new(
                    TagId::from(code.as_bytes()),
                    TagTechnology::Optical,
                )))
            }
        }
    }

    async fn read_payload(&self, handle: &TagHandle) -> Result<Payload, DriverError> {
        let text = String::from_utf8(handle.id.as_bytes().to_vec())
            .map_err(|e| DriverError::Hardware(format!("scanned code is not UTF-8: {e}")))?;
        Ok(Payload::Text(text))
    }

    async fn write_payload(&self, _handle: &TagHandle, _bytes: &[u8]) -> Result<(), DriverError> {
        Err(DriverError::NotWritable(
            "printed optical codes are read-only".into(),
        ))
    }

    async fn cancel(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn each_line_is_one_scan() {
        let (mut tx, rx) = tokio::io::duplex(64);
        let driver = LineScannerDriver::new(BufReader::new(rx));

        tx.write_all(b"\n  PRD-42  \n").await.unwrap();
        let Discovery::Tag(handle) = driver.discover(Duration::from_secs(1)).await.unwrap() else {
            panic!("expected a scan");
        };
        assert_eq!(handle.technology, TagTechnology::Optical);
        assert_eq!(
            driver.read_payload(&handle).await.unwrap(),
            Payload::Text("PRD-42".into())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn silence_times_out() {
        let (_tx, rx) = tokio::io::duplex(64);
        let driver = LineScannerDriver::new(BufReader::new(rx));
        let result = driver.discover(Duration::from_secs(30)).await.unwrap();
        assert_eq!(result, Discovery::TimedOut);
        assert!(driver.is_capability_available());
    }

    #[tokio::test]
    async fn closed_input_disables_capability() {
        let (tx, rx) = tokio::io::duplex(64);
        drop(tx);
        let driver = LineScannerDriver::new(BufReader::new(rx));
        let err = driver.discover(Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, DriverError::InputClosed));
        assert!(!driver.is_capability_available());
    }

    #[tokio::test]
    async fn codes_are_read_only() {
        let (_tx, rx) = tokio::io::duplex(64);
        let driver = LineScannerDriver::new(BufReader::new(rx));
        let handle = TagHandle::new(TagId::from(&b"PRD-1"[..]), TagTechnology::Optical);
        let err = driver.write_payload(&handle, b"x").await.unwrap_err();
        assert!(matches!(err, DriverError::NotWritable(_)));
    }
}
