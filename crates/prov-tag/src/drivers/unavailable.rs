use std::time::Duration;

use async_trait::async_trait;

use crate::driver::{Discovery, Payload, TagDriver, TagHandle};
use crate::error::DriverError;

/// Driver for platforms with no tag hardware.
///
/// The orchestrator probes it once, finds no capability, and runs every
/// operation in simulation mode without calling the transport methods.
pub struct UnavailableDriver;

#[async_trait]
impl TagDriver for UnavailableDriver {
    fn is_capability_available(&self) -> bool {
        false
    }

    async fn discover(&self, _timeout: Duration) -> Result<Discovery, DriverError> {
        Err(DriverError::Hardware("no tag capability on this platform".into()))
    }

    async fn read_payload(&self, _handle: &TagHandle) -> Result<Payload, DriverError> {
        Err(DriverError::Hardware("no tag capability on this platform".into()))
    }

    async fn write_payload(&self, _handle: &TagHandle, _bytes: &[u8]) -> Result<(), DriverError> {
        Err(DriverError::Hardware("no tag capability on this platform".into()))
    }

    async fn cancel(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_no_capability_and_refuses_io() {
        let driver = UnavailableDriver;
        assert!(!driver.is_capability_available());
        assert!(driver.discover(Duration::from_secs(1)).await.is_err());
        driver.cancel().await;
    }
}
