//! Hands encoded writes to the active link, one at a time.

use std::time::Duration;

use log::{debug, error};

use crate::core::bluetooth::transport::CarLink;
use crate::core::bluetooth::types::CharacteristicWrite;
use crate::core::errors::DispatchError;

pub struct CommandDispatcher {
    write_timeout: Duration,
}

impl CommandDispatcher {
    pub fn new(write_timeout: Duration) -> Self {
        Self { write_timeout }
    }

    /// Delivers `write` over `link`, waiting out acknowledged writes up to
    /// the configured ceiling.
    ///
    /// Without an active link the write is dropped quietly; steering input
    /// with no car selected is routine, not an error. Failures are reported
    /// to the caller untouched, the link itself is left as-is.
    pub async fn dispatch(
        &self,
        link: Option<&dyn CarLink>,
        write: &CharacteristicWrite,
    ) -> Result<(), DispatchError> {
        let Some(link) = link else {
            debug!(
                "No active car, dropping {}-byte write to handle 0x{:04x}",
                write.payload.len(),
                write.handle
            );
            return Ok(());
        };

        let attempt = tokio::time::timeout(
            self.write_timeout,
            link.write_characteristic(write.handle, &write.payload, write.with_response),
        )
        .await;

        match attempt {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                error!("Write to handle 0x{:04x} failed: {e}", write.handle);
                Err(e.into())
            }
            Err(_) => {
                error!(
                    "Write to handle 0x{:04x} timed out after {:?}",
                    write.handle, self.write_timeout
                );
                Err(DispatchError::Timeout {
                    handle: write.handle,
                    len: write.payload.len(),
                    timeout: self.write_timeout,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bluetooth::mock::MockTransport;
    use crate::core::bluetooth::transport::CarTransport;

    fn write() -> CharacteristicWrite {
        CharacteristicWrite::new(0x0017, vec![0x78, 0x10, 0x00], true)
    }

    #[tokio::test]
    async fn dispatch_without_a_link_is_a_quiet_no_op() {
        let dispatcher = CommandDispatcher::new(Duration::from_millis(50));
        dispatcher.dispatch(None, &write()).await.unwrap();
    }

    #[tokio::test]
    async fn dispatch_forwards_handle_payload_and_mode() {
        let transport = MockTransport::new();
        let link = transport.connect("AA:BB:CC:DD:EE:01").await.unwrap();
        let dispatcher = CommandDispatcher::new(Duration::from_millis(50));

        dispatcher.dispatch(Some(link.as_ref()), &write()).await.unwrap();

        let writes = transport.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].handle, 0x0017);
        assert_eq!(writes[0].payload, vec![0x78, 0x10, 0x00]);
        assert!(writes[0].with_response);
    }

    #[tokio::test]
    async fn dispatch_surfaces_transport_failures() {
        let transport = MockTransport::new();
        let link = transport.connect("AA:BB:CC:DD:EE:01").await.unwrap();
        transport.set_write_failure(true);
        let dispatcher = CommandDispatcher::new(Duration::from_millis(50));

        let result = dispatcher.dispatch(Some(link.as_ref()), &write()).await;

        assert!(matches!(result, Err(DispatchError::Transport(_))));
        assert!(transport.writes().is_empty());
    }
}
