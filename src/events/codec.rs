//! # Cross-process event transport.
//!
//! Events are only delivered in-process. There is no wire format: both
//! directions fail with [`CodecError::NotImplemented`] so a caller that needs
//! cross-process delivery finds out at the call site instead of getting
//! made-up bytes.

use crate::error::CodecError;
use crate::events::Event;

/// Serializes an event for another process.
pub fn encode(_event: &Event) -> Result<Vec<u8>, CodecError> {
    Err(CodecError::NotImplemented)
}

/// Deserializes an event received from another process.
pub fn decode(_bytes: &[u8]) -> Result<Event, CodecError> {
    Err(CodecError::NotImplemented)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[test]
    fn both_directions_are_unimplemented() {
        let ev = Event::new(EventKind::ClosingWorkspace);
        assert_eq!(encode(&ev).unwrap_err(), CodecError::NotImplemented);
        assert_eq!(decode(b"{}").unwrap_err(), CodecError::NotImplemented);
    }
}
