//! Pattern Inspector
//!
//! Takes ownership of a non-empty payload and either hands it back untouched
//! (clean) or runs the detection sequence: bait log, decoy flag, deterrent
//! message, secure erase, release. A detection comes back as
//! `HarnessError::DetectionBlock` so the caller terminates with failure and
//! the execution engine is never reached.

use crate::config::types::{HarnessError, Result};
use crate::core::payload::PayloadBuffer;
use crate::observability::bait::{BaitEvent, BaitLogger};
use crate::observability::decoy::DecoyDispenser;
use crate::verdict::signatures::{first_match, Signature};

/// Scan outcome
#[derive(Debug)]
pub enum Verdict {
    Clean(PayloadBuffer),
    Blocked(&'static Signature),
}

pub struct Inspector<'a> {
    logger: &'a BaitLogger,
    decoy: Option<&'a DecoyDispenser>,
}

impl<'a> Inspector<'a> {
    pub fn new(logger: &'a BaitLogger, decoy: Option<&'a DecoyDispenser>) -> Self {
        Self { logger, decoy }
    }

    /// Scan without side effects. The first matching signature wins.
    pub fn classify(payload: PayloadBuffer) -> std::result::Result<PayloadBuffer, (PayloadBuffer, &'static Signature)> {
        match first_match(payload.as_bytes()) {
            Some(signature) => Err((payload, signature)),
            None => Ok(payload),
        }
    }

    /// Scan and run the detection sequence on a hit.
    pub fn inspect(&self, payload: PayloadBuffer) -> Result<PayloadBuffer> {
        match self.evaluate(payload) {
            Verdict::Clean(payload) => Ok(payload),
            Verdict::Blocked(signature) => Err(HarnessError::DetectionBlock {
                signature: signature.id,
            }),
        }
    }

    pub fn evaluate(&self, payload: PayloadBuffer) -> Verdict {
        match Self::classify(payload) {
            Ok(payload) => {
                log::debug!("Payload of {} bytes passed inspection", payload.len());
                Verdict::Clean(payload)
            }
            Err((payload, signature)) => {
                self.handle_detection(signature, payload);
                Verdict::Blocked(signature)
            }
        }
    }

    fn handle_detection(&self, signature: &'static Signature, mut payload: PayloadBuffer) {
        log::info!(
            "Signature '{}' (priority {}) matched {} byte payload",
            signature.id,
            signature.priority,
            payload.len()
        );

        let event = BaitEvent::capture(signature.id, payload.as_bytes());
        let display = self.decoy.map(DecoyDispenser::display_path);
        self.logger.record(&event, display.as_deref());

        if let Some(decoy) = self.decoy {
            decoy.dispense();
        }

        if !signature.message.is_empty() {
            eprintln!("{}", signature.message);
        }

        payload.wipe();
        payload.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::PayloadOrigin;
    use crate::safety::erase::observer;

    fn payload(bytes: &[u8]) -> PayloadBuffer {
        PayloadBuffer::new(bytes.to_vec(), PayloadOrigin::Stdin)
    }

    #[test]
    fn test_clean_payload_returned_unmodified() {
        let dir = tempfile::tempdir().unwrap();
        let logger = BaitLogger::new(dir.path().join("bait.log"), "VMMGR");
        let inspector = Inspector::new(&logger, None);

        let original = [0x48, 0x31, 0xc0, 0xc3];
        let clean = inspector.inspect(payload(&original)).unwrap();
        assert_eq!(clean.as_bytes(), &original);
        assert!(!logger.log_path().exists());
    }

    #[test]
    fn test_each_signature_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let logger = BaitLogger::new(dir.path().join("bait.log"), "VMMGR");
        let inspector = Inspector::new(&logger, None);

        let cases: [(&[u8], &str); 5] = [
            (b"\x90/bin/sh\x00", "/bin/sh"),
            (b"call execve", "execve"),
            (b"\x48\x31\xc0\x0f\x05\xc3", "syscall (0x0f 0x05)"),
            (b"syscall", "syscall"),
            (b"get the flag", "flag"),
        ];
        for (bytes, expected) in cases {
            let err = inspector.inspect(payload(bytes)).unwrap_err();
            match err {
                HarnessError::DetectionBlock { signature } => assert_eq!(signature, expected),
                other => panic!("unexpected error {:?}", other),
            }
        }
    }

    #[test]
    fn test_multiple_hits_log_only_highest_priority() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("bait.log");
        let logger = BaitLogger::new(&log_path, "VMMGR");
        let inspector = Inspector::new(&logger, None);

        let verdict = inspector.evaluate(payload(b"flag:/bin/sh"));
        assert!(matches!(verdict, Verdict::Blocked(sig) if sig.id == "/bin/sh"));

        let content = std::fs::read_to_string(&log_path).unwrap();
        let pattern_lines: Vec<&str> = content.lines().filter(|l| l.contains("Pattern")).collect();
        assert_eq!(pattern_lines.len(), 1);
        assert!(pattern_lines[0].contains("Pattern '/bin/sh'"));
        assert!(!content.contains("Pattern 'flag'"));
        assert!(content.contains("(length=12)"));
    }

    #[test]
    fn test_detection_dispenses_decoy() {
        let dir = tempfile::tempdir().unwrap();
        let logger = BaitLogger::new(dir.path().join("bait.log"), "VMMGR");
        let decoy = DecoyDispenser::new(dir.path().join("vm_flag.txt"));
        let inspector = Inspector::new(&logger, Some(&decoy));

        assert!(inspector.inspect(payload(b"execve")).is_err());
        assert!(decoy.path().exists());
        let log = std::fs::read_to_string(logger.log_path()).unwrap();
        assert!(log.contains("Fake flag dispensed at"));
    }

    #[test]
    fn test_logging_failure_keeps_detection_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let logger = BaitLogger::new(dir.path().join("absent").join("bait.log"), "VMMGR");
        let inspector = Inspector::new(&logger, None);

        let err = inspector.inspect(payload(b"flag")).unwrap_err();
        assert!(err.is_detection());
    }

    #[test]
    fn test_detection_erases_payload() {
        let dir = tempfile::tempdir().unwrap();
        let logger = BaitLogger::new(dir.path().join("bait.log"), "VMMGR");
        let inspector = Inspector::new(&logger, None);

        observer::take();
        assert!(inspector.inspect(payload(b"\x90\x90/bin/sh\x00")).is_err());
        assert!(observer::erased(&observer::take(), 10));
    }

    #[test]
    fn test_clean_payload_is_not_erased() {
        let dir = tempfile::tempdir().unwrap();
        let logger = BaitLogger::new(dir.path().join("bait.log"), "VMMGR");
        let inspector = Inspector::new(&logger, None);

        observer::take();
        let clean = inspector.inspect(payload(&[0x90, 0xc3])).unwrap();
        assert!(observer::take().is_empty());
        assert_eq!(clean.as_bytes(), &[0x90, 0xc3]);
    }

    #[test]
    fn test_classify_has_no_side_effects() {
        let hit = Inspector::classify(payload(b"xx syscall xx"));
        let (returned, sig) = hit.unwrap_err();
        assert_eq!(sig.id, "syscall");
        assert_eq!(returned.as_bytes(), b"xx syscall xx");
    }
}
