//! Bait signature table
//!
//! The set and its order are a fixed contract: five plain byte-sequence
//! matchers, case-sensitive, evaluated highest priority first. Detection is
//! intentionally shallow (no disassembly, no decoding) and must stay exactly
//! this set so the same payload always trips the same signature.

/// How a pattern is expressed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatternKind {
    /// Printable text matched byte-for-byte
    Text,
    /// Raw opcode bytes
    Raw,
}

/// Immutable detection record
#[derive(Debug, PartialEq, Eq)]
pub struct Signature {
    /// 1-based position in the priority list
    pub priority: u8,
    /// Human-readable identifier written to the bait log
    pub id: &'static str,
    /// Deterrent printed to stderr on a hit
    pub message: &'static str,
    pub pattern: &'static [u8],
    pub kind: PatternKind,
}

impl Signature {
    /// True if `pattern` occurs anywhere in `haystack`, overlaps included.
    pub fn matches(&self, haystack: &[u8]) -> bool {
        contains_sequence(haystack, self.pattern)
    }
}

/// x86-64 `syscall` instruction encoding
pub const SYSCALL_OPCODE: [u8; 2] = [0x0f, 0x05];

static SIGNATURES: [Signature; 5] = [
    Signature {
        priority: 1,
        id: "/bin/sh",
        message: "[VMMGR] A classic. Predictable. Blocked.",
        pattern: b"/bin/sh",
        kind: PatternKind::Text,
    },
    Signature {
        priority: 2,
        id: "execve",
        message: "[VMMGR] execve? How original. Try again.",
        pattern: b"execve",
        kind: PatternKind::Text,
    },
    Signature {
        priority: 3,
        id: "syscall (0x0f 0x05)",
        message: "[VMMGR] Forbidden fruits are the juiciest. But no.",
        pattern: &SYSCALL_OPCODE,
        kind: PatternKind::Raw,
    },
    Signature {
        priority: 4,
        id: "syscall",
        message: "[VMMGR] 'syscall' spelled out? Subtlety is a virtue.",
        pattern: b"syscall",
        kind: PatternKind::Text,
    },
    Signature {
        priority: 5,
        id: "flag",
        message: "[VMMGR] The flag is in another castle. Blocked.",
        pattern: b"flag",
        kind: PatternKind::Text,
    },
];

/// The signature list in evaluation order
pub fn signatures() -> &'static [Signature] {
    &SIGNATURES
}

/// First signature, in priority order, present anywhere in `payload`.
pub fn first_match(payload: &[u8]) -> Option<&'static Signature> {
    SIGNATURES.iter().find(|sig| sig.matches(payload))
}

fn contains_sequence(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() || needle.len() > haystack.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|window| window == needle)
}
