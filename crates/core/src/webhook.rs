//! Payment-provider webhook verification and event mapping.
//!
//! The provider signs the raw request body with HMAC-SHA256 over a shared
//! secret and sends the hex digest in `X-Signature-SHA256`. Verification
//! runs against the raw bytes before any JSON parsing, and the digest
//! comparison is constant-time (`Mac::verify_slice`).

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verify a hex-encoded HMAC-SHA256 signature over the raw body.
///
/// Returns `false` for malformed hex as well as digest mismatches; the
/// caller treats both as an unauthenticated request.
pub fn verify_signature(secret: &[u8], body: &[u8], signature_hex: &str) -> bool {
    let Some(signature) = decode_hex(signature_hex) else {
        return false;
    };

    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(body);
    mac.verify_slice(&signature).is_ok()
}

/// Hex-encode the HMAC-SHA256 of `body` under `secret`. Used by tests and
/// by tooling that replays provider events.
pub fn sign_body(secret: &[u8], body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(body);
    let digest = mac.finalize().into_bytes();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(s.get(i..i + 2)?, 16).ok())
        .collect()
}

// ---------------------------------------------------------------------------
// Event mapping
// ---------------------------------------------------------------------------

/// Transfer status events delivered by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEvent {
    FundsConverted,
    Completed,
    Cancelled,
    Failed,
}

impl TransferEvent {
    /// Parse a provider `event_type`. Unknown types return `None` and the
    /// webhook endpoint acknowledges them without mutation.
    pub fn parse(event_type: &str) -> Option<Self> {
        match event_type {
            "funds_converted" => Some(Self::FundsConverted),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// The local status this event maps to.
    pub fn status(self) -> &'static str {
        use crate::status::payment_status;
        match self {
            Self::FundsConverted => payment_status::PROCESSING,
            Self::Completed => payment_status::COMPLETED,
            Self::Cancelled => payment_status::CANCELLED,
            Self::Failed => payment_status::FAILED,
        }
    }

    /// Whether the event ends the transfer lifecycle. Terminal statuses are
    /// propagated to the owning paycheck.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::FundsConverted)
    }
}
