use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed-width random identifier, hex encoded on the wire
macro_rules! hex_id {
    ($(#[$meta:meta])* $name:ident, $len:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            pub fn new() -> Self {
                let mut bytes = [0u8; $len];
                getrandom::getrandom(&mut bytes)
                    .expect(concat!("failed to generate random ", stringify!($name)));
                Self(bytes)
            }

            /// Parse exactly `2 * len` hex digits
            pub fn from_hex(s: &str) -> Result<Self, TraceContextError> {
                let mut bytes = [0u8; $len];
                decode_exact(s, &mut bytes)?;
                Ok(Self(bytes))
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }
    };
}

hex_id!(
    /// 128-bit trace identifier, shared by every span of a trace
    TraceId,
    16
);

hex_id!(
    /// 64-bit span identifier
    SpanId,
    8
);

fn decode_exact(s: &str, out: &mut [u8]) -> Result<(), TraceContextError> {
    if s.len() != out.len() * 2 {
        return Err(TraceContextError::InvalidLength);
    }
    hex::decode_to_slice(s, out).map_err(|_| TraceContextError::InvalidHex)
}

const TRACEPARENT_VERSION: &str = "00";
const FLAG_SAMPLED: u8 = 0x01;

/// Where a span sits in its trace.
///
/// The remote form is the W3C `traceparent` header,
/// `00-{trace_id}-{span_id}-{flags}`. The parent id is never carried on the
/// wire: a parsed context is itself the parent of whatever starts under it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanContext {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub parent_span_id: Option<SpanId>,
    pub flags: u8,
}

impl SpanContext {
    /// Start a new trace
    pub fn new_root() -> Self {
        Self {
            trace_id: TraceId::new(),
            span_id: SpanId::new(),
            parent_span_id: None,
            flags: FLAG_SAMPLED,
        }
    }

    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id,
            span_id: SpanId::new(),
            parent_span_id: Some(self.span_id),
            flags: self.flags,
        }
    }

    pub fn from_traceparent(header: &str) -> Result<Self, TraceContextError> {
        let mut fields = header.trim().split('-');
        let (Some(version), Some(trace_id), Some(span_id), Some(flags), None) = (
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
        ) else {
            return Err(TraceContextError::InvalidFormat);
        };

        if version != TRACEPARENT_VERSION {
            return Err(TraceContextError::UnsupportedVersion);
        }

        let mut flag_byte = [0u8; 1];
        decode_exact(flags, &mut flag_byte)?;

        Ok(Self {
            trace_id: TraceId::from_hex(trace_id)?,
            span_id: SpanId::from_hex(span_id)?,
            parent_span_id: None,
            flags: flag_byte[0],
        })
    }

    pub fn to_traceparent(&self) -> String {
        format!(
            "{TRACEPARENT_VERSION}-{}-{}-{:02x}",
            self.trace_id, self.span_id, self.flags
        )
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TraceContextError {
    #[error("traceparent must have four dash-separated fields")]
    InvalidFormat,
    #[error("unsupported traceparent version")]
    UnsupportedVersion,
    #[error("traceparent field is not hex")]
    InvalidHex,
    #[error("traceparent field has the wrong length")]
    InvalidLength,
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";

    #[test]
    fn test_parse_traceparent() {
        let ctx = SpanContext::from_traceparent(HEADER).unwrap();
        assert_eq!(ctx.trace_id.to_hex(), "4bf92f3577b34da6a3ce929d0e0e4736");
        assert_eq!(ctx.span_id.to_hex(), "00f067aa0ba902b7");
        assert_eq!(ctx.parent_span_id, None);
        assert_eq!(ctx.flags, 0x01);
        assert_eq!(ctx.to_traceparent(), HEADER);
    }

    #[test]
    fn test_traceparent_errors() {
        assert_eq!(
            SpanContext::from_traceparent("00-abc"),
            Err(TraceContextError::InvalidFormat)
        );
        assert_eq!(
            SpanContext::from_traceparent(
                "01-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01"
            ),
            Err(TraceContextError::UnsupportedVersion)
        );
        assert_eq!(
            SpanContext::from_traceparent("00-4bf92f35-00f067aa0ba902b7-01"),
            Err(TraceContextError::InvalidLength)
        );
        assert_eq!(
            SpanContext::from_traceparent(
                "00-zzf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01"
            ),
            Err(TraceContextError::InvalidHex)
        );
    }

    #[test]
    fn test_flags_must_be_two_hex_digits() {
        let ids = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7";
        assert_eq!(
            SpanContext::from_traceparent(&format!("{ids}-+1")),
            Err(TraceContextError::InvalidHex)
        );
        assert_eq!(
            SpanContext::from_traceparent(&format!("{ids}-1")),
            Err(TraceContextError::InvalidLength)
        );
        assert_eq!(
            SpanContext::from_traceparent(&format!("{ids}-0a")).map(|c| c.flags),
            Ok(0x0a)
        );
    }

    #[test]
    fn test_child_stays_in_trace() {
        let root = SpanContext::new_root();
        let child = root.child();
        assert_eq!(child.trace_id, root.trace_id);
        assert_eq!(child.parent_span_id, Some(root.span_id));
        assert_ne!(child.span_id, root.span_id);
        assert_eq!(child.flags, root.flags);
    }
}
