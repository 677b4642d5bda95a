//! NDEF message codec, limited to what product tags need.
//!
//! Product tags carry a single Well-Known Text record whose text is the
//! product identifier. The decoder accepts any well-formed message and
//! returns the first Text record it finds; chunked records are rejected.

use bytes::{BufMut, Bytes, BytesMut};

/// Type Name Format: NFC Forum well-known type.
pub const TNF_WELL_KNOWN: u8 = 0x01;

const FLAG_MB: u8 = 0x80;
const FLAG_ME: u8 = 0x40;
const FLAG_CF: u8 = 0x20;
const FLAG_SR: u8 = 0x10;
const FLAG_IL: u8 = 0x08;
const TNF_MASK: u8 = 0x07;

const RTD_TEXT: &[u8] = b"T";
const STATUS_UTF16: u8 = 0x80;
const LANGUAGE_MASK: u8 = 0x3f;

/// Errors raised while encoding or decoding NDEF data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NdefError {
    #[error("NDEF message is empty")]
    Empty,

    #[error("NDEF message truncated at byte {offset}")]
    Truncated { offset: usize },

    #[error("chunked NDEF records are not supported")]
    Chunked,

    #[error("NDEF message has no Text record")]
    NoTextRecord,

    #[error("language code must be 1-63 ASCII bytes, got {0:?}")]
    InvalidLanguage(String),

    #[error("text record is malformed: {0}")]
    MalformedText(String),

    #[error("record {field} is {len} bytes, limit is {max}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

/// One NDEF record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NdefRecord {
    pub tnf: u8,
    pub record_type: Bytes,
    pub id: Bytes,
    pub payload: Bytes,
}

impl NdefRecord {
    /// Build a UTF-8 Well-Known Text record.
    pub fn text(language: &str, text: &str) -> Result<Self, NdefError> {
        if language.is_empty() || language.len() > LANGUAGE_MASK as usize || !language.is_ascii()
        {
            return Err(NdefError::InvalidLanguage(language.to_string()));
        }

        let mut payload = BytesMut::with_capacity(1 + language.len() + text.len());
        payload.put_u8(language.len() as u8);
        payload.put_slice(language.as_bytes());
        payload.put_slice(text.as_bytes());

        Ok(Self {
            tnf: TNF_WELL_KNOWN,
            record_type: Bytes::from_static(RTD_TEXT),
            id: Bytes::new(),
            payload: payload.freeze(),
        })
    }

    pub fn is_text(&self) -> bool {
        self.tnf == TNF_WELL_KNOWN && self.record_type.as_ref() == RTD_TEXT
    }

    /// Decode a Text record into `(language, text)`.
    pub fn text_content(&self) -> Result<(String, String), NdefError> {
        if !self.is_text() {
            return Err(NdefError::NoTextRecord);
        }
        let status = *self
            .payload
            .first()
            .ok_or_else(|| NdefError::MalformedText("missing status byte".into()))?;

        let body_start = 1 + (status & LANGUAGE_MASK) as usize;
        if self.payload.len() < body_start {
            return Err(NdefError::MalformedText(
                "language code overruns payload".into(),
            ));
        }

        let language = String::from_utf8_lossy(&self.payload[1..body_start]).into_owned();
        let body = &self.payload[body_start..];
        let text = if status & STATUS_UTF16 != 0 {
            decode_utf16(body)?
        } else {
            String::from_utf8(body.to_vec()).map_err(|e| NdefError::MalformedText(e.to_string()))?
        };
        Ok((language, text))
    }
}

/// Serialize records into one NDEF message.
///
/// Type and id lengths are one byte on the wire, payload lengths at most
/// four; longer fields are rejected rather than truncated.
pub fn encode_message(records: &[NdefRecord]) -> Result<Bytes, NdefError> {
    let mut out = BytesMut::new();
    let last = records.len().saturating_sub(1);

    for (index, record) in records.iter().enumerate() {
        let type_len = field_len("type", record.record_type.len(), u8::MAX as usize)?;
        let id_len = field_len("id", record.id.len(), u8::MAX as usize)?;
        let payload_len = field_len("payload", record.payload.len(), u32::MAX as usize)?;
        let short = payload_len <= u8::MAX as usize;

        let mut header = record.tnf & TNF_MASK;
        if index == 0 {
            header |= FLAG_MB;
        }
        if index == last {
            header |= FLAG_ME;
        }
        if short {
            header |= FLAG_SR;
        }
        if !record.id.is_empty() {
            header |= FLAG_IL;
        }

        out.put_u8(header);
        out.put_u8(type_len as u8);
        if short {
            out.put_u8(payload_len as u8);
        } else {
            out.put_u32(payload_len as u32);
        }
        if id_len > 0 {
            out.put_u8(id_len as u8);
        }
        out.put_slice(&record.record_type);
        out.put_slice(&record.id);
        out.put_slice(&record.payload);
    }

    Ok(out.freeze())
}

fn field_len(field: &'static str, len: usize, max: usize) -> Result<usize, NdefError> {
    if len > max {
        return Err(NdefError::FieldTooLong { field, len, max });
    }
    Ok(len)
}

/// Parse an NDEF message into its records.
pub fn decode_message(bytes: &[u8]) -> Result<Vec<NdefRecord>, NdefError> {
    if bytes.is_empty() {
        return Err(NdefError::Empty);
    }

    let mut cursor = 0;
    let mut records = Vec::new();

    loop {
        let header = take(bytes, &mut cursor, 1)?[0];
        if header & FLAG_CF != 0 {
            return Err(NdefError::Chunked);
        }

        let type_len = take(bytes, &mut cursor, 1)?[0] as usize;
        let payload_len = if header & FLAG_SR != 0 {
            take(bytes, &mut cursor, 1)?[0] as usize
        } else {
            let raw = take(bytes, &mut cursor, 4)?;
            u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize
        };
        let id_len = if header & FLAG_IL != 0 {
            take(bytes, &mut cursor, 1)?[0] as usize
        } else {
            0
        };

        let record_type = Bytes::copy_from_slice(take(bytes, &mut cursor, type_len)?);
        let id = Bytes::copy_from_slice(take(bytes, &mut cursor, id_len)?);
        let payload = Bytes::copy_from_slice(take(bytes, &mut cursor, payload_len)?);

        records.push(NdefRecord {
            tnf: header & TNF_MASK,
            record_type,
            id,
            payload,
        });

        if header & FLAG_ME != 0 || cursor >= bytes.len() {
            break;
        }
    }

    Ok(records)
}

/// Encode `text` as a single-record NDEF message.
pub fn encode_text(language: &str, text: &str) -> Result<Bytes, NdefError> {
    encode_message(&[NdefRecord::text(language, text)?])
}

/// Return the text of the first Text record in a message.
pub fn decode_text(bytes: &[u8]) -> Result<String, NdefError> {
    let records = decode_message(bytes)?;
    let record = records
        .iter()
        .find(|r| r.is_text())
        .ok_or(NdefError::NoTextRecord)?;
    record.text_content().map(|(_, text)| text)
}

fn take<'a>(bytes: &'a [u8], cursor: &mut usize, len: usize) -> Result<&'a [u8], NdefError> {
    let start = *cursor;
    let slice = start
        .checked_add(len)
        .and_then(|end| bytes.get(start..end))
        .ok_or(NdefError::Truncated { offset: start })?;
    *cursor += len;
    Ok(slice)
}

fn decode_utf16(body: &[u8]) -> Result<String, NdefError> {
    if body.len() % 2 != 0 {
        return Err(NdefError::MalformedText("odd UTF-16 byte length".into()));
    }
    let (little_endian, body) = match body {
        [0xff, 0xfe, rest @ ..] => (true, rest),
        [0xfe, 0xff, rest @ ..] => (false, rest),
        _ => (false, body),
    };
    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| {
            if little_endian {
                u16::from_le_bytes([pair[0], pair[1]])
            } else {
                u16::from_be_bytes([pair[0], pair[1]])
            }
        })
        .collect();
    String::from_utf16(&units).map_err(|e| NdefError::MalformedText(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_record_has_expected_layout() {
        let encoded = encode_text("en", "PRD-1").unwrap();
        assert_eq!(
            encoded.as_ref(),
            &[0xd1, 0x01, 0x08, b'T', 0x02, b'e', b'n', b'P', b'R', b'D', b'-', b'1']
        );
    }

    #[test]
    fn decode_reads_back_text() {
        let encoded = encode_text("en", "PRD-0192f0c4").unwrap();
        assert_eq!(decode_text(&encoded).unwrap(), "PRD-0192f0c4");
    }

    #[test]
    fn long_records_use_four_byte_length() {
        let text = "x".repeat(300);
        let encoded = encode_text("en", &text).unwrap();
        assert_eq!(encoded[0] & FLAG_SR, 0);
        assert_eq!(&encoded[2..6], &(303u32).to_be_bytes());
        assert_eq!(decode_text(&encoded).unwrap(), text);
    }

    #[test]
    fn first_text_record_wins_over_other_types() {
        let uri = NdefRecord {
            tnf: TNF_WELL_KNOWN,
            record_type: Bytes::from_static(b"U"),
            id: Bytes::from_static(b"a"),
            payload: Bytes::from_static(b"\x04example.com"),
        };
        let message = encode_message(&[
            uri.clone(),
            NdefRecord::text("en", "first").unwrap(),
            NdefRecord::text("de", "second").unwrap(),
        ])
        .unwrap();

        let records = decode_message(&message).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], uri);
        assert_eq!(decode_text(&message).unwrap(), "first");
    }

    #[test]
    fn utf16_text_is_decoded() {
        let mut payload = vec![STATUS_UTF16 | 2, b'e', b'n', 0xfe, 0xff];
        for unit in "héllo".encode_utf16() {
            payload.extend_from_slice(&unit.to_be_bytes());
        }
        let record = NdefRecord {
            tnf: TNF_WELL_KNOWN,
            record_type: Bytes::from_static(RTD_TEXT),
            id: Bytes::new(),
            payload: Bytes::from(payload),
        };
        let (language, text) = record.text_content().unwrap();
        assert_eq!(language, "en");
        assert_eq!(text, "héllo");
    }

    #[test]
    fn truncated_message_is_rejected() {
        let encoded = encode_text("en", "PRD-1").unwrap();
        let err = decode_message(&encoded[..encoded.len() - 2]).unwrap_err();
        assert!(matches!(err, NdefError::Truncated { .. }));
    }

    #[test]
    fn chunked_and_empty_messages_are_rejected() {
        assert_eq!(decode_message(&[]), Err(NdefError::Empty));
        assert_eq!(
            decode_message(&[FLAG_MB | FLAG_CF | FLAG_SR | TNF_WELL_KNOWN, 1, 0, b'T']),
            Err(NdefError::Chunked)
        );
    }

    #[test]
    fn message_without_text_record() {
        let message = encode_message(&[NdefRecord {
            tnf: 0x02,
            record_type: Bytes::from_static(b"application/json"),
            id: Bytes::new(),
            payload: Bytes::from_static(b"{}"),
        }])
        .unwrap();
        assert_eq!(decode_text(&message), Err(NdefError::NoTextRecord));
    }

    #[test]
    fn oversized_type_or_id_is_rejected() {
        let long_type = NdefRecord {
            tnf: 0x02,
            record_type: Bytes::from(vec![b'x'; 256]),
            id: Bytes::new(),
            payload: Bytes::from_static(b"{}"),
        };
        assert_eq!(
            encode_message(&[long_type]),
            Err(NdefError::FieldTooLong { field: "type", len: 256, max: 255 })
        );

        let mut long_id = NdefRecord::text("en", "PRD-1").unwrap();
        long_id.id = Bytes::from(vec![b'i'; 300]);
        assert_eq!(
            encode_message(&[long_id]),
            Err(NdefError::FieldTooLong { field: "id", len: 300, max: 255 })
        );

        let mut at_limit = NdefRecord::text("en", "PRD-1").unwrap();
        at_limit.id = Bytes::from(vec![b'i'; 255]);
        let message = encode_message(&[at_limit.clone()]).unwrap();
        assert_eq!(decode_message(&message).unwrap(), vec![at_limit]);
    }

    #[test]
    fn language_code_is_validated() {
        assert!(matches!(
            NdefRecord::text("", "x"),
            Err(NdefError::InvalidLanguage(_))
        ));
        assert!(matches!(
            NdefRecord::text(&"a".repeat(64), "x"),
            Err(NdefError::InvalidLanguage(_))
        ));
    }
}
