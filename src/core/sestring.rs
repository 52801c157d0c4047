use super::{host::TextEncoding, Error};

/// `<br>` macro: start byte, macro type, payload length, end byte.
pub const NEW_LINE_MACRO: [u8; 4] = [0x02, 0x10, 0x01, 0x03];
const MACRO_START: u8 = 0x02;

impl TextEncoding {
    pub fn line_break(self) -> &'static [u8] {
        match self {
            TextEncoding::Plain => b"\n",
            TextEncoding::SeString => &NEW_LINE_MACRO
        }
    }

    fn is_reserved(self, byte: u8) -> bool {
        match self {
            TextEncoding::Plain => byte == 0,
            TextEncoding::SeString => byte == 0 || byte == MACRO_START
        }
    }

    fn push_text(self, buf: &mut Vec<u8>, text: &str) {
        buf.extend(text.bytes().filter(|b| !self.is_reserved(*b)));
    }
}

/// Encodes `top`, a line break and `bottom` into a NUL-terminated buffer.
///
/// Bytes the encoding reserves (NUL, and the macro start byte for SeString) are dropped
/// from the names. The buffer is reserved up front so an allocation failure surfaces as
/// [`Error::AllocationFailed`] instead of aborting the host.
pub fn encode_bilingual(top: &str, bottom: &str, encoding: TextEncoding) -> Result<Vec<u8>, Error> {
    let line_break = encoding.line_break();
    let size = top.len() + line_break.len() + bottom.len() + 1;

    let mut buf = Vec::new();
    buf.try_reserve_exact(size).map_err(|_| Error::AllocationFailed(size))?;

    encoding.push_text(&mut buf, top);
    buf.extend_from_slice(line_break);
    encoding.push_text(&mut buf, bottom);
    buf.push(0);
    Ok(buf)
}

/// Plain-text form of the bilingual string, used as the per-node cache key.
pub fn bilingual_text(top: &str, bottom: &str) -> String {
    let mut text = String::with_capacity(top.len() + 1 + bottom.len());
    text.push_str(top);
    text.push('\n');
    text.push_str(bottom);
    text
}

/// Same as `bilingual_text(top, bottom) == text` without allocating.
pub fn is_bilingual_text(text: &str, top: &str, bottom: &str) -> bool {
    text.strip_prefix(top)
        .and_then(|rest| rest.strip_prefix('\n'))
        .is_some_and(|rest| rest == bottom)
}
