//! `BODY[]` extraction from FETCH responses.

/// Extracts the `BODY[]` section value from a complete FETCH response.
///
/// The value may be a literal (`{n}\r\n` followed by `n` bytes), a quoted
/// string, or `NIL`. Returns `None` when there is no `BODY[` item or the
/// value is `NIL` or truncated.
#[must_use]
pub fn extract_body_section(response: &[u8]) -> Option<Vec<u8>> {
    let start = find_ignore_case(response, b"BODY[")?;
    let after_open = start + b"BODY[".len();
    let close = after_open + response[after_open..].iter().position(|&b| b == b']')?;

    let mut pos = close + 1;
    // Partial fetch origin: BODY[]<0>
    if response.get(pos) == Some(&b'<') {
        pos += response[pos..].iter().position(|&b| b == b'>')? + 1;
    }
    if response.get(pos) == Some(&b' ') {
        pos += 1;
    }

    match response.get(pos)? {
        b'{' => read_literal(response, pos),
        b'"' => Some(read_quoted(&response[pos + 1..])),
        _ => None,
    }
}

fn read_literal(response: &[u8], open: usize) -> Option<Vec<u8>> {
    let close = open + response[open..].iter().position(|&b| b == b'}')?;
    let digits = response[open + 1..close]
        .strip_suffix(b"+")
        .unwrap_or(&response[open + 1..close]);
    let len: usize = std::str::from_utf8(digits).ok()?.parse().ok()?;

    let data_start = close + 1;
    if response.get(data_start..data_start + 2)? != b"\r\n" {
        return None;
    }
    response
        .get(data_start + 2..data_start + 2 + len)
        .map(<[u8]>::to_vec)
}

fn read_quoted(rest: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut escaped = false;
    for &b in rest {
        match (escaped, b) {
            (false, b'\\') => escaped = true,
            (false, b'"') => break,
            _ => {
                out.push(b);
                escaped = false;
            }
        }
    }
    out
}

fn find_ignore_case(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}
