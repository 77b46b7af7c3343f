use std::borrow::Cow;

use bstr::ByteSlice;

use super::SplitResult;

/// Splits on `\n`, dropping the newline and one trailing `\r`.
///
/// The last line is returned at end of stream even without a terminator.
/// Empty lines yield empty tokens.
///
/// # Examples
///
/// ```
/// use streamsift::scan_lines;
///
/// let (advance, token) = scan_lines(b"one\r\ntwo", false).unwrap();
/// assert_eq!((advance, token.as_deref()), (5, Some(&b"one"[..])));
/// ```
pub fn scan_lines(data: &[u8], at_eof: bool) -> SplitResult<'_> {
    if at_eof && data.is_empty() {
        return Ok((0, None));
    }
    if let Some(i) = data.find_byte(b'\n') {
        return Ok((i + 1, Some(Cow::Borrowed(drop_cr(&data[..i])))));
    }
    if at_eof {
        return Ok((data.len(), Some(Cow::Borrowed(drop_cr(data)))));
    }
    Ok((0, None))
}

fn drop_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::empty_eof("", true, 0, None)]
    #[case::partial("abc", false, 0, None)]
    #[case::partial_eof("abc", true, 3, Some("abc"))]
    #[case::line("abc\ndef", false, 4, Some("abc"))]
    #[case::crlf("abc\r\n", false, 5, Some("abc"))]
    #[case::blank("\n", false, 1, Some(""))]
    #[case::cr_only_at_eof("abc\r", true, 4, Some("abc"))]
    fn splits(
        #[case] data: &str,
        #[case] at_eof: bool,
        #[case] advance: usize,
        #[case] token: Option<&str>,
    ) {
        let (got_advance, got_token) = scan_lines(data.as_bytes(), at_eof).unwrap();
        assert_eq!(got_advance, advance);
        assert_eq!(got_token.as_deref(), token.map(str::as_bytes));
    }
}
