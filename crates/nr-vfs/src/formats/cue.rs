//! CUE sheet support
//!
//! Only the `FILE "<name>" <TYPE>` lines matter here: they name the binary
//! track files that make up the disc. Everything else is carried through
//! untouched.

/// A `FILE` line of a cue sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CueFileLine<'a> {
    /// Referenced path exactly as written between the quotes
    pub path: &'a str,
    /// Track type token (`BINARY`, `MOTOROLA`, `WAVE`, ...)
    pub file_type: &'a str,
}

/// Parse one line of a cue sheet as a `FILE` line.
///
/// The keyword is matched case-insensitively at the start of the line and
/// any run of whitespace is accepted between the fields.
pub fn parse_file_line(line: &str) -> Option<CueFileLine<'_>> {
    let keyword = line.get(..4)?;
    if !keyword.eq_ignore_ascii_case("FILE") {
        return None;
    }

    let rest = &line[4..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim_start().strip_prefix('"')?;

    let close = rest.find('"')?;
    let path = &rest[..close];
    if path.is_empty() {
        return None;
    }

    let rest = &rest[close + 1..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim_start();

    let type_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    if type_len == 0 || !rest[type_len..].trim().is_empty() {
        return None;
    }

    Some(CueFileLine {
        path,
        file_type: &rest[..type_len],
    })
}

/// Split `text` into `(body, ending)` pairs.
///
/// `\r\n`, `\n` and a lone `\r` all end a line. The last pair has an empty
/// ending when the text does not end with a line break.
fn lines_with_endings(text: &str) -> impl Iterator<Item = (&str, &str)> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let (body_len, ending_len) = match rest.find(['\r', '\n']) {
            Some(at) if rest[at..].starts_with("\r\n") => (at, 2),
            Some(at) => (at, 1),
            None => (rest.len(), 0),
        };
        let (body, tail) = rest.split_at(body_len);
        let (ending, tail) = tail.split_at(ending_len);
        rest = tail;
        Some((body, ending))
    })
}

/// Rewrite the `FILE` lines of `text`.
///
/// `rename` is called for every `FILE` line; returning `Some(name)` replaces
/// the line with `FILE "<name>" <TYPE>` (type kept verbatim), `None` leaves
/// the line as it was. Line endings are preserved.
pub fn rewrite_file_lines<F>(text: &str, mut rename: F) -> String
where
    F: FnMut(&CueFileLine<'_>) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());

    for (body, ending) in lines_with_endings(text) {
        let rewritten = parse_file_line(body).and_then(|line| {
            rename(&line).map(|name| format!("FILE \"{}\" {}", name, line.file_type))
        });
        out.push_str(rewritten.as_deref().unwrap_or(body));
        out.push_str(ending);
    }

    out
}

/// All `FILE` references of a cue sheet, in order
pub fn file_references(text: &str) -> Vec<CueFileLine<'_>> {
    lines_with_endings(text)
        .filter_map(|(body, _)| parse_file_line(body))
        .collect()
}
