/// Longest sanitized base name in bytes, leaving room for the extension.
const MAX_NAME_BYTES: usize = 200;

/// Filesystem-safe file name for a title: `{sanitized_title}.txt`.
pub fn document_filename(title: &str) -> String {
    format!("{}.txt", sanitize_title(title))
}

/// Replace every character that is forbidden in Windows file names with `_`.
///
/// The mapping is many-to-one, so distinct titles may share a name.
pub fn sanitize_title(title: &str) -> String {
    let mut cleaned: String = title
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    truncate_on_char_boundary(&mut cleaned, MAX_NAME_BYTES);
    if is_reserved_windows_name(&cleaned) {
        cleaned.push('_');
    }
    cleaned
}

fn is_forbidden(c: char) -> bool {
    matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
}

fn truncate_on_char_boundary(name: &mut String, max_bytes: usize) {
    if name.len() <= max_bytes {
        return;
    }
    let mut cut = max_bytes;
    while !name.is_char_boundary(cut) {
        cut -= 1;
    }
    name.truncate(cut);
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
