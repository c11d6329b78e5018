//! Text normalization helpers used for robust keyword matching.
//!
//! OCR output drops or garbles Spanish accents unpredictably, so every
//! keyword comparison in the crate runs on accent-folded, uppercased text.

/// Fold accented Latin letters to their ASCII base letter.
///
/// Combining marks (decomposed accents) are removed, typographic quotes
/// become ASCII quotes, and Unicode whitespace or any other non-ASCII
/// character becomes a space so neighbouring words never merge. The output
/// is always plain ASCII.
pub fn fold_accents(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());

    for ch in text.chars() {
        if ch.is_ascii() {
            folded.push(ch);
            continue;
        }

        let base = match ch {
            'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' => 'A',
            'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' => 'O',
            'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
            'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'Ñ' => 'N',
            'ñ' => 'n',
            'Ç' => 'C',
            'ç' => 'c',
            '“' | '”' | '„' | '«' | '»' => '"',
            '‘' | '’' | '‚' => '\'',
            '\u{0300}'..='\u{036F}' => continue,
            _ => ' ',
        };
        folded.push(base);
    }

    folded
}

/// Accent-fold and uppercase text for keyword matching.
pub fn normalize_for_match(text: &str) -> String {
    fold_accents(text).to_ascii_uppercase()
}

/// Collapse every whitespace run (including newlines) to a single space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapse horizontal whitespace line by line, dropping blank lines.
///
/// Line breaks survive so lettered sections (`A.`, `B.`) stay at line starts.
pub fn collapse_block(text: &str) -> String {
    text.lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// First run of ASCII digits in `text`, if any.
pub fn first_integer(text: &str) -> Option<&str> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let rest = &text[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    Some(&rest[..end])
}
