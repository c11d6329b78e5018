//! Specimen segmenter: one report, one or more lettered specimens.
//!
//! A report is multi-specimen when its organ/macroscopic text lists more
//! than one `<LETTER>. "<organ>":` marker (letters `A`-`J`), or a single
//! marker whose letter is not `A` (the first one was lost to OCR).

use regex::Regex;
use tracing::{debug, warn};

use crate::models::Specimen;
use crate::normalize::UNSPECIFIED_ORGAN;
use crate::text::collapse_whitespace;

const SPECIMEN_LETTERS: [char; 10] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J'];

/// Splits reports into specimens and attaches per-specimen text slices.
#[derive(Debug, Clone)]
pub struct SpecimenSegmenter {
    /// `A. "PULMON":` at a line start
    organ_marker: Option<Regex>,
    /// `A. “PULMON”` anywhere, colon optional (biopsy macroscopic layout)
    quoted_marker: Option<Regex>,
    /// `A.` at a line start, delimiting diagnosis/microscopy blocks
    section_marker: Option<Regex>,
    /// Leading `A. ` on a single-specimen organ
    leading_marker: Option<Regex>,
}

impl Default for SpecimenSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl SpecimenSegmenter {
    pub fn new() -> Self {
        Self {
            organ_marker: compile(r#"(?m)^[ \t]*([A-J])\.[ \t]*["'“”]?([^"'“”:\n]+?)["'“”]?[ \t]*:"#),
            quoted_marker: compile(r#"\b([A-J])\.[ \t]*["“”]([^"“”\n]+)["“”]"#),
            section_marker: compile(r"(?m)^[ \t]*([A-J])\."),
            leading_marker: compile(r"^[A-Z]\.\s*"),
        }
    }

    /// Segment an organ text blob into specimens. Never returns an empty list.
    pub fn segment(&self, organ_text: &str, request_number: &str) -> Vec<Specimen> {
        let markers = find_markers(self.organ_marker.as_ref(), organ_text);
        if is_multi_specimen(&markers) {
            return lettered_specimens(&markers, request_number);
        }

        vec![Specimen::single(request_number, self.clean_single_organ(organ_text))]
    }

    /// Segment using the organ field plus the macroscopic description.
    ///
    /// Markers are searched in both. A single specimen takes its organ from
    /// the organ field, or from the cleaned macroscopic description when the
    /// report has no organ line.
    pub fn segment_report(&self, organ_field: &str, macro_text: &str, request_number: &str) -> Vec<Specimen> {
        let blob = format!("{}\n{}", organ_field, macro_text);
        let markers = find_markers(self.organ_marker.as_ref(), &blob);
        if is_multi_specimen(&markers) {
            return lettered_specimens(&markers, request_number);
        }

        let organ_text = if organ_field.trim().is_empty() {
            macro_text
        } else {
            organ_field
        };
        vec![Specimen::single(request_number, self.clean_single_organ(organ_text))]
    }

    /// Biopsy layout: quoted organ markers in the macroscopic description.
    ///
    /// Returns `None` when the description does not describe several specimens.
    pub fn segment_sections(&self, macro_text: &str, request_number: &str) -> Option<Vec<Specimen>> {
        let markers = find_markers(self.quoted_marker.as_ref(), macro_text);
        if is_multi_specimen(&markers) {
            Some(lettered_specimens(&markers, request_number))
        } else {
            None
        }
    }

    /// Fill diagnosis and microscopy text for each specimen.
    ///
    /// A single specimen receives the full sections. Lettered specimens
    /// receive their `<LETTER>.` block; a letter missing from a lettered
    /// section gets an empty string, and an unlettered section is shared by
    /// every specimen.
    pub fn attach_sections(&self, specimens: &mut [Specimen], diagnosis: &str, microscopy: &str) {
        if let [specimen] = specimens {
            specimen.diagnosis_text = diagnosis.to_string();
            specimen.microscopy_text = microscopy.to_string();
            return;
        }

        // Only letters of real specimens open a block
        let letters: Vec<char> = specimens.iter().filter_map(|specimen| specimen.letter).collect();
        let diagnosis_blocks = self.split_by_letters(diagnosis, &letters);
        let microscopy_blocks = self.split_by_letters(microscopy, &letters);

        for specimen in specimens.iter_mut() {
            specimen.diagnosis_text = section_slice(&diagnosis_blocks, diagnosis, specimen.letter);
            specimen.microscopy_text = section_slice(&microscopy_blocks, microscopy, specimen.letter);
        }
    }

    /// Split a section into `(letter, "<LETTER>. content")` blocks.
    pub fn split_by_letter(&self, section: &str) -> Vec<(char, String)> {
        self.split_by_letters(section, &SPECIMEN_LETTERS)
    }

    /// Like [`split_by_letter`](Self::split_by_letter), but only `letters`
    /// start a block; other `X.` lines stay inside the current block.
    pub fn split_by_letters(&self, section: &str, letters: &[char]) -> Vec<(char, String)> {
        let Some(regex) = &self.section_marker else {
            return Vec::new();
        };

        let starts: Vec<(usize, char)> = regex
            .captures_iter(section)
            .filter_map(|captures| {
                let whole = captures.get(0)?;
                let letter = captures.get(1)?.as_str().chars().next()?;
                Some((whole.start(), letter))
            })
            .filter(|(_, letter)| letters.contains(letter))
            .collect();

        starts
            .iter()
            .enumerate()
            .map(|(index, &(start, letter))| {
                let end = starts
                    .get(index + 1)
                    .map_or(section.len(), |&(next, _)| next);
                (letter, section[start..end].trim().to_string())
            })
            .collect()
    }

    fn clean_single_organ(&self, organ_text: &str) -> String {
        let trimmed = organ_text.trim();
        let stripped = match &self.leading_marker {
            Some(regex) => regex.replace(trimmed, "").into_owned(),
            None => trimmed.to_string(),
        };

        let organ = collapse_whitespace(&stripped);
        if organ.is_empty() {
            UNSPECIFIED_ORGAN.to_string()
        } else {
            organ
        }
    }
}

/// `(letter, organ)` pairs in document order; repeated letters keep the first.
fn find_markers(regex: Option<&Regex>, text: &str) -> Vec<(char, String)> {
    let Some(regex) = regex else {
        return Vec::new();
    };

    let mut markers: Vec<(char, String)> = Vec::new();
    for captures in regex.captures_iter(text) {
        let (Some(letter), Some(organ)) = (captures.get(1), captures.get(2)) else {
            continue;
        };
        let Some(letter) = letter.as_str().chars().next() else {
            continue;
        };
        if markers.iter().any(|(seen, _)| *seen == letter) {
            continue;
        }
        markers.push((letter, collapse_whitespace(organ.as_str())));
    }
    markers
}

fn is_multi_specimen(markers: &[(char, String)]) -> bool {
    match markers {
        [] => false,
        [(letter, _)] => *letter != 'A',
        _ => true,
    }
}

fn lettered_specimens(markers: &[(char, String)], request_number: &str) -> Vec<Specimen> {
    debug!(request_number, count = markers.len(), "Segmented lettered specimens");
    markers
        .iter()
        .map(|(letter, organ)| Specimen::lettered(request_number, *letter, organ.clone()))
        .collect()
}

fn section_slice(blocks: &[(char, String)], section: &str, letter: Option<char>) -> String {
    if blocks.is_empty() {
        return section.to_string();
    }
    letter
        .and_then(|letter| blocks.iter().find(|(block_letter, _)| *block_letter == letter))
        .map(|(_, content)| content.clone())
        .unwrap_or_default()
}

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(err) => {
            warn!(pattern, error = %err, "Invalid specimen pattern");
            None
        }
    }
}
