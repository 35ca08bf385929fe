//! Nucleotide string helpers shared by the matcher, the resolver and the presets.

use crate::error::{DesignError, Result};
use bio::alphabets::dna;

#[inline(always)]
pub fn is_template_base(letter: u8) -> bool {
    matches!(
        letter.to_ascii_uppercase(),
        b'A' | b'C' | b'G' | b'T' | b'N'
    )
}

/// Rejects templates with letters outside `ACGTN` (either case).
pub fn validate_template(name: &str, template: &str) -> Result<()> {
    if let Some((pos, c)) = template
        .bytes()
        .enumerate()
        .find(|(_, c)| !is_template_base(*c))
    {
        return Err(DesignError::validation(
            name,
            format!("invalid template base '{}' at position {pos}", c as char),
        ));
    }
    Ok(())
}

pub fn reverse_complement(seq: &str) -> String {
    String::from_utf8_lossy(&dna::revcomp(seq.as_bytes())).to_string()
}

#[inline(always)]
pub fn eq_ignore_case(a: &[u8], b: &[u8]) -> bool {
    a.eq_ignore_ascii_case(b)
}

fn find_subsequence(haystack: &[u8], needle: &[u8], start: usize) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() || start >= haystack.len() {
        return None;
    }
    let end = haystack.len() - needle.len();
    (start..=end).find(|idx| eq_ignore_case(&haystack[*idx..*idx + needle.len()], needle))
}

/// All (possibly overlapping) case-insensitive occurrences of `needle`.
pub fn find_all_subsequences(haystack: &[u8], needle: &[u8]) -> Vec<usize> {
    let mut ret = vec![];
    let mut start = 0usize;
    while let Some(pos) = find_subsequence(haystack, needle, start) {
        ret.push(pos);
        start = pos + 1;
    }
    ret
}
