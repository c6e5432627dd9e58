// ==============================================================================
// parsers/query.rs - Variant Query Token Parser
// ==============================================================================
// Description: Translates compact variant tokens into annotator input rows
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Accepted token shapes (underscore-delimited):
// - chr_pos_ref_alt         1_1000000_A_T       -> "1 1000000 . A T"
// - chr_start_end_type      1_160283_471362_DUP -> "1 160283 471362 DUP"
// - chr_start_end_ref_alt   1_1000_1000_A_T     -> "1 1000 1000 A T"
// A chr_pos_ref_alt position must be a non-negative integer.
// ==============================================================================

use std::fmt;
use thiserror::Error;

/// Structural variant type codes accepted in the fourth field
const STRUCTURAL_VARIANT_TYPES: [&str; 2] = ["DEL", "DUP"];

/// Query parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryParseError {
    #[error(
        "wrong format in q parameter '{token}': should be chr_position_ref_alt or chr_start_end_ref_alt"
    )]
    Malformed { token: String },
}

/// One normalized row of annotator input.
///
/// Always holds 4 or 5 space-delimited fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantLine(String);

impl VariantLine {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Row with every run of spaces collapsed into a single tab
    pub fn to_tab_delimited(&self) -> String {
        let mut out = String::with_capacity(self.0.len());
        let mut in_run = false;
        for c in self.0.chars() {
            if c == ' ' {
                if !in_run {
                    out.push('\t');
                }
                in_run = true;
            } else {
                out.push(c);
                in_run = false;
            }
        }
        out
    }
}

impl fmt::Display for VariantLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse a single variant token
pub fn parse_token(token: &str) -> Result<VariantLine, QueryParseError> {
    let parts: Vec<&str> = token.split('_').collect();

    let line = match parts.as_slice() {
        [chr, start, end, sv_type] if STRUCTURAL_VARIANT_TYPES.contains(sv_type) => {
            // Ensembl SV row: chromosome, start, end, type. The end is not
            // checked against the start.
            format!("{} {} {} {}", chr, start, end, sv_type)
        }
        [chr, start, end, alt] if is_insertion(start, end) => {
            format!("{} {} {} {}", chr, start, end, alt)
        }
        [chr, pos, reference, alt] if is_position(pos) => {
            format!("{} {} . {} {}", chr, pos, reference, alt)
        }
        [chr, start, end, reference, alt] => {
            format!("{} {} {} {} {}", chr, start, end, reference, alt)
        }
        _ => {
            return Err(QueryParseError::Malformed {
                token: token.to_string(),
            })
        }
    };

    Ok(VariantLine(line))
}

/// Parse every token in order; the first malformed token aborts the batch
pub fn parse_tokens<I, S>(tokens: I) -> Result<Vec<VariantLine>, QueryParseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens
        .into_iter()
        .map(|token| parse_token(token.as_ref()))
        .collect()
}

fn is_position(field: &str) -> bool {
    field.parse::<u64>().is_ok()
}

/// Ensembl insertion rows carry start > end
fn is_insertion(start: &str, end: &str) -> bool {
    match (start.parse::<u64>(), end.parse::<u64>()) {
        (Ok(start), Ok(end)) => start > end,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snv_gets_id_placeholder() {
        let line = parse_token("1_1000000_A_T").unwrap();
        assert_eq!(line.as_str(), "1 1000000 . A T");
    }

    #[test]
    fn test_structural_variants() {
        assert_eq!(
            parse_token("1_160283_471362_DUP").unwrap().as_str(),
            "1 160283 471362 DUP"
        );
        assert_eq!(
            parse_token("1_1385015_1387562_DEL").unwrap().as_str(),
            "1 1385015 1387562 DEL"
        );
        // Lowercase type codes are not structural variants
        assert_eq!(
            parse_token("1_160283_471362_dup").unwrap().as_str(),
            "1 160283 . 471362 dup"
        );
    }

    #[test]
    fn test_insertion_keeps_field_order() {
        assert_eq!(
            parse_token("12_1017_1016_A").unwrap().as_str(),
            "12 1017 1016 A"
        );
        // Equal coordinates are not an insertion
        assert_eq!(
            parse_token("12_1016_1016_A").unwrap().as_str(),
            "12 1016 . 1016 A"
        );
    }

    #[test]
    fn test_insertion_compares_numerically() {
        // "9" > "10" as strings, but not as numbers
        assert_eq!(parse_token("1_9_10_A").unwrap().as_str(), "1 9 . 10 A");
        assert_eq!(parse_token("1_10_9_A").unwrap().as_str(), "1 10 9 A");
    }

    #[test]
    fn test_five_fields_pass_through() {
        assert_eq!(
            parse_token("1_1000_1000_A_T").unwrap().as_str(),
            "1 1000 1000 A T"
        );
    }

    #[test]
    fn test_wrong_field_count_is_malformed() {
        for token in ["bad_token_three", "1", "1_2_3_4_5_6", ""] {
            let err = parse_token(token).unwrap_err();
            assert_eq!(
                err,
                QueryParseError::Malformed {
                    token: token.to_string()
                }
            );
        }
        let message = parse_token("bad_token_three").unwrap_err().to_string();
        assert!(message.contains("bad_token_three"));
        assert!(message.contains("chr_position_ref_alt"));
        assert!(message.contains("chr_start_end_ref_alt"));
    }

    #[test]
    fn test_four_fields_need_numeric_position() {
        for token in ["bad_token_only_three", "1__A_T", "1_-5_A_T", "chr1_1e6_A_T"] {
            assert_eq!(
                parse_token(token).unwrap_err(),
                QueryParseError::Malformed {
                    token: token.to_string()
                }
            );
        }
        let message = parse_token("bad_token_only_three").unwrap_err().to_string();
        assert!(message.contains("bad_token_three"));
        assert!(message.contains("chr_position_ref_alt"));
        assert!(message.contains("chr_start_end_ref_alt"));
    }

    #[test]
    fn test_parse_tokens_preserves_order_and_fails_fast() {
        let lines = parse_tokens(["1_100_A_T", "2_200_200_G_C"]).unwrap();
        let rows: Vec<&str> = lines.iter().map(|l| l.as_str()).collect();
        assert_eq!(rows, vec!["1 100 . A T", "2 200 200 G C"]);

        let err = parse_tokens(["1_100_A_T", "oops", "also_bad"]).unwrap_err();
        assert_eq!(
            err,
            QueryParseError::Malformed {
                token: "oops".to_string()
            }
        );
    }

    #[test]
    fn test_tab_delimited_collapses_space_runs() {
        let line = parse_token("1_100_A_T").unwrap();
        assert_eq!(line.to_tab_delimited(), "1\t100\t.\tA\tT");

        // Empty fields leave consecutive spaces, which collapse to one tab
        let line = parse_token("1_100__A_T").unwrap();
        assert_eq!(line.as_str(), "1 100  A T");
        assert_eq!(line.to_tab_delimited(), "1\t100\tA\tT");
    }
}
