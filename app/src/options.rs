// ==============================================================================
// options.rs - Annotator Option Merging
// ==============================================================================
// Description: Layers defaults, computed paths and caller overrides into the
//              final annotator option set
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Layer order (later layers overwrite earlier keys, keeping their position):
// 1. Control paths (cache, plugins, fasta, input/output files)
// 2. Annotation feature defaults
// 3. Caller overrides (after boolean coercion)
// 4. Reserved input/output file paths, re-applied
// ==============================================================================

use indexmap::IndexMap;
use std::fmt;
use std::path::Path;
use tracing::warn;

use crate::config::{AnnotatorConfig, Assembly};

/// Query parameter consumed by the query parser, never forwarded
pub const QUERY_PARAM: &str = "q";

/// Keys owned by the per-request scratch files
const RESERVED_KEYS: [&str; 2] = ["input_file", "output_file"];

/// Caller-editable annotation defaults
const FEATURE_DEFAULTS: &[(&str, OptionDefault)] = &[
    ("af", OptionDefault::Flag),
    ("af_1kg", OptionDefault::Flag),
    ("af_gnomad", OptionDefault::Flag),
    ("appris", OptionDefault::Flag),
    ("assembly", OptionDefault::Text("GRCh38")),
    ("biotype", OptionDefault::Flag),
    ("cache", OptionDefault::Flag),
    ("canonical", OptionDefault::Flag),
    ("ccds", OptionDefault::Flag),
    ("domains", OptionDefault::Flag),
    ("flag_pick", OptionDefault::Flag),
    ("force_overwrite", OptionDefault::Flag),
    ("gene_phenotype", OptionDefault::Flag),
    ("hgvs", OptionDefault::Flag),
    ("hgvsg", OptionDefault::Flag),
    ("json", OptionDefault::Flag),
    ("mane", OptionDefault::Flag),
    ("max_af", OptionDefault::Flag),
    ("merged", OptionDefault::Flag),
    ("mirna", OptionDefault::Flag),
    ("numbers", OptionDefault::Flag),
    ("offline", OptionDefault::Flag),
    ("polyphen", OptionDefault::Text("b")),
    ("protein", OptionDefault::Flag),
    ("pubmed", OptionDefault::Flag),
    ("regulatory", OptionDefault::Flag),
    ("shift_3prime", OptionDefault::Text("1")),
    ("shift_genomic", OptionDefault::Flag),
    ("shift_length", OptionDefault::Flag),
    ("show_ref_allele", OptionDefault::Flag),
    ("sift", OptionDefault::Text("b")),
    ("symbol", OptionDefault::Flag),
    ("tsl", OptionDefault::Flag),
    ("uniprot", OptionDefault::Flag),
    ("use_given_ref", OptionDefault::Flag),
    ("var_synonyms", OptionDefault::Flag),
    ("variant_class", OptionDefault::Flag),
    ("xref_refseq", OptionDefault::Flag),
];

#[derive(Debug, Clone, Copy)]
enum OptionDefault {
    Flag,
    Text(&'static str),
}

/// Value of a single annotator option
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// `true` emits a bare `--flag`, `false` suppresses it
    Flag(bool),
    /// Emitted as `--key value`; empty text is suppressed
    Text(String),
}

impl OptionValue {
    /// Coerce a raw query parameter value.
    ///
    /// Literal `0`/`false` suppress the flag, `1`/`true` make it bare, and
    /// anything else is passed through as the flag's value.
    pub fn coerce(raw: &str) -> Self {
        match raw {
            "0" | "false" => OptionValue::Flag(false),
            "1" | "true" => OptionValue::Flag(true),
            other => OptionValue::Text(other.to_string()),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            OptionValue::Flag(enabled) => *enabled,
            OptionValue::Text(text) => !text.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            OptionValue::Text(text) => Some(text),
            OptionValue::Flag(_) => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Flag(enabled) => write!(f, "{}", enabled),
            OptionValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<&Path> for OptionValue {
    fn from(path: &Path) -> Self {
        OptionValue::Text(path.display().to_string())
    }
}

/// Insertion-ordered option name to value mapping.
///
/// Overwriting a key keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSet {
    entries: IndexMap<String, OptionValue>,
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: OptionValue) {
        self.entries.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Apply every entry of `layer` over this set
    pub fn overlay(&mut self, layer: &OptionSet) {
        for (key, value) in layer.iter() {
            self.set(key, value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Caller-supplied overrides, already coerced.
///
/// Built from raw query pairs: `q` is dropped and the first occurrence of a
/// repeated key wins.
#[derive(Debug, Clone, Default)]
pub struct CallerOptions(OptionSet);

impl CallerOptions {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut set = OptionSet::new();
        for (key, value) in pairs {
            let key = key.as_ref();
            if key == QUERY_PARAM || set.contains_key(key) {
                continue;
            }
            set.set(key, OptionValue::coerce(value.as_ref()));
        }
        Self(set)
    }

    pub fn as_set(&self) -> &OptionSet {
        &self.0
    }
}

/// Per-request file paths handed to the annotator
#[derive(Debug, Clone, Copy)]
pub struct RequestFiles<'a> {
    pub input: &'a Path,
    pub output: &'a Path,
}

/// Builds the final option set for one request
#[derive(Debug, Clone)]
pub struct OptionMerger {
    config: AnnotatorConfig,
    features: OptionSet,
}

impl OptionMerger {
    pub fn new(config: AnnotatorConfig) -> Self {
        let mut features = OptionSet::new();
        for (key, default) in FEATURE_DEFAULTS {
            let value = match default {
                OptionDefault::Flag => OptionValue::Flag(true),
                OptionDefault::Text(text) => OptionValue::Text(text.to_string()),
            };
            features.set(*key, value);
        }
        Self { config, features }
    }

    /// Assembly the merged options will run against
    pub fn effective_assembly(&self, caller: &CallerOptions) -> Assembly {
        let value = caller
            .as_set()
            .get("assembly")
            .or_else(|| self.features.get("assembly"))
            .and_then(OptionValue::as_text);
        Assembly::resolve(value)
    }

    /// Merge defaults, computed paths and caller overrides
    pub fn merge(&self, caller: &CallerOptions, files: RequestFiles<'_>) -> OptionSet {
        let assembly = self.effective_assembly(caller);

        let mut options = OptionSet::new();
        options.set("dir_cache", self.config.data_dir.as_path().into());
        options.set("dir_plugins", self.config.plugins_dir().as_path().into());
        options.set("fasta", self.config.fasta_path(assembly).as_path().into());
        options.set("input_file", files.input.into());
        options.set("output_file", files.output.into());

        options.overlay(&self.features);
        options.overlay(caller.as_set());

        for key in RESERVED_KEYS {
            if caller.as_set().contains_key(key) {
                warn!("Ignoring caller override of reserved option '{}'", key);
            }
        }
        options.set("input_file", files.input.into());
        options.set("output_file", files.output.into());

        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn merger() -> OptionMerger {
        OptionMerger::new(AnnotatorConfig {
            program: PathBuf::from("/opt/vep/src/ensembl-vep/vep"),
            data_dir: PathBuf::from("/data"),
            tmp_dir: PathBuf::from("/tmp"),
            timeout: std::time::Duration::from_secs(60),
        })
    }

    fn merge_pairs(pairs: &[(&str, &str)]) -> OptionSet {
        let caller = CallerOptions::from_pairs(pairs.iter().copied());
        merger().merge(
            &caller,
            RequestFiles {
                input: Path::new("/tmp/req/input.vcf"),
                output: Path::new("/tmp/req/output.json"),
            },
        )
    }

    fn text(value: &str) -> OptionValue {
        OptionValue::Text(value.to_string())
    }

    #[test]
    fn test_coercion_is_literal() {
        assert_eq!(OptionValue::coerce("0"), OptionValue::Flag(false));
        assert_eq!(OptionValue::coerce("false"), OptionValue::Flag(false));
        assert_eq!(OptionValue::coerce("1"), OptionValue::Flag(true));
        assert_eq!(OptionValue::coerce("true"), OptionValue::Flag(true));
        assert_eq!(OptionValue::coerce("False"), text("False"));
        assert_eq!(OptionValue::coerce("TRUE"), text("TRUE"));
        assert_eq!(OptionValue::coerce("b"), text("b"));
    }

    #[test]
    fn test_truthiness() {
        assert!(OptionValue::Flag(true).is_truthy());
        assert!(!OptionValue::Flag(false).is_truthy());
        assert!(text("s").is_truthy());
        assert!(!text("").is_truthy());
    }

    #[test]
    fn test_query_param_never_forwarded() {
        let caller = CallerOptions::from_pairs([("q", "1_100_A_T"), ("sift", "p")]);
        assert!(!caller.as_set().contains_key("q"));
        assert!(CallerOptions::from_pairs([("q", "1_100_A_T")]).as_set().is_empty());

        let options = merge_pairs(&[("q", "1_100_A_T"), ("q", "2_200_G_C")]);
        assert!(!options.contains_key("q"));
    }

    #[test]
    fn test_first_repeated_value_wins() {
        let caller = CallerOptions::from_pairs([("sift", "p"), ("sift", "s")]);
        assert_eq!(caller.as_set().get("sift"), Some(&text("p")));
    }

    #[test]
    fn test_defaults_select_grch38() {
        let options = merge_pairs(&[]);
        assert_eq!(options.get("assembly"), Some(&text("GRCh38")));
        assert_eq!(
            options.get("fasta"),
            Some(&text("/data/Homo_sapiens.GRCh38.dna.primary_assembly.fa"))
        );
        assert_eq!(options.get("dir_cache"), Some(&text("/data")));
        assert_eq!(options.get("dir_plugins"), Some(&text("/data/Plugins")));
        assert_eq!(options.get("json"), Some(&OptionValue::Flag(true)));
        assert_eq!(options.get("shift_3prime"), Some(&text("1")));
    }

    #[test]
    fn test_other_assembly_selects_grch37_fasta() {
        let options = merge_pairs(&[("assembly", "GRCh37")]);
        assert_eq!(options.get("assembly"), Some(&text("GRCh37")));
        assert_eq!(
            options.get("fasta"),
            Some(&text("/data/Homo_sapiens.GRCh37.75.dna.primary_assembly.fa"))
        );

        let options = merge_pairs(&[("assembly", "hg19")]);
        assert_eq!(
            options.get("fasta"),
            Some(&text("/data/Homo_sapiens.GRCh37.75.dna.primary_assembly.fa"))
        );
    }

    #[test]
    fn test_explicit_fasta_overrides_computed() {
        let options = merge_pairs(&[("assembly", "GRCh37"), ("fasta", "/ref/custom.fa")]);
        assert_eq!(options.get("fasta"), Some(&text("/ref/custom.fa")));
    }

    #[test]
    fn test_caller_overrides_keep_position() {
        let options = merge_pairs(&[("polyphen", "0"), ("everything", "1"), ("sift", "p")]);
        let keys: Vec<&str> = options.iter().map(|(k, _)| k).collect();

        assert_eq!(
            &keys[..6],
            &["dir_cache", "dir_plugins", "fasta", "input_file", "output_file", "af"]
        );
        assert_eq!(keys.last(), Some(&"everything"));
        let polyphen = keys.iter().position(|k| *k == "polyphen").unwrap();
        let protein = keys.iter().position(|k| *k == "protein").unwrap();
        assert_eq!(polyphen + 1, protein);

        assert_eq!(options.get("polyphen"), Some(&OptionValue::Flag(false)));
        assert_eq!(options.get("sift"), Some(&text("p")));
        assert_eq!(options.get("everything"), Some(&OptionValue::Flag(true)));
    }

    #[test]
    fn test_reserved_file_paths_cannot_be_redirected() {
        let options = merge_pairs(&[("output_file", "/etc/passwd"), ("input_file", "/x")]);
        assert_eq!(options.get("input_file"), Some(&text("/tmp/req/input.vcf")));
        assert_eq!(options.get("output_file"), Some(&text("/tmp/req/output.json")));
    }
}
