// ==============================================================================
// sources.rs - Cache and Reference Download Sources
// ==============================================================================
// Description: Ensembl mirror URLs for annotator caches and reference FASTAs
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use vep_annotator::Assembly;

const MIRROR: &str = "http://ftp.ensembl.org/pub";
const RSYNC_HOST: &str = "rsync://ftp.ensembl.org/";
const RSYNC_MODULE: &str = "rsync://ftp.ensembl.org/ensembl/";

/// Last Ensembl release shipping a GRCh37 FASTA
const GRCH37_FASTA_RELEASE: &str = "75";

/// Release number from a version string such as `110.1`
pub fn release_from_version(version: &str) -> Option<String> {
    let release = version.trim().split('.').next()?.trim();
    if release.is_empty() {
        None
    } else {
        Some(release.to_string())
    }
}

/// Indexed merged cache archive for an assembly
pub fn cache_url(assembly: Assembly, release: &str) -> String {
    format!(
        "{}/release-{}/variation/indexed_vep_cache/homo_sapiens_merged_vep_{}_{}.tar.gz",
        MIRROR,
        release,
        release,
        assembly.as_str()
    )
}

/// Compressed primary assembly FASTA for an assembly
pub fn fasta_url(assembly: Assembly, release: &str) -> String {
    let release = match assembly {
        Assembly::GRCh37 => GRCH37_FASTA_RELEASE,
        Assembly::GRCh38 => release,
    };
    format!(
        "{}/release-{}/fasta/homo_sapiens/dna/{}.gz",
        MIRROR,
        release,
        assembly.fasta_file_name()
    )
}

/// Everything a populate run fetches, in order
pub fn sources(release: &str, skip_grch37: bool) -> Vec<String> {
    let mut urls = Vec::with_capacity(4);
    if !skip_grch37 {
        urls.push(cache_url(Assembly::GRCh37, release));
    }
    urls.push(cache_url(Assembly::GRCh38, release));
    if !skip_grch37 {
        urls.push(fasta_url(Assembly::GRCh37, release));
    }
    urls.push(fasta_url(Assembly::GRCh38, release));
    urls
}

/// Rewrite an HTTP(S) mirror URL to the Ensembl rsync module
pub fn to_rsync_url(url: &str) -> String {
    let url = if let Some(rest) = url.strip_prefix("https://") {
        format!("rsync://{}", rest)
    } else if let Some(rest) = url.strip_prefix("http://") {
        format!("rsync://{}", rest)
    } else {
        url.to_string()
    };

    match url.strip_prefix(RSYNC_HOST) {
        Some(rest) => format!("{}{}", RSYNC_MODULE, rest),
        None => url,
    }
}

/// Last path segment of a URL
pub fn file_name(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}
