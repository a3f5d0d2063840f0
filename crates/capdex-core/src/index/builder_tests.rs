//! Tests for index construction.

use super::*;
use crate::config::CapdexConfig;
use crate::source::Record;

fn config_with_threshold(prune_threshold: usize) -> CapdexConfig {
    let mut config = CapdexConfig::default();
    config.index.prune_threshold = prune_threshold;
    config
}

fn build(config: &CapdexConfig, records: &[Record]) -> CapabilityIndex {
    IndexBuilder::from_records(config, records.iter().cloned().map(Ok)).expect("build")
}

#[test]
fn test_empty_builder_finalizes_empty_index() {
    let index = IndexBuilder::new(&CapdexConfig::default()).finalize();

    assert!(index.is_empty());
    assert_eq!(index.stats(), &IndexStats::default());
    assert!(index.version().is_none());
}

#[test]
fn test_every_pattern_lands_in_exactly_one_bucket() {
    let records = vec![
        Record::new("Mozilla/5.0*", &[("Browser", "M")]),
        Record::new("*bot*", &[("Crawler", "true")]),
        Record::new("Opera", &[("Browser", "Opera")]),
        Record::new("Mozilla/4.0*", &[("Browser", "M4")]),
    ];

    let index = build(&CapdexConfig::default(), &records);

    assert_eq!(index.buckets().get("moz"), &[0, 3]);
    assert_eq!(index.buckets().get(WILDCARD_BUCKET), &[1]);
    assert_eq!(index.buckets().get("ope"), &[2]);
    assert_eq!(index.stats().bucket_count, 3);
}

#[test]
fn test_wildcard_fragments_exclude_metacharacters() {
    let index = build(
        &CapdexConfig::default(),
        &[Record::new("*Firefox/9?.0*", &[])],
    );

    assert!(index.fragments().get(b"firef").is_some());
    assert!(index.fragments().get(b"efox/").is_some());
    // Run "firefox/9" ends at '?': no fragment crosses it
    assert!(index.fragments().get(b"fox/9").is_some());
    assert!(index.fragments().get(b"ox/9?").is_none());
    // Run ".0" is shorter than a fragment
    assert_eq!(index.fragments().len(), 5);
}

#[test]
fn test_short_literal_indexes_whole_name() {
    let index = build(&CapdexConfig::default(), &[Record::new("Wget", &[])]);

    assert!(index.fragments().get(b"wget").is_some());
}

#[test]
fn test_repeated_name_merges_without_new_pattern() {
    let records = vec![
        Record::new("Firefox", &[("Browser", "Firefox")]),
        Record::new("Firefox", &[("Version", "99.0")]),
    ];

    let index = build(&CapdexConfig::default(), &records);

    assert_eq!(index.len(), 1);
    let attrs = index.resolve("Firefox");
    assert_eq!(attrs["Browser"], "Firefox");
    assert_eq!(attrs["Version"], "99.0");
}

#[test]
fn test_finalize_prunes_over_common_fragments() {
    let records: Vec<Record> = (0..4)
        .map(|i| Record::new(format!("Common{i}*"), &[]))
        .collect();

    let index = build(&config_with_threshold(3), &records);

    // "commo" and "ommon" appear in all four patterns
    assert!(index.fragments().get(b"commo").is_none());
    assert!(index.fragments().get(b"ommon").is_none());
    assert!(index.fragments().get(b"mmon0").is_some());
    assert_eq!(index.stats().pruned_fragments, 2);
}

#[test]
fn test_finalize_orders_buckets_longest_first() {
    let records = vec![
        Record::new("abc*", &[]),
        Record::new("abcdef*", &[]),
        Record::new("abcd*", &[]),
    ];

    let index = build(&CapdexConfig::default(), &records);

    assert_eq!(index.buckets().get("abc"), &[1, 2, 0]);
}

#[test]
fn test_version_marker_is_captured() {
    let records = vec![
        Record::new("GJK_Browscap_Version", &[("Version", "6001000")]),
        Record::new("Firefox", &[("Browser", "Firefox")]),
    ];

    let index = build(&CapdexConfig::default(), &records);

    assert_eq!(index.version(), Some("6001000"));
}

#[test]
fn test_stats_counts_kinds() {
    let records = vec![
        Record::new("Literal One", &[]),
        Record::new("Wild*", &[]),
        Record::new("Wild?", &[]),
    ];

    let index = build(&CapdexConfig::default(), &records);
    let stats = index.stats();

    assert_eq!(stats.pattern_count, 3);
    assert_eq!(stats.literal_count, 1);
    assert_eq!(stats.wildcard_count, 2);
    assert!(stats.fragment_count > 0);
    assert!(stats.memory_bytes > 0);
}

#[test]
fn test_from_records_propagates_feed_error() {
    let records = vec![
        Ok(Record::new("A", &[])),
        Err(crate::error::Error::Load("broken feed".into())),
    ];

    let result = IndexBuilder::from_records(&CapdexConfig::default(), records);

    assert!(matches!(result, Err(crate::error::Error::Load(_))));
}
