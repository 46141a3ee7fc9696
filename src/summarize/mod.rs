//! Per-cluster aggregation for downstream captioning.
//!
//! After clustering, each cluster's item labels are pooled and its images
//! collected so a caption generator can describe the group. Generating the
//! caption (an LLM call, usually) is left to the caller via [`Summarizer`],
//! keeping this crate free of network dependencies.

use crate::cluster::Partition;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Trait for summarization strategies.
///
/// Implementors define how a group of items is condensed into a summary.
pub trait Summarizer<T, S = T> {
    /// Summarize a group of items.
    fn summarize(&self, items: &[&T]) -> S;
}

/// Metadata attached to one clustered item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ItemMeta {
    /// Categorical labels detected for the item.
    pub labels: Vec<String>,
    /// Local path of the item's image, if any.
    pub image_path: Option<String>,
}

/// Aggregated view of one cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusterDetails {
    /// Display key, `Cluster-<id>`.
    pub key: String,
    /// Member identifiers, in cluster order.
    pub item_ids: Vec<String>,
    /// Union of member labels, sorted.
    pub labels: Vec<String>,
    /// Image file names of members that have one.
    pub images: Vec<String>,
}

impl ClusterDetails {
    /// Run a summarizer over the pooled labels.
    pub fn summarize_labels<S, O>(&self, summarizer: &S) -> O
    where
        S: Summarizer<String, O>,
    {
        let refs: Vec<&String> = self.labels.iter().collect();
        summarizer.summarize(&refs)
    }
}

/// Pool labels and images for every cluster of `partition`, in id order.
///
/// Items without metadata contribute nothing beyond their identifier.
pub fn cluster_details(partition: &Partition, meta: &HashMap<String, ItemMeta>) -> Vec<ClusterDetails> {
    partition
        .iter()
        .map(|(id, members)| {
            let mut labels = BTreeSet::new();
            let mut images = Vec::new();
            for item in members.iter().filter_map(|m| meta.get(m)) {
                labels.extend(item.labels.iter().cloned());
                if let Some(name) = item
                    .image_path
                    .as_deref()
                    .and_then(|p| Path::new(p).file_name())
                {
                    images.push(name.to_string_lossy().into_owned());
                }
            }
            ClusterDetails {
                key: format!("Cluster-{id}"),
                item_ids: members.to_vec(),
                labels: labels.into_iter().collect(),
                images,
            }
        })
        .collect()
}

/// Joins labels into a single prompt-ready string.
#[derive(Debug, Clone)]
pub struct LabelSummarizer {
    /// Separator between labels.
    pub separator: String,
    /// Maximum length in bytes (truncate if exceeded).
    pub max_len: Option<usize>,
}

impl Default for LabelSummarizer {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelSummarizer {
    /// Comma-separated, no length limit.
    pub fn new() -> Self {
        Self {
            separator: ", ".to_string(),
            max_len: None,
        }
    }

    /// Set separator.
    pub fn with_separator(mut self, sep: impl Into<String>) -> Self {
        self.separator = sep.into();
        self
    }

    /// Set maximum length.
    pub fn with_max_len(mut self, len: usize) -> Self {
        self.max_len = Some(len);
        self
    }
}

impl Summarizer<String> for LabelSummarizer {
    fn summarize(&self, items: &[&String]) -> String {
        let joined = items
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(&self.separator);

        match self.max_len {
            Some(max) if joined.len() > max => {
                let mut cut = max.saturating_sub(3);
                while !joined.is_char_boundary(cut) {
                    cut -= 1;
                }
                let mut truncated = joined[..cut].to_string();
                truncated.push_str("...");
                truncated
            }
            _ => joined,
        }
    }
}

/// A function-based summarizer, e.g. a wrapper around a caption service.
#[derive(Clone)]
pub struct FnSummarizer<F> {
    f: F,
}

impl<F> FnSummarizer<F> {
    /// Create a summarizer from a function.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<T, S, F> Summarizer<T, S> for FnSummarizer<F>
where
    F: Fn(&[&T]) -> S,
{
    fn summarize(&self, items: &[&T]) -> S {
        (self.f)(items)
    }
}

/// Create a summarizer from a closure.
pub fn from_fn<T, S, F>(f: F) -> FnSummarizer<F>
where
    F: Fn(&[&T]) -> S,
{
    FnSummarizer::new(f)
}
