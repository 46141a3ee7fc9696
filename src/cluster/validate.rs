//! Partition validation.
//!
//! Checks a final cluster list against the size bounds and the
//! "every item exactly once" invariant:
//! - Clusters below the minimum or above the maximum
//! - Items assigned to no cluster
//! - Items assigned to more than one cluster

use std::fmt;

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// A size bound is broken.
    Error,
    /// Items were lost or duplicated.
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// What a validation issue is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    /// Cluster smaller than the minimum.
    Undersized,
    /// Cluster larger than the maximum.
    Oversized,
    /// Item not present in any cluster.
    Missing,
    /// Item present in several clusters.
    Duplicate,
}

/// A single problem found in a partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Severity of the issue.
    pub severity: Severity,
    /// Issue category.
    pub kind: IssueKind,
    /// Human-readable description.
    pub message: String,
    /// Position of the cluster involved, if any.
    pub cluster: Option<usize>,
    /// Item index involved, if any.
    pub item: Option<usize>,
}

impl ValidationIssue {
    fn new(severity: Severity, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            severity,
            kind,
            message: message.into(),
            cluster: None,
            item: None,
        }
    }

    fn with_cluster(mut self, cluster: usize) -> Self {
        self.cluster = Some(cluster);
        self
    }

    fn with_item(mut self, item: usize) -> Self {
        self.item = Some(item);
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)?;
        if let Some(c) = self.cluster {
            write!(f, " (cluster {c})")?;
        }
        if let Some(i) = self.item {
            write!(f, " (item {i})")?;
        }
        Ok(())
    }
}

/// All issues found in a partition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Issues in discovery order.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// True when no issue was found.
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// True when items were lost or duplicated.
    pub fn has_critical(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Critical)
    }

    /// Issues of one kind.
    pub fn of_kind(&self, kind: IssueKind) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }

    /// Positions of undersized clusters.
    pub fn undersized(&self) -> Vec<usize> {
        self.of_kind(IssueKind::Undersized)
            .filter_map(|i| i.cluster)
            .collect()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return write!(f, "partition valid");
        }
        for issue in &self.issues {
            writeln!(f, "{issue}")?;
        }
        Ok(())
    }
}

/// Check clusters of item indices against `[min_size, max_size]` and full
/// coverage of `0..n_items`.
pub fn validate_partition<M: AsRef<[usize]>>(
    clusters: &[M],
    n_items: usize,
    min_size: usize,
    max_size: usize,
) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut seen = vec![0usize; n_items];

    for (pos, members) in clusters.iter().enumerate() {
        let members = members.as_ref();
        let size = members.len();
        if size < min_size {
            report.issues.push(
                ValidationIssue::new(
                    Severity::Error,
                    IssueKind::Undersized,
                    format!("size {size} below minimum {min_size}"),
                )
                .with_cluster(pos),
            );
        } else if size > max_size {
            report.issues.push(
                ValidationIssue::new(
                    Severity::Error,
                    IssueKind::Oversized,
                    format!("size {size} above maximum {max_size}"),
                )
                .with_cluster(pos),
            );
        }

        for &m in members {
            match seen.get_mut(m) {
                Some(count) => *count += 1,
                None => report.issues.push(
                    ValidationIssue::new(
                        Severity::Critical,
                        IssueKind::Missing,
                        format!("member {m} is not an item index"),
                    )
                    .with_cluster(pos)
                    .with_item(m),
                ),
            }
        }
    }

    for (item, &count) in seen.iter().enumerate() {
        if count == 0 {
            report.issues.push(
                ValidationIssue::new(Severity::Critical, IssueKind::Missing, "item not assigned")
                    .with_item(item),
            );
        } else if count > 1 {
            report.issues.push(
                ValidationIssue::new(
                    Severity::Critical,
                    IssueKind::Duplicate,
                    format!("item assigned {count} times"),
                )
                .with_item(item),
            );
        }
    }

    report
}
