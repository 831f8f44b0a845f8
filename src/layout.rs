//! Checks the byte ranges the file claims (header, header tables, segments, sections)
//! against each other and against the file size. Gaps are "blackholes": bytes nothing
//! accounts for. Overlaps are legal (segments contain sections) but worth knowing about.
use crate::elf::SegmentExtent;
use crate::output::Output;
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blackhole {
    pub offset: u64,
    pub size: u64,

    /// Label of the extent before the hole.
    pub after: String,

    /// Label of the extent after the hole, None for the trailing hole.
    pub before: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Overlap {
    /// Where the second extent starts.
    pub offset: u64,
    pub size: u64,
    pub first: String,
    pub second: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LayoutReport {
    pub blackholes: Vec<Blackhole>,
    pub overlaps: Vec<Overlap>,

    /// Size of the buffer.
    pub captured: u64,

    /// Sum of the extent sizes (in the order they were found) less the overlaps between
    /// neighbors once sorted. This can over or under count when extents nest, see covered.
    pub accounted: u64,

    /// captured - accounted.
    pub difference: i128,

    /// Bytes within the buffer that at least one extent claims.
    pub covered: u64,
}

/// Sorts the extents by offset (keeping the original order for ties) and compares each
/// with its neighbor.
pub fn analyze(extents: &[SegmentExtent], captured: u64, out: &mut Output) -> LayoutReport {
    let mut report = LayoutReport {
        captured,
        ..Default::default()
    };
    let accounted: u128 = extents.iter().map(|e| e.size as u128).sum();
    let mut overlapped: u128 = 0;

    let mut sorted: Vec<&SegmentExtent> = extents.iter().collect();
    sorted.sort_by_key(|e| e.offset);

    for pair in sorted.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        if prev.end() < next.offset {
            let hole = Blackhole {
                offset: prev.end(),
                size: next.offset - prev.end(),
                after: prev.label.clone(),
                before: Some(next.label.clone()),
            };
            out.note(
                hole.offset,
                hole.size,
                format!("{} byte blackhole between {} and {}", hole.size, prev.label, next.label),
            );
            report.blackholes.push(hole);
        } else if prev.end() > next.offset {
            let overlap = Overlap {
                offset: next.offset,
                size: prev.end() - next.offset,
                first: prev.label.clone(),
                second: next.label.clone(),
            };
            out.warn(
                overlap.offset,
                overlap.size,
                format!("{} and {} overlap by {} bytes", prev.label, next.label, overlap.size),
            );
            overlapped += overlap.size as u128;
            report.overlaps.push(overlap);
        }
    }

    if let Some(last) = sorted.last()
        && last.end() < captured
    {
        let hole = Blackhole {
            offset: last.end(),
            size: captured - last.end(),
            after: last.label.clone(),
            before: None,
        };
        out.note(
            hole.offset,
            hole.size,
            format!("{} byte blackhole after {} at the end of the file", hole.size, last.label),
        );
        report.blackholes.push(hole);
    }

    report.accounted = accounted.saturating_sub(overlapped).min(u64::MAX as u128) as u64;
    report.difference = captured as i128 - report.accounted as i128;
    report.covered = covered(&sorted, captured);
    debug!(
        blackholes = report.blackholes.len(),
        overlaps = report.overlaps.len(),
        accounted = report.accounted,
        covered = report.covered,
        "analyzed layout"
    );
    report
}

/// Size of the union of the (sorted) extents clipped to the buffer.
fn covered(sorted: &[&SegmentExtent], captured: u64) -> u64 {
    let mut total = 0;
    let mut reach = 0; // everything before this has been counted
    for extent in sorted {
        let start = extent.offset.max(reach).min(captured);
        let end = extent.end().min(captured);
        if end > start {
            total += end - start;
        }
        reach = reach.max(end);
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Severity;

    fn extent(offset: u64, size: u64, label: &str) -> SegmentExtent {
        SegmentExtent {
            offset,
            size,
            label: label.to_string(),
        }
    }

    #[test]
    fn tiling() {
        let extents = vec![extent(64, 100, "b"), extent(0, 64, "a"), extent(164, 36, "c")];
        let mut out = Output::new();
        let report = analyze(&extents, 200, &mut out);

        assert!(report.blackholes.is_empty());
        assert!(report.overlaps.is_empty());
        assert_eq!(report.accounted, 200);
        assert_eq!(report.difference, 0);
        assert_eq!(report.covered, 200);
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn overlap() {
        let extents = vec![extent(0, 64, "a"), extent(60, 40, "b")];
        let mut out = Output::new();
        let report = analyze(&extents, 100, &mut out);

        assert_eq!(
            report.overlaps,
            vec![Overlap {
                offset: 60,
                size: 4,
                first: "a".to_string(),
                second: "b".to_string(),
            }]
        );
        assert_eq!(report.accounted, 104 - 4);
        assert_eq!(report.covered, 100);
        assert_eq!(out.count(Severity::Warning), 1);
    }

    #[test]
    fn blackholes() {
        let extents = vec![extent(0, 52, "ELF header"), extent(60, 20, "section 1 (.text)")];
        let mut out = Output::new();
        let report = analyze(&extents, 100, &mut out);

        assert_eq!(report.blackholes.len(), 2);
        assert_eq!((report.blackholes[0].offset, report.blackholes[0].size), (52, 8));
        assert_eq!(report.blackholes[1].before, None);
        assert_eq!(report.blackholes[1].size, 20);
        assert_eq!(report.accounted, 72);
        assert_eq!(report.difference, 28);
        insta::assert_snapshot!(out.diagnostics[0].to_string(), @"note at 0x34: 8 byte blackhole between ELF header and section 1 (.text)");
    }

    #[test]
    fn nested() {
        // a segment containing two sections: neighbor comparison sees an overlap with the
        // first section only, covered sees the union
        let extents = vec![
            extent(0, 100, "segment 0 (LOAD)"),
            extent(10, 10, "section 1"),
            extent(30, 10, "section 2"),
        ];
        let mut out = Output::new();
        let report = analyze(&extents, 100, &mut out);

        assert_eq!(report.overlaps.len(), 1);
        assert_eq!(report.overlaps[0].size, 90);
        assert_eq!(report.blackholes.len(), 2);
        assert_eq!(report.accounted, 120 - 90);
        assert_eq!(report.covered, 100);
    }

    #[test]
    fn past_the_end() {
        let extents = vec![extent(0, 64, "ELF header"), extent(50, 1000, "segment 0 (LOAD)")];
        let mut out = Output::new();
        let report = analyze(&extents, 100, &mut out);

        assert!(report.blackholes.is_empty());
        assert_eq!(report.covered, 100);
        assert_eq!(report.difference, 100 - (1064 - 14));
    }
}
