//! Terminal formatting for search hits and index statistics

use crate::index::stats::IndexStats;
use crate::index::types::SearchHit;
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Stdout stream, coloured only when `color` is set and the terminal allows it
pub fn stdout(color: bool) -> StandardStream {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    StandardStream::stdout(choice)
}

/// One line per hit: `score  id  title  [path]`
pub fn write_hits<W: WriteColor>(out: &mut W, hits: &[SearchHit]) -> io::Result<()> {
    if hits.is_empty() {
        writeln!(out, "(no results)")?;
        return Ok(());
    }

    for hit in hits {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        write!(out, "{:.3}", hit.score)?;
        out.reset()?;
        write!(out, "  ")?;

        out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
        write!(out, "{}", hit.document.id)?;
        out.reset()?;

        out.set_color(ColorSpec::new().set_bold(true))?;
        write!(out, "  {}", hit.document.title)?;
        out.reset()?;

        out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
        writeln!(out, "  [{}]", hit.document.path)?;
        out.reset()?;
    }

    Ok(())
}

/// Human-readable index summary followed by a per-segment table
pub fn write_stats<W: WriteColor>(out: &mut W, stats: &IndexStats) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_bold(true))?;
    writeln!(out, "Index Statistics")?;
    out.reset()?;
    writeln!(out, "================")?;
    writeln!(out)?;
    writeln!(out, "Root: {}", stats.root.display())?;
    writeln!(out, "Total documents: {}", stats.total_docs)?;
    writeln!(out, "Live documents: {}", stats.live_docs)?;
    writeln!(out, "Tombstones: {}", stats.tombstones)?;
    writeln!(out, "Next id: {}", stats.next_id)?;
    writeln!(out, "Disk usage: {}", format_size(stats.disk_bytes))?;
    writeln!(out)?;

    writeln!(out, "Segments ({}):", stats.segments.len())?;
    for segment in &stats.segments {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
        write!(out, "  {}", segment.name)?;
        out.reset()?;
        writeln!(
            out,
            ": {} docs ({} live), created {}",
            segment.doc_count,
            segment.live_docs,
            format_timestamp(segment.created_at_unix)
        )?;
    }

    Ok(())
}

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Seconds since the epoch as a relative age
pub fn format_timestamp(ts: u64) -> String {
    let now = crate::index::writer::unix_now();
    let age = now.saturating_sub(ts);
    match age {
        0..=59 => format!("{}s ago", age),
        60..=3599 => format!("{}m ago", age / 60),
        3600..=86_399 => format!("{}h ago", age / 3600),
        _ => format!("{}d ago", age / 86_400),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::stats::SegmentInfo;
    use crate::index::types::Document;
    use std::path::PathBuf;
    use termcolor::NoColor;

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut NoColor<Vec<u8>>) -> io::Result<()>,
    {
        let mut out = NoColor::new(Vec::new());
        f(&mut out).unwrap();
        String::from_utf8(out.into_inner()).unwrap()
    }

    #[test]
    fn test_hit_lines() {
        let hits = vec![SearchHit {
            score: 1.0,
            document: Document {
                id: 7,
                title: "apple notes".to_string(),
                path: "docs/apple_notes.txt".to_string(),
                text: String::new(),
            },
        }];

        let text = render(|out| write_hits(out, &hits));
        assert_eq!(text, "1.000  7  apple notes  [docs/apple_notes.txt]\n");
    }

    #[test]
    fn test_no_hits() {
        assert_eq!(render(|out| write_hits(out, &[])), "(no results)\n");
    }

    #[test]
    fn test_stats_listing() {
        let stats = IndexStats {
            root: PathBuf::from("segments"),
            total_docs: 3,
            live_docs: 2,
            tombstones: 1,
            next_id: 4,
            segments: vec![SegmentInfo {
                name: "seg_000001".to_string(),
                doc_count: 3,
                live_docs: 2,
                created_at_unix: 0,
            }],
            disk_bytes: 2048,
        };

        let text = render(|out| write_stats(out, &stats));
        assert!(text.contains("Total documents: 3"));
        assert!(text.contains("Disk usage: 2.00 KB"));
        assert!(text.contains("  seg_000001: 3 docs (2 live), created"));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }
}
