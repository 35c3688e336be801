//! Status command for showing where usage is stored.

use std::io::Write;

use anyhow::Result;
use ustats_core::Kind;

use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let tracker = config.tracker();

    writeln!(writer, "Usage statistics status")?;
    writeln!(writer, "Storage root: {}", tracker.root().display())?;
    writeln!(writer, "Granularity: {}", tracker.granularity())?;
    for root in tracker.extra_roots() {
        writeln!(writer, "Extra root: {}", root.display())?;
    }

    let mut lines = Vec::new();
    for kind in Kind::ALL {
        let buckets = tracker.buckets(kind)?;
        let (Some(first), Some(last)) = (buckets.first(), buckets.last()) else {
            continue;
        };
        let name = |path: &std::path::Path| {
            path.file_name()
                .map_or_else(String::new, |n| n.to_string_lossy().into_owned())
        };
        lines.push(if buckets.len() == 1 {
            format!("- {kind}: 1 bucket ({})", name(first))
        } else {
            format!(
                "- {kind}: {} buckets ({} .. {})",
                buckets.len(),
                name(first),
                name(last)
            )
        });
    }

    if lines.is_empty() {
        writeln!(writer, "No usage recorded.")?;
        return Ok(());
    }

    writeln!(writer, "Buckets:")?;
    for line in lines {
        writeln!(writer, "{line}")?;
    }

    Ok(())
}
