//! Markdown export of a session

use super::{Thread, VersionEntry};
use std::fmt::Write as _;

pub(super) fn to_markdown(threads: &[&Thread], current: Option<&str>) -> String {
    let mut out = String::from("# Clear Convey session\n\n");
    let _ = writeln!(
        out,
        "Exported {} with {} thread(s).\n",
        chrono::Utc::now().format("%Y-%m-%d %H:%M UTC"),
        threads.len()
    );

    for thread in threads {
        let marker = if current == Some(thread.thread_id()) {
            " (current)"
        } else {
            ""
        };
        let _ = writeln!(out, "## {}{}\n", thread.title(), marker);
        let _ = writeln!(out, "- Thread: `{}`", thread.thread_id());
        let _ = writeln!(
            out,
            "- Started: {}\n",
            thread.start_time().format("%Y-%m-%d %H:%M:%S UTC")
        );

        for entry in thread.version_list() {
            match &entry {
                VersionEntry::Original { content } => {
                    let _ = writeln!(out, "### Original\n\n{}\n", content.trim_end());
                }
                VersionEntry::Version {
                    version_number,
                    content,
                } => {
                    let details = thread
                        .versions()
                        .get(version_number - 1)
                        .map(|v| {
                            format!(
                                " ({}, {}, {} words)",
                                v.request_type, v.content_type, v.word_count.revised
                            )
                        })
                        .unwrap_or_default();
                    let _ = writeln!(
                        out,
                        "### Version {}{}\n\n{}\n",
                        version_number,
                        details,
                        content.trim_end()
                    );
                }
            }
        }
    }

    out
}
