//! Parsing of batch URL files.
//!
//! Two line formats are accepted and may be mixed:
//!
//! - A CSV triple `code,dataset,model`, where the code and dataset fields may be blank.
//! - A single URL. Code and dataset URLs are remembered and attached to the next model URL,
//!   which closes the entry.

use super::classifier::{SourceKind, classify};
use super::{Entry, LOG_TARGET};

/// Parse the contents of a URL file into entries, in input order.
#[must_use]
pub fn parse_url_file(text: &str) -> Vec<Entry> {
    let mut entries = Vec::new();
    let mut pending_code: Option<&str> = None;
    let mut pending_dataset: Option<&str> = None;

    for (index, raw) in text.lines().enumerate() {
        let line_num = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.contains(',') {
            let mut fields = line.split(',').map(str::trim);
            let code = fields.next();
            let dataset = fields.next();
            let model = fields.next().unwrap_or_default();

            match Entry::new(code, dataset, model) {
                Ok(entry) => entries.push(entry),
                Err(e) => log::warn!(target: LOG_TARGET, "Line {line_num}: skipping triple: {e}"),
            }

            continue;
        }

        match classify(line) {
            SourceKind::Code => pending_code = Some(line),
            SourceKind::Dataset => pending_dataset = Some(line),
            SourceKind::Model => match Entry::new(pending_code.take(), pending_dataset.take(), line) {
                Ok(entry) => entries.push(entry),
                Err(e) => log::warn!(target: LOG_TARGET, "Line {line_num}: skipping model URL: {e}"),
            },
            SourceKind::Unknown => log::warn!(target: LOG_TARGET, "Line {line_num}: unrecognized URL '{line}'"),
        }
    }

    if pending_code.is_some() || pending_dataset.is_some() {
        log::warn!(target: LOG_TARGET, "Ignoring trailing code or dataset URLs that are not followed by a model URL");
    }

    log::debug!(target: LOG_TARGET, "Parsed {} entries", entries.len());
    entries
}
