//! License compatibility, judged from the README with the license file as a fallback.

use super::LOG_TARGET;
use super::evaluator::{EvalContext, EvaluatorError, Score};
use regex::Regex;
use std::sync::LazyLock;

/// Lines quoted from a README that has no license section.
const MAX_MENTIONS: usize = 3;

/// Words that mark a line as naming a license, used when no license section exists.
const MENTION_KEYWORDS: &[&str] = &[
    "mit license",
    "apache 2.0",
    "apache license",
    "gpl",
    "bsd license",
    "bsd-2",
    "bsd-3",
    "lgpl",
    "mpl",
    "eclipse public",
];

static SECTION_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^#+\s*(licen[cs]e|licensing)\s*$").expect("valid regex"));

static PERMISSIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\b(",
        r"mit|apache[\s-]*(license|2(\.0)?)|apache2|bsd(-[234]-clause)?|isc|unlicense|cc0|zlib|boost|",
        r"mpl(-?2\.0)?|mozilla public license|eclipse public license",
        r")\b"
    ))
    .expect("valid regex")
});

static LGPL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\blgpl|\blesser general public license").expect("valid regex")
});

static COPYLEFT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(a?gpl(-?v?[23](\.0)?)?|gnu (affero )?general public license)\b").expect("valid regex")
});

/// Pull the license statement out of a README.
///
/// A `License`/`Licence`/`Licensing` heading wins; its body runs to the next heading. Without
/// one, the first few lines that name a license are used.
#[must_use]
pub fn extract_license_text(readme: &str) -> Option<String> {
    let lines: Vec<&str> = readme.lines().collect();

    if let Some(start) = lines.iter().position(|line| SECTION_HEADING.is_match(line.trim_end())) {
        let body: Vec<&str> = lines[start + 1..]
            .iter()
            .map(|line| line.trim())
            .take_while(|line| !line.starts_with('#'))
            .skip_while(|line| line.is_empty())
            .collect();

        let text = body.join(" ").trim().to_string();
        if !text.is_empty() {
            return Some(text);
        }
    }

    let mentions: Vec<&str> = lines
        .iter()
        .filter(|line| {
            let lower = line.to_lowercase();
            MENTION_KEYWORDS.iter().any(|k| lower.contains(k))
        })
        .map(|line| line.trim())
        .take(MAX_MENTIONS)
        .collect();

    if mentions.is_empty() { None } else { Some(mentions.join(" ")) }
}

/// Score license text: permissive 1.0, LGPL 0.5, strong copyleft 0.1, anything else 0.
///
/// LGPL is checked before GPL since every LGPL name also matches the GPL patterns.
#[must_use]
pub fn classify_license(text: &str) -> f64 {
    if PERMISSIVE.is_match(text) {
        1.0
    } else if LGPL.is_match(text) {
        0.5
    } else if COPYLEFT.is_match(text) {
        0.1
    } else {
        0.0
    }
}

pub(super) async fn evaluate(ctx: &EvalContext<'_>) -> Result<Score, EvaluatorError> {
    if let Some(text) = ctx.readme.and_then(extract_license_text) {
        return Ok(Score::Value(classify_license(&text)));
    }

    let reader = ctx.reader()?;
    let Some(license_file) = ctx.on_pool(move || reader.read_license_file()).await? else {
        log::info!(target: LOG_TARGET, "No license statement found for '{}'", ctx.entry.model_url());
        return Ok(Score::Value(0.0));
    };

    // The first lines of a license file name the license.
    let head: String = license_file.lines().take(5).collect::<Vec<_>>().join(" ");
    Ok(Score::Value(classify_license(&head)))
}
