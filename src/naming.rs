// Filename building: sanitizing titles, trimming them to a word boundary and
// rendering the configured filename pattern.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

/// Returned when sanitizing leaves nothing usable
pub const FALLBACK_NAME: &str = "unnamed_file";

static RE_FORBIDDEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*]"#).unwrap());

/// Replace characters that are not allowed in filenames with `_`
///
/// Total and idempotent: the output never contains a forbidden character.
/// Leading dots are dropped so the result is never a hidden file or a
/// `.`/`..` path component. Input left with nothing but forbidden
/// characters, dots and whitespace becomes [`FALLBACK_NAME`].
pub fn sanitize(text: &str) -> String {
    let visible = RE_FORBIDDEN.replace_all(text, "");
    if visible.trim().trim_start_matches('.').trim().is_empty() {
        return FALLBACK_NAME.to_string();
    }
    RE_FORBIDDEN
        .replace_all(text, "_")
        .trim_start_matches('.')
        .to_string()
}

/// Trim a title to at most `limit` characters without splitting a word
///
/// e.g. ("Test Video Title That Is Quite Long Indeed", 20) -> "Test Video Title"
///
/// A single word longer than the limit is hard-cut, since there is no
/// boundary to break at.
pub fn trim_title(title: &str, limit: usize) -> String {
    if title.chars().count() <= limit {
        return title.to_string();
    }

    let cut = title
        .char_indices()
        .nth(limit)
        .map(|(idx, _)| idx)
        .unwrap_or(title.len());
    let prefix = &title[..cut];

    // The limit lands exactly on a boundary, keep every word before it
    if title[cut..].starts_with(char::is_whitespace) {
        return prefix.trim_end().to_string();
    }

    match prefix.rfind(char::is_whitespace) {
        Some(idx) if !prefix[..idx].trim_end().is_empty() => prefix[..idx].trim_end().to_string(),
        _ => prefix.to_string(),
    }
}

/// Errors raised while parsing a filename pattern
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("unknown placeholder '{{{0}}}' in filename pattern")]
    UnknownPlaceholder(String),

    #[error("empty placeholder '{{}}' at position {0}")]
    EmptyPlaceholder(usize),

    #[error("unclosed '{{' at position {0}")]
    Unclosed(usize),

    #[error("unmatched '}}' at position {0}")]
    UnmatchedClose(usize),

    #[error("filename pattern is empty")]
    Empty,
}

/// Variables a pattern can reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Title,
    VideoId,
    Date,
    Original,
    ChannelName,
}

impl Placeholder {
    fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "title" => Some(Self::Title),
            "id" | "video_id" => Some(Self::VideoId),
            "date" => Some(Self::Date),
            "original" => Some(Self::Original),
            "channel_name" | "channel" => Some(Self::ChannelName),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Var(Placeholder),
}

/// A parsed filename pattern such as `{title}_{id}.mp4`
///
/// `{{` and `}}` produce literal braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameTemplate {
    source: String,
    segments: Vec<Segment>,
}

/// Substitution values for one rendering
#[derive(Debug, Clone)]
pub struct TemplateVars<'a> {
    pub title: &'a str,
    pub video_id: &'a str,
    pub original: &'a str,
    pub channel_name: &'a str,
    pub date: NaiveDate,
}

impl FilenameTemplate {
    pub fn parse(pattern: &str) -> Result<Self, TemplateError> {
        if pattern.trim().is_empty() {
            return Err(TemplateError::Empty);
        }

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = pattern.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    literal.push('{');
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, inner) in chars.by_ref() {
                        match inner {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => return Err(TemplateError::Unclosed(pos)),
                            other => name.push(other),
                        }
                    }
                    if !closed {
                        return Err(TemplateError::Unclosed(pos));
                    }
                    if name.trim().is_empty() {
                        return Err(TemplateError::EmptyPlaceholder(pos));
                    }
                    let var = Placeholder::parse(&name)
                        .ok_or_else(|| TemplateError::UnknownPlaceholder(name.clone()))?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Var(var));
                }
                '}' => return Err(TemplateError::UnmatchedClose(pos)),
                other => literal.push(other),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the pattern references `placeholder`
    pub fn uses(&self, placeholder: Placeholder) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Var(p) if *p == placeholder))
    }

    /// Render a filename. The title is sanitized here; the other values
    /// come from the filesystem or a lookup and are sanitized too so the
    /// result is always a single path component.
    pub fn render(&self, vars: &TemplateVars<'_>) -> String {
        let date = vars.date.format("%Y%m%d").to_string();
        let mut out = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Var(Placeholder::Title) => out.push_str(&sanitize(vars.title)),
                Segment::Var(Placeholder::VideoId) => out.push_str(&sanitize(vars.video_id)),
                Segment::Var(Placeholder::Date) => out.push_str(&date),
                Segment::Var(Placeholder::Original) => out.push_str(&sanitize(vars.original)),
                Segment::Var(Placeholder::ChannelName) => {
                    out.push_str(&sanitize(vars.channel_name))
                }
            }
        }

        out
    }
}
