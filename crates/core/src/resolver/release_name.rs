//! Scene-style release name parsing.
//!
//! Handles names like `Show.Name.S01E02.1080p.WEB.mkv` and
//! `Movie Name (2019) 720p.mp4`: title, year, resolution, season, episode.

use once_cell::sync::Lazy;
use regex_lite::Regex;

const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "m4v", "mov", "wmv", "ts", "webm", "mpg", "mpeg",
];

static EPISODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bS(\d{1,2})[ .-]?E(\d{1,3})\b").expect("episode regex")
});

static EPISODE_X: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})x(\d{2,3})\b").expect("episode regex"));

static QUALITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{3,4}p|4k|uhd)\b").expect("quality regex"));

static YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").expect("year regex"));

/// Source and codec tags that never belong to a title. Plain words such as
/// "web" or "proper" are left out since they show up in real titles.
static RELEASE_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(bluray|blu-ray|brrip|bdrip|web-?dl|webrip|hdtv|dvdrip|hdrip|remux|x264|x265|h264|h265|hevc)$",
    )
    .expect("release tag regex")
});

/// What a release name says about its file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseName {
    pub title: String,
    pub year: Option<i32>,
    /// Resolution label, e.g. "1080p".
    pub quality: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

impl ReleaseName {
    /// Season and episode are both known.
    pub fn episode_target(&self) -> Option<(u32, u32)> {
        self.season.zip(self.episode)
    }
}

/// Parse a file name. `None` when no title or no resolution can be found.
pub fn parse_release_name(filename: &str) -> Option<ReleaseName> {
    let name = strip_leading_group(strip_extension(filename.trim())).replace('_', ".");

    let quality_match = QUALITY.captures(&name)?;
    let quality_start = quality_match.get(0)?.start();
    let quality = normalize_quality(&quality_match[1]);

    let episode_caps = EPISODE.captures(&name).or_else(|| EPISODE_X.captures(&name));
    let (season, episode, episode_start) = match &episode_caps {
        Some(caps) => (
            caps[1].parse().ok(),
            caps[2].parse().ok(),
            caps.get(0).map(|m| m.start()),
        ),
        None => (None, None, None),
    };

    // Markers after the title; the title is whatever precedes the first one.
    let marker_limit = episode_start.unwrap_or(usize::MAX).min(quality_start);

    // A year at the very start is part of the title ("1917.2019.1080p").
    let year_match = YEAR
        .find_iter(&name)
        .filter(|m| m.start() > 0 && m.start() < marker_limit)
        .last();
    let year = year_match.and_then(|m| m.as_str().parse().ok());

    let mut title_end = marker_limit;
    if let Some(m) = year_match {
        title_end = title_end.min(m.start());
    }

    let title = strip_trailing_tags(&clean_title(&name[..title_end.min(name.len())]));
    if title.is_empty() {
        return None;
    }

    Some(ReleaseName {
        title,
        year,
        quality,
        season,
        episode,
    })
}

fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext))
            if VIDEO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext)) =>
        {
            stem
        }
        _ => name,
    }
}

/// Drop a leading `[Group]` tag.
fn strip_leading_group(name: &str) -> &str {
    if let Some(rest) = name.strip_prefix('[') {
        if let Some((_, after)) = rest.split_once(']') {
            return after.trim_start();
        }
    }
    name
}

fn normalize_quality(raw: &str) -> String {
    let lower = raw.to_ascii_lowercase();
    match lower.as_str() {
        "4k" | "uhd" => "2160p".to_string(),
        _ => lower,
    }
}

fn clean_title(raw: &str) -> String {
    let spaced = raw.replace('.', " ");
    let trimmed = spaced.trim_end_matches(|c: char| {
        c.is_whitespace() || matches!(c, '-' | '(' | '[' | '_')
    });
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drop release tags sitting between the title and the first marker
/// ("Movie.Name.BluRay.1080p"), keeping at least one word.
fn strip_trailing_tags(title: &str) -> String {
    let mut words: Vec<&str> = title.split_whitespace().collect();
    while words.len() > 1 && words.last().is_some_and(|w| RELEASE_TAG.is_match(w)) {
        words.pop();
    }
    words.join(" ")
}
