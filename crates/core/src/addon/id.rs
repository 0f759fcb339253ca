//! Protocol identifiers: `<prefix><externalId>[:<season>:<episode>]`.

/// A parsed protocol id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolId {
    pub external_id: u32,
    /// `(season, episode)` for per-episode ids.
    pub episode: Option<(u32, u32)>,
}

impl ProtocolId {
    pub fn title(external_id: u32) -> Self {
        Self {
            external_id,
            episode: None,
        }
    }

    pub fn episode(external_id: u32, season: u32, episode: u32) -> Self {
        Self {
            external_id,
            episode: Some((season, episode)),
        }
    }

    /// Parse `raw`, which must start with `prefix`. `None` for anything
    /// that is not one of our ids.
    pub fn parse(prefix: &str, raw: &str) -> Option<Self> {
        let body = raw.strip_prefix(prefix)?;
        let mut parts = body.split(':');

        let external_id = parse_number(parts.next()?)?;
        match (parts.next(), parts.next(), parts.next()) {
            (None, _, _) => Some(Self::title(external_id)),
            (Some(season), Some(episode), None) => Some(Self::episode(
                external_id,
                parse_number(season)?,
                parse_number(episode)?,
            )),
            _ => None,
        }
    }

    pub fn format(&self, prefix: &str) -> String {
        match self.episode {
            Some((season, episode)) => {
                format!("{}{}:{}:{}", prefix, self.external_id, season, episode)
            }
            None => format!("{}{}", prefix, self.external_id),
        }
    }
}

/// Plain decimal only; `u32::from_str` alone would also accept "+7".
fn parse_number(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
