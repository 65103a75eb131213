use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

use crate::models::playlist::{Channel, DEFAULT_GROUP, DEFAULT_TITLE};

/// Header every playlist must carry somewhere in its text
const M3U_HEADER: &str = "#EXTM3U";
const EXTINF_TAG: &str = "#EXTINF:";
const PLAYER_OPTION_TAGS: [&str; 2] = ["#EXTVLCOPT:", "#KODIPROP:"];

/// Schemes accepted on a URL line without a `://` separator
const STREAM_SCHEMES: [&str; 7] = ["http", "rtmp", "rtsp", "rtp", "udp", "mms", "srt"];

lazy_static! {
    /// Regex to normalize multiple whitespaces into single space
    static ref MULTI_SPACE_REGEX: Regex = Regex::new(r"\s{2,}").unwrap();
    /// Regex to parse EXTINF attributes (tvg-name="...", group-title="...", etc)
    static ref ATTR_REGEX: Regex = Regex::new(r#"(\w+(?:-\w+)*)="([^"]*)""#).unwrap();
}

/// Channel metadata waiting for its URL line
#[derive(Debug)]
struct PendingChannel {
    title: String,
    logo_url: String,
    group: String,
    user_agent: String,
}

impl PendingChannel {
    fn complete(self, stream_url: &str) -> Channel {
        Channel {
            title: self.title,
            logo_url: self.logo_url,
            group: self.group,
            stream_url: stream_url.to_string(),
            user_agent: self.user_agent,
        }
    }
}

/// Accumulator threaded through the line fold
#[derive(Debug, Default)]
struct ParseState {
    pending: Option<PendingChannel>,
    channels: Vec<Channel>,
}

impl ParseState {
    fn step(mut self, line: &str) -> Self {
        if line.is_empty() {
            return self;
        }

        if let Some(info) = line.strip_prefix(EXTINF_TAG) {
            if let Some(dropped) = self.pending.replace(parse_extinf(info)) {
                tracing::debug!("Dropping channel without URL: {}", dropped.title);
            }
            return self;
        }

        if line.starts_with('#') {
            if let (Some(pending), Some(user_agent)) = (self.pending.as_mut(), player_option_user_agent(line)) {
                pending.user_agent = user_agent;
            }
            return self;
        }

        if is_stream_url(line) {
            if let Some(pending) = self.pending.take() {
                self.channels.push(pending.complete(line));
            }
        }

        self
    }
}

/// Parse M3U text into channels, in file order.
///
/// Malformed input never fails: entries without a URL are dropped and text
/// without the `#EXTM3U` header yields no channels at all.
pub fn parse(content: &str) -> Vec<Channel> {
    if !content.contains(M3U_HEADER) {
        return Vec::new();
    }

    let normalized = content.replace("\r\n", "\n").replace('\r', "\n");

    normalized
        .split('\n')
        .map(str::trim)
        .fold(ParseState::default(), ParseState::step)
        .channels
}

/// Parse the part of an EXTINF line after the tag.
/// Format: duration tvg-name="..." tvg-logo="..." group-title="...",Label
fn parse_extinf(info: &str) -> PendingChannel {
    let attributes: HashMap<&str, &str> = ATTR_REGEX
        .captures_iter(info)
        .filter_map(|caps| Some((caps.get(1)?.as_str(), caps.get(2)?.as_str())))
        .collect();

    let label = info
        .rfind(',')
        .map(|comma| normalize_text(&info[comma + 1..]))
        .unwrap_or_default();

    let title = attributes
        .get("tvg-name")
        .map(|name| normalize_text(name))
        .filter(|name| !name.is_empty())
        .or_else(|| Some(label).filter(|label| !label.is_empty()))
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let group = attributes
        .get("group-title")
        .map(|group| normalize_text(group))
        .filter(|group| !group.is_empty())
        .unwrap_or_else(|| DEFAULT_GROUP.to_string());

    let logo_url = attributes
        .get("tvg-logo")
        .map(|logo| logo.trim().to_string())
        .unwrap_or_default();

    PendingChannel {
        title,
        logo_url,
        group,
        user_agent: String::new(),
    }
}

/// Extract a user agent from a VLC/Kodi player option line.
///
/// Recognized forms:
/// - `#EXTVLCOPT:http-user-agent=Agent`
/// - `#KODIPROP:inputstream.adaptive.stream_headers=User-Agent=Agent&Referer=...`
fn player_option_user_agent(line: &str) -> Option<String> {
    let directive = PLAYER_OPTION_TAGS
        .iter()
        .find_map(|tag| line.strip_prefix(tag))?;
    let (key, value) = directive.split_once('=')?;
    let key = key.trim().to_ascii_lowercase();

    let agent = if key == "http-user-agent" || key == "user-agent" {
        value.trim()
    } else if key.ends_with("stream_headers") {
        value.split('&').find_map(|header| {
            let (name, agent) = header.split_once('=')?;
            name.trim().eq_ignore_ascii_case("user-agent").then(|| agent.trim())
        })?
    } else {
        return None;
    };

    (!agent.is_empty()).then(|| agent.to_string())
}

/// Whether a non-comment line is a stream location
fn is_stream_url(line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    line.starts_with('/')
        || lower.contains("://")
        || STREAM_SCHEMES.iter().any(|scheme| lower.starts_with(scheme))
}

/// Normalize text: trim and collapse multiple spaces into single space
fn normalize_text(text: &str) -> String {
    let trimmed = text.trim();
    MULTI_SPACE_REGEX.replace_all(trimmed, " ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "#EXTM3U\n#EXTINF:-1 tvg-name=\"News\" group-title=\"Info\",News\nhttp://a/news.m3u8\n#EXTINF:-1,Orphan\n#EXTINF:-1 group-title=\"Info\",Sports\nhttp://a/sports.m3u8\n";

    #[test]
    fn test_parse_drops_entry_without_url() {
        let channels = parse(SAMPLE);

        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].title, "News");
        assert_eq!(channels[0].group, "Info");
        assert_eq!(channels[0].stream_url, "http://a/news.m3u8");
        assert_eq!(channels[1].title, "Sports");
        assert_eq!(channels[1].group, "Info");
        assert_eq!(channels[1].stream_url, "http://a/sports.m3u8");
    }

    #[test]
    fn test_parse_requires_header() {
        let content = "#EXTINF:-1,News\nhttp://a/news.m3u8\n";
        assert!(parse(content).is_empty());
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_parse_crlf_and_blank_lines() {
        let content = "#EXTM3U\r\n\r\n#EXTINF:-1 group-title=\"Movies\",Film\r\n\r\nhttp://a/film.ts\r\n";
        let channels = parse(content);

        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].title, "Film");
        assert_eq!(channels[0].stream_url, "http://a/film.ts");
    }

    #[test]
    fn test_parse_ignores_url_without_metadata() {
        let content = "#EXTM3U\nhttp://a/stray.ts\n#EXTINF:-1,Real\nhttp://a/real.ts\nhttp://a/second.ts\n";
        let channels = parse(content);

        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].title, "Real");
        assert_eq!(channels[0].stream_url, "http://a/real.ts");
    }

    #[test]
    fn test_parse_placeholder_title_and_default_group() {
        let content = "#EXTM3U\n#EXTINF:-1\nrtmp://a/live\n";
        let channels = parse(content);

        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].title, DEFAULT_TITLE);
        assert_eq!(channels[0].group, DEFAULT_GROUP);
        assert!(channels[0].logo_url.is_empty());
    }

    #[test]
    fn test_parse_label_after_last_comma() {
        let content = "#EXTM3U\n#EXTINF:-1 tvg-logo=\"http://l/x.png\" group-title=\"\",Sports, Extra\nhttp://a/x.ts\n";
        let channels = parse(content);

        assert_eq!(channels[0].title, "Extra");
        assert_eq!(channels[0].group, DEFAULT_GROUP);
        assert_eq!(channels[0].logo_url, "http://l/x.png");
    }

    #[test]
    fn test_parse_accepts_other_url_shapes() {
        let content = "#EXTM3U\n#EXTINF:-1,Udp\nudp://@239.0.0.1:1234\n#EXTINF:-1,Local\n/media/local.ts\n#EXTINF:-1,Custom\nfoo://bar\n#EXTINF:-1,Text\nnot a url\n";
        let channels = parse(content);

        let urls: Vec<&str> = channels.iter().map(|c| c.stream_url.as_str()).collect();
        assert_eq!(urls, vec!["udp://@239.0.0.1:1234", "/media/local.ts", "foo://bar"]);
    }

    #[test]
    fn test_parse_player_option_user_agent() {
        let content = "#EXTM3U\n\
            #EXTINF:-1,Vlc\n\
            #EXTVLCOPT:http-user-agent=Mozilla/5.0\n\
            #EXTVLCOPT:http-referrer=http://ref\n\
            http://a/vlc.m3u8\n\
            #EXTINF:-1,Kodi\n\
            #KODIPROP:inputstream.adaptive.stream_headers=Referer=http://r&User-Agent=Kodi/20\n\
            http://a/kodi.m3u8\n\
            #EXTINF:-1,Plain\n\
            http://a/plain.m3u8\n";
        let channels = parse(content);

        assert_eq!(channels.len(), 3);
        assert_eq!(channels[0].user_agent, "Mozilla/5.0");
        assert_eq!(channels[1].user_agent, "Kodi/20");
        assert!(channels[2].user_agent.is_empty());
    }

    #[test]
    fn test_player_option_without_pending_channel_is_ignored() {
        let content = "#EXTM3U\n#EXTVLCOPT:http-user-agent=Early\n#EXTINF:-1,A\nhttp://a/a.ts\n";
        let channels = parse(content);
        assert!(channels[0].user_agent.is_empty());
    }

    #[test]
    fn test_parse_keeps_duplicates_in_order() {
        let content = "#EXTM3U\n#EXTINF:-1,Same\nhttp://a/1.ts\n#EXTINF:-1,Same\nhttp://a/1.ts\n";
        let channels = parse(content);
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0], channels[1]);
    }

    #[test]
    fn test_parse_normalizes_whitespace() {
        let content = "#EXTM3U\n#EXTINF:-1 group-title=\"  Sports   HD \",  Canal   Teste  \nhttp://a/t.ts\n";
        let channels = parse(content);
        assert_eq!(channels[0].title, "Canal Teste");
        assert_eq!(channels[0].group, "Sports HD");
    }
}
