// Format normalization - reduce raw renditions to a ranked candidate list
//
// Pure and deterministic; malformed input degrades to defaults, never errors.

use std::cmp::Reverse;

use lazy_static::lazy_static;
use regex::Regex;

use super::models::{CandidateFormat, RawFormat};

/// Most candidates returned for a single describe call.
pub const MAX_CANDIDATES: usize = 10;

lazy_static! {
    // Anchored on purpose: "720p" ranks 720, "topp" ranks 0.
    static ref HEIGHT_LABEL_RE: Regex = Regex::new(r"^(\d+)p$").unwrap();
    static ref DIMENSIONS_RE: Regex = Regex::new(r"^(\d+)x(\d+)$").unwrap();
}

/// Rank key for a resolution label. Larger means higher quality; any label
/// that is neither `<digits>p` nor `<width>x<height>` ranks 0 and sorts last.
pub fn rank_key(label: &str) -> u32 {
    if let Some(caps) = HEIGHT_LABEL_RE.captures(label) {
        caps[1].parse().unwrap_or(0)
    } else if let Some(caps) = DIMENSIONS_RE.captures(label) {
        caps[2].parse().unwrap_or(0)
    } else {
        0
    }
}

/// Normalize raw renditions into a deduplicated, ranked candidate list.
///
/// Keeps video-carrying renditions only, one per resolution label. A later
/// rendition with the same label replaces the kept one when it carries an
/// audio track and the kept one does not, so callers get muxed files where
/// the source offers them and never need a second audio fetch. The result is
/// stable-sorted descending by rank key and capped at [`MAX_CANDIDATES`].
pub fn normalize(raw: &[RawFormat]) -> Vec<CandidateFormat> {
    let mut candidates: Vec<CandidateFormat> = Vec::new();
    let mut muxed: Vec<bool> = Vec::new();

    for fmt in raw.iter().filter(|f| f.has_video()) {
        let label = fmt.resolution_label();
        match candidates.iter().position(|c| c.resolution == label) {
            Some(i) => {
                if fmt.has_audio() && !muxed[i] {
                    candidates[i] = candidate(fmt, label);
                    muxed[i] = true;
                }
            }
            None => {
                muxed.push(fmt.has_audio());
                candidates.push(candidate(fmt, label));
            }
        }
    }

    candidates.sort_by_cached_key(|c| Reverse(rank_key(&c.resolution)));
    candidates.truncate(MAX_CANDIDATES);
    candidates
}

fn candidate(fmt: &RawFormat, label: String) -> CandidateFormat {
    CandidateFormat {
        format_id: fmt.format_id.clone(),
        ext: fmt.ext.clone(),
        resolution: label,
        filesize: fmt.size(),
        format_note: fmt.format_note.clone().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn video(id: &str, resolution: Option<&str>, height: Option<u32>, acodec: &str) -> RawFormat {
        RawFormat {
            format_id: id.to_string(),
            ext: "mp4".to_string(),
            resolution: resolution.map(|s| s.to_string()),
            height,
            vcodec: Some("avc1".to_string()),
            acodec: Some(acodec.to_string()),
            ..RawFormat::default()
        }
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn audio_only_renditions_are_excluded() {
        let raw = vec![
            RawFormat {
                format_id: "audio".to_string(),
                vcodec: Some("none".to_string()),
                acodec: Some("mp4a".to_string()),
                ..RawFormat::default()
            },
            video("v720", Some("720p"), Some(720), "mp4a"),
        ];
        let out = normalize(&raw);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].resolution, "720p");
    }

    #[test]
    fn output_is_capped_at_ten() {
        let raw: Vec<RawFormat> = (1..=14)
            .map(|i| video(&format!("f{i}"), None, Some(i * 100), "mp4a"))
            .collect();
        let out = normalize(&raw);
        assert_eq!(out.len(), MAX_CANDIDATES);
        // Highest-ranked entries survive the cut.
        assert_eq!(out[0].resolution, "1400p");
    }

    #[test]
    fn no_two_entries_share_a_label() {
        let raw = vec![
            video("a", Some("720p"), Some(720), "mp4a"),
            video("b", Some("720p"), Some(720), "mp4a"),
            video("c", Some("480p"), Some(480), "none"),
            video("d", Some("480p"), Some(480), "none"),
            video("e", None, Some(720), "mp4a"),
        ];
        let out = normalize(&raw);
        let labels: HashSet<&str> = out.iter().map(|c| c.resolution.as_str()).collect();
        assert_eq!(labels.len(), out.len());
    }

    #[test]
    fn muxed_rendition_replaces_video_only_twin() {
        // 720p video-only, then 720p with audio, then 480p with audio.
        let raw = vec![
            video("video-only", Some("720p"), Some(720), "none"),
            video("muxed", Some("720p"), Some(720), "aac"),
            video("low", Some("480p"), Some(480), "aac"),
        ];
        let out = normalize(&raw);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].resolution, "720p");
        assert_eq!(out[0].format_id, "muxed");
        assert_eq!(out[1].resolution, "480p");
        assert_eq!(out[1].format_id, "low");
    }

    #[test]
    fn muxed_entry_is_not_replaced_by_later_duplicates() {
        let raw = vec![
            video("first-muxed", Some("720p"), Some(720), "aac"),
            video("second-muxed", Some("720p"), Some(720), "opus"),
            video("video-only", Some("720p"), Some(720), "none"),
        ];
        let out = normalize(&raw);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].format_id, "first-muxed");
    }

    #[test]
    fn sorted_descending_with_stable_ties() {
        // "640x360" and "360p" both rank 360; their arrival order must hold.
        let raw = vec![
            video("mid", Some("480p"), Some(480), "mp4a"),
            video("first-360", Some("640x360"), None, "mp4a"),
            video("second-360", Some("360p"), None, "mp4a"),
            video("top", Some("1080p"), Some(1080), "mp4a"),
        ];
        let out = normalize(&raw);
        let labels: Vec<&str> = out.iter().map(|c| c.resolution.as_str()).collect();
        assert_eq!(labels, vec!["1080p", "480p", "640x360", "360p"]);
    }

    #[test]
    fn unparsable_labels_rank_last() {
        let raw = vec![
            video("u", Some("unknownp"), None, "mp4a"),
            video("t", Some("topp"), None, "mp4a"),
            video("tiny", Some("144p"), Some(144), "mp4a"),
        ];
        let out = normalize(&raw);
        assert_eq!(out[0].resolution, "144p");
        // Zero-ranked entries keep their arrival order behind it.
        assert_eq!(out[1].resolution, "unknownp");
        assert_eq!(out[2].resolution, "topp");
    }

    #[test]
    fn rank_key_matches_narrow_patterns_only() {
        assert_eq!(rank_key("720p"), 720);
        assert_eq!(rank_key("256x144"), 144);
        assert_eq!(rank_key("unknownp"), 0);
        assert_eq!(rank_key("topp"), 0);
        assert_eq!(rank_key("p"), 0);
        assert_eq!(rank_key("1080p60"), 0);
        assert_eq!(rank_key(""), 0);
    }

    #[test]
    fn missing_height_derives_unknown_label() {
        let out = normalize(&[video("x", None, None, "mp4a")]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].resolution, "unknownp");
    }

    #[test]
    fn output_never_exceeds_video_count() {
        let raw = vec![
            video("a", Some("720p"), Some(720), "mp4a"),
            RawFormat {
                format_id: "audio".to_string(),
                vcodec: Some("none".to_string()),
                ..RawFormat::default()
            },
        ];
        assert!(normalize(&raw).len() <= 1);
    }
}
