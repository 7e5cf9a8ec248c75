//! Video and comment id extraction from card URIs
//!
//! Card URIs are not parsed as URLs. They follow a textual convention:
//! - the video id follows `video/` and runs up to the next `?`
//! - the comment id is everything after the last `=`
//!
//! For example `https://www.bilibili.com/video/BV1GJ411x7h7?comment_on=1&comment_root_id=456`
//! yields `BV1GJ411x7h7` and `456`.

use crate::models::VideoRef;
use crate::error::BiliErrorTrait;
use crate::utils::error::ExtractError;

/// Marker preceding the video id
const VIDEO_MARKER: &str = "video/";

/// Full-host form of the marker, checked when the short marker is absent
const BILIBILI_VIDEO_MARKER: &str = "bilibili.com/video/";

/// Derive video and comment ids from a card URI
///
/// The absence of `video/` is detected before any offset is applied, so a URI
/// without the marker never yields a slice taken from an arbitrary position.
/// The `bilibili.com/video/` form is kept as an explicit second branch; it
/// contains `video/` itself, so it only matters if the first marker changes.
///
/// # Errors
///
/// - `ExtractError::NoVideoSegment` if neither marker is present
/// - `ExtractError::EmptyVideoId` if the marker is followed directly by `?` or the end
/// - `ExtractError::EmptyCommentId` if the URI ends with `=`, or is empty
///
/// # Examples
///
/// ```
/// use bilicomments::crawler::url::extract_video_ref;
///
/// let r = extract_video_ref("https://www.bilibili.com/video/BV123?comment_root_id=456").unwrap();
/// assert_eq!(r.video_id, "BV123");
/// assert_eq!(r.comment_id, "456");
/// ```
pub fn extract_video_ref(uri: &str) -> Result<VideoRef, ExtractError> {
    let video_id = if let Some(pos) = uri.find(VIDEO_MARKER) {
        let rest = &uri[pos + VIDEO_MARKER.len()..];
        rest.split('?').next().unwrap_or_default()
    } else if uri.contains(BILIBILI_VIDEO_MARKER) {
        let last_segment = uri.rsplit('/').next().unwrap_or_default();
        last_segment.split('?').next().unwrap_or_default()
    } else {
        return Err(ExtractError::NoVideoSegment);
    };

    if video_id.is_empty() {
        return Err(ExtractError::EmptyVideoId);
    }

    let comment_id = uri.rsplit('=').next().unwrap_or_default();
    if comment_id.is_empty() {
        return Err(ExtractError::EmptyCommentId);
    }

    Ok(VideoRef {
        video_id: video_id.to_string(),
        comment_id: comment_id.to_string(),
    })
}

/// Derive ids from a card URI, logging and discarding failures
pub fn extract(uri: &str) -> Option<VideoRef> {
    match extract_video_ref(uri) {
        Ok(video_ref) => Some(video_ref),
        Err(e) => {
            tracing::warn!(
                uri = %uri,
                error = %e,
                category = e.category().as_str(),
                "Could not extract video info from URI"
            );
            None
        }
    }
}
