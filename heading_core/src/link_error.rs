//! Maps `Box<dyn Error>` from the `RobotLink` boundary to a typed `DispatchError`.
//!
//! With the `link-errors` feature, `heading_link::LinkError` is downcast for a
//! precise mapping; other transports fall back to string heuristics.

use crate::error::DispatchError;

pub fn map_link_error(e: &(dyn std::error::Error + 'static)) -> DispatchError {
    #[cfg(feature = "link-errors")]
    {
        use heading_link::LinkError;
        if let Some(le) = e.downcast_ref::<LinkError>() {
            return match le {
                LinkError::InvalidTarget(m) => DispatchError::InvalidTarget(m.clone()),
                LinkError::Transport(m) => DispatchError::Transport(m.clone()),
                LinkError::BadResponse(m) => DispatchError::BadResponse(m.clone()),
            };
        }
    }

    let s = e.to_string();
    let lower = s.to_lowercase();
    if lower.contains("invalid target") || lower.contains("invalid url") {
        DispatchError::InvalidTarget(s)
    } else if lower.contains("bad response") || lower.contains("empty body") || lower.contains("utf-8") {
        DispatchError::BadResponse(s)
    } else {
        DispatchError::Transport(s)
    }
}
