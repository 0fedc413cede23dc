// Session-scoped dashboard state
use crate::domain::map::MapTileStyle;
use crate::domain::selection::SelectionState;
use crate::domain::view::Notice;
use thiserror::Error;

/// Refresh cadences offered in the sidebar, in seconds.
pub const REFRESH_INTERVAL_OPTIONS: [u64; 5] = [5, 10, 15, 30, 60];

#[derive(Debug, Error, PartialEq)]
#[error("refresh interval must be one of {:?} seconds, got {}", REFRESH_INTERVAL_OPTIONS, .0)]
pub struct InvalidInterval(pub u64);

pub fn validate_interval(secs: u64) -> Result<u64, InvalidInterval> {
    if REFRESH_INTERVAL_OPTIONS.contains(&secs) {
        Ok(secs)
    } else {
        Err(InvalidInterval(secs))
    }
}

/// Sidebar controls.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardOptions {
    pub auto_refresh: bool,
    pub interval_secs: u64,
    /// Set when a background loop drives the refresh counter instead of the page.
    pub background_interval_secs: Option<u64>,
    pub show_images: bool,
    pub map_style: MapTileStyle,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            auto_refresh: true,
            interval_secs: 10,
            background_interval_secs: None,
            show_images: true,
            map_style: MapTileStyle::OpenStreetMap,
        }
    }
}

/// Outcome of the most recent refresh tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub count: u64,
    pub cache_cleared: bool,
}

/// Everything that outlives a single render: what is selected, how the
/// sidebar is set, and where the refresh counter stands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionContext {
    pub selection: SelectionState,
    pub options: DashboardOptions,
    pub last_tick: TickOutcome,
    /// Warnings raised outside a render, shown once by the next page.
    pub pending_notices: Vec<Notice>,
}

impl SessionContext {
    pub fn new(options: DashboardOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_options() {
        for secs in REFRESH_INTERVAL_OPTIONS {
            assert_eq!(validate_interval(secs), Ok(secs));
        }
        assert_eq!(validate_interval(7), Err(InvalidInterval(7)));
    }

    #[test]
    fn test_new_session_has_no_selection() {
        let session = SessionContext::new(DashboardOptions::default());
        assert_eq!(session.selection.selected(), None);
        assert_eq!(session.last_tick.count, 0);
        assert_eq!(session.options.interval_secs, 10);
        assert!(session.pending_notices.is_empty());
    }
}
