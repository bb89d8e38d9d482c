//! Type-state markers for IMAP client connection states.

/// Marker type for the not-authenticated state.
///
/// In this state, only LOGIN and LOGOUT are valid.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotAuthenticated;

/// Marker type for the authenticated state.
///
/// In this state a mailbox can be opened with EXAMINE.
#[derive(Debug, Clone, Copy, Default)]
pub struct Authenticated;

/// Marker type for a mailbox opened read-only.
///
/// In this state SEARCH and FETCH are valid.
#[derive(Debug, Clone, Copy, Default)]
pub struct Selected;
