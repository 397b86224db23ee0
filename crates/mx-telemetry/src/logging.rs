//! Structured logging helpers.
//!
//! Every record carries a `subsystem` field so JSON logs can be split per
//! subsystem downstream.

/// Log a member-related event with standard fields.
#[macro_export]
macro_rules! log_member_event {
    ($level:ident, $subsystem:expr, $msg:expr, $member_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            subsystem = $subsystem,
            member_id = %$member_id,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a reward-record event with standard fields.
#[macro_export]
macro_rules! log_reward_event {
    ($level:ident, $subsystem:expr, $msg:expr, $record_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            subsystem = $subsystem,
            record_id = %$record_id,
            $($($field)*,)?
            $msg
        )
    };
}
