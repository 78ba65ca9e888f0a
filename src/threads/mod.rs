mod ids;
mod mirror;
mod model;
mod render;
mod store;

use time::{macros::format_description, OffsetDateTime, UtcOffset};

pub use ids::{now_millis, IdClock};
pub use mirror::Mirror;
#[cfg(test)]
pub(crate) use mirror::wait_for_calls;
pub use model::{normalize_messages, parse_messages, Message, Reply};
pub use render::{render, render_with_open_form};
pub use store::ThreadStore;

pub const MAX_NAME_CHARS: usize = 50;
pub const MAX_CONTENT_CHARS: usize = 500;

/// `2025/3/7 09:05:03` in the given offset.
pub fn display_time(at: OffsetDateTime, offset: UtcOffset) -> String {
    let format = format_description!(
        "[year]/[month padding:none]/[day padding:none] [hour]:[minute]:[second]"
    );
    at.to_offset(offset).format(&format).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use time::macros::{datetime, offset};

    use super::*;

    #[test]
    fn display_time_shifts_to_offset() {
        let at = datetime!(2025-03-06 17:05:03 UTC);
        assert_eq!(display_time(at, offset!(+8)), "2025/3/7 01:05:03");
        assert_eq!(display_time(at, UtcOffset::UTC), "2025/3/6 17:05:03");
    }
}
