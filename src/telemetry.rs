//! Pipeline counters, recorded through the `metrics` facade when the
//! `metrics` feature is enabled and compiled out otherwise.

use crate::core::Error;

#[cfg(feature = "metrics")]
pub(crate) fn page_fetched(items: usize) {
    ::metrics::counter!("pagestream_pages_fetched_total").increment(1);
    ::metrics::counter!("pagestream_items_fetched_total").increment(items as u64);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn page_fetched(_items: usize) {}

#[cfg(feature = "metrics")]
pub(crate) fn item_emitted() {
    ::metrics::counter!("pagestream_items_emitted_total").increment(1);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn item_emitted() {}

#[cfg(feature = "metrics")]
pub(crate) fn error_recorded(error: &Error) {
    ::metrics::counter!("pagestream_errors_total", "kind" => error.kind()).increment(1);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn error_recorded(_error: &Error) {}
