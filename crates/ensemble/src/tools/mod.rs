//! External data tools for the assistants.
//!
//! Every tool follows one contract: upstream failures (transport errors,
//! rate limits, empty payloads) are reported as human-readable sentinel
//! strings in the `Ok` value so the calling model can relay them, and
//! the process never crashes on a tool failure.

mod html;
mod market_data;
mod page_fetch;
mod web_search;

pub use market_data::MarketDataTool;
pub use page_fetch::KeyStatisticsTool;
pub use web_search::WebSearchTool;
