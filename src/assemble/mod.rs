pub mod aggregator;
pub mod range;
pub mod separator;

pub use aggregator::Aggregator;
pub use range::parse_page_range;
pub use separator::Separator;
