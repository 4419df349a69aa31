pub mod headers;
pub mod values;

pub use headers::{headers_from_create, inline_headers, synthesized_headers, values_fragment};
pub use values::{format_row_tuple, split_value_rows};
