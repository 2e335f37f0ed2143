pub mod markdown;
pub mod wikilink;

pub use markdown::{anchor_slug, parse, parse_list_items, parse_sections, parse_table_rows, ParsedDocument};
pub use wikilink::{parse_wikilinks, WikiLink};
