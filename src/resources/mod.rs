//! Named resources: styles, symbol libraries, element matches and the string table.

mod library;
mod matcher;
mod strings;
mod style;

pub use library::{Library, Symbol};
pub use matcher::{LAYER_SEPARATOR, Match, Matches};
pub use strings::Strings;
pub use style::{Style, format_declarations, parse_declarations};
