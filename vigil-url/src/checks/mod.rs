// URL checks
//
// Each check inspects a tokenized URL and appends findings. Checks are
// independent of each other; the classifier runs them in a fixed order and
// sorts the combined findings afterwards.

mod brand;
mod encoding;
mod host;
mod payload;
mod scheme;
mod structure;

pub use brand::BrandCheck;
pub use encoding::EncodingCheck;
pub use host::HostCheck;
pub use payload::{LengthCheck, PayloadCheck};
pub use scheme::SchemeCheck;
pub use structure::{GrammarCheck, PortCheck};

use crate::finding::AnomalyFlag;
use crate::lexer::UrlComponents;

/// A single classification rule over URL components
pub trait UrlCheck: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Append findings for `url`
    fn inspect(&self, url: &UrlComponents<'_>, findings: &mut Vec<AnomalyFlag>);
}

/// Render a character for a reason message
pub(crate) fn describe_char(c: char) -> String {
    if c.is_control() || c.is_whitespace() {
        format!("U+{:04X}", c as u32)
    } else {
        format!("'{}' (U+{:04X})", c, c as u32)
    }
}
