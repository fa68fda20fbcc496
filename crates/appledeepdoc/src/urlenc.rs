use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Conservative query escaping: unreserved characters and `/` pass through.
const QUERY_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

pub(crate) fn encode_query(raw: &str) -> String {
    utf8_percent_encode(raw, QUERY_SET).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spaces_and_reserved_characters_are_escaped() {
        assert_eq!(encode_query("async await"), "async%20await");
        assert_eq!(encode_query("Int128?"), "Int128%3F");
        assert_eq!(encode_query("a/b-c_d.e~f"), "a/b-c_d.e~f");
    }
}
