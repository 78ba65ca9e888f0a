#[macro_export]
macro_rules! include_res {
    (bytes, $p:expr) => {
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
    (str, $p:expr) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
}

/// Escapes text for both element bodies and attribute values. Braces are
/// escaped too so visitor text can never look like a template placeholder.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
        .replace('{', "&#123;")
        .replace('}', "&#125;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_and_placeholders() {
        assert_eq!(
            escape_html(r#"<b a="1">{name} & 'x'</b>"#),
            "&lt;b a=&quot;1&quot;&gt;&#123;name&#125; &amp; &#39;x&#39;&lt;/b&gt;"
        );
    }
}
