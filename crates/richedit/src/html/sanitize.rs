// Copyright 2024 richedit contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! HTML sanitization policy: the allow/deny lists applied at parse (input) and
//! serialize (output) time.

/// Elements dropped entirely, attributes and all, on input.
pub const FORBIDDEN_ELEMENTS: &[&str] = &[
    "script", "iframe", "object", "embed", "form", "input", "button", "select", "textarea",
    "link", "meta", "base", "applet",
];

/// Attributes whose value is a URL and therefore subject to scheme
/// checking.
pub const URL_ATTRS: &[&str] = &["href", "src", "action", "formaction", "data", "codebase"];

/// Style declarations preserved on input; anything else is dropped.
pub const STYLE_ALLOWLIST: &[&str] = &[
    "color",
    "background-color",
    "font-size",
    "font-family",
    "text-align",
    "line-height",
    "text-decoration",
    "font-weight",
    "font-style",
    "vertical-align",
    "margin-left",
];

pub fn is_forbidden_element(tag: &str) -> bool {
    FORBIDDEN_ELEMENTS.contains(&tag)
}

pub fn is_event_handler_attr(name: &str) -> bool {
    name.len() > 2 && name.as_bytes()[0].eq_ignore_ascii_case(&b'o') && name.as_bytes()[1].eq_ignore_ascii_case(&b'n')
}

/// Decodes HTML-entity and hex/dec numeric character references so the
/// scheme check below can't be bypassed by e.g. `&#106;avascript:`.
fn decode_for_scheme_check(value: &str) -> String {
    html_escape::decode_html_entities(value).to_string()
}

fn url_scheme(value: &str) -> String {
    let decoded = decode_for_scheme_check(value);
    let trimmed = decoded.trim_start();
    trimmed
        .split_once(':')
        .map(|(scheme, _)| scheme.trim().to_ascii_lowercase())
        .unwrap_or_default()
}

/// True if `attr_name=value` on `tag` resolves to a scheme this engine refuses
/// to emit into the live DOM.
pub fn is_dangerous_url(tag: &str, attr_name: &str, value: &str) -> bool {
    if !URL_ATTRS.contains(&attr_name) {
        return false;
    }
    let decoded = decode_for_scheme_check(value);
    let trimmed = decoded.trim_start();
    let lower = trimmed.to_ascii_lowercase();
    if tag == "img" && attr_name == "src" && lower.starts_with("data:image/") {
        return false;
    }
    let scheme = url_scheme(value);
    scheme == "javascript" || scheme == "vbscript" || lower.starts_with("data:text/html")
}

/// Filters a `style` attribute value down to the declarations on
/// [`STYLE_ALLOWLIST`], preserving their relative order.
pub fn sanitize_style(value: &str) -> Option<String> {
    let kept: Vec<String> = value
        .split(';')
        .filter_map(|decl| {
            let (prop, val) = decl.split_once(':')?;
            let prop = prop.trim().to_ascii_lowercase();
            if STYLE_ALLOWLIST.contains(&prop.as_str()) {
                Some(format!("{prop}:{}", val.trim()))
            } else {
                None
            }
        })
        .collect();
    if kept.is_empty() {
        None
    } else {
        Some(kept.join(";"))
    }
}

/// Full input sanitization of one element's attribute list: strips `on*`
/// handlers, dangerous URLs, and filters `style` to the allow list. Forbidden
/// elements are dropped by the caller before attributes are even considered.
pub fn sanitize_attrs_input(tag: &str, attrs: Vec<(String, String)>) -> Vec<(String, String)> {
    attrs
        .into_iter()
        .filter_map(|(name, value)| {
            let lower = name.to_ascii_lowercase();
            if is_event_handler_attr(&lower) {
                return None;
            }
            if is_dangerous_url(tag, &lower, &value) {
                return None;
            }
            if lower == "style" {
                return sanitize_style(&value).map(|v| (name, v));
            }
            Some((name, value))
        })
        .collect()
}

/// Output sanitization: lighter than input — strips `on*` attributes and
/// dangerous URL schemes but otherwise preserves structure and style verbatim.
pub fn sanitize_attrs_output(tag: &str, attrs: Vec<(String, String)>) -> Vec<(String, String)> {
    attrs
        .into_iter()
        .filter(|(name, value)| {
            let lower = name.to_ascii_lowercase();
            !is_event_handler_attr(&lower) && !is_dangerous_url(tag, &lower, value)
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn forbidden_elements_are_recognized() {
        assert!(is_forbidden_element("script"));
        assert!(is_forbidden_element("iframe"));
        assert!(!is_forbidden_element("p"));
    }

    #[test]
    fn event_handler_attrs_are_dropped() {
        let out = sanitize_attrs_input("div", vec![("onclick".to_string(), "alert(1)".to_string())]);
        assert!(out.is_empty());
    }

    #[test]
    fn javascript_scheme_is_blocked() {
        assert!(is_dangerous_url("a", "href", "javascript:alert(1)"));
        assert!(is_dangerous_url(
            "a",
            "href",
            "&#106;avascript:alert(1)"
        ));
    }

    #[test]
    fn data_image_on_img_src_is_allowed() {
        assert!(!is_dangerous_url("img", "src", "data:image/png;base64,AAAA"));
        assert!(is_dangerous_url("iframe", "src", "data:text/html,<script>"));
    }

    #[test]
    fn style_allowlist_filters_unknown_properties() {
        let kept = sanitize_style("color: red; position: absolute; font-weight: bold").unwrap();
        assert_eq!(kept, "color:red;font-weight:bold");
    }

    #[test]
    fn style_with_only_unknown_properties_is_dropped() {
        assert_eq!(sanitize_style("position: absolute"), None);
    }
}
