//! Minimal extraction of notice text from rendered verification pages.
//! The pages are small WeUI documents with at most one message block,
//! so a full HTML parser is not needed; a class-marker scan is enough.

use crate::model::PageNotice;

const TITLE_TAG: &str = "h2";
const TITLE_CLASS: &str = "weui-msg__title";
const DESC_TAG: &str = "p";
const DESC_CLASS: &str = "weui-msg__desc";

/// Pulls the notice title and description out of a rendered page.
/// Missing elements yield empty strings.
pub fn extract_notice(html: &str) -> PageNotice {
    PageNotice {
        title: extract_class_text(html, TITLE_TAG, TITLE_CLASS).unwrap_or_default(),
        description: extract_class_text(html, DESC_TAG, DESC_CLASS).unwrap_or_default(),
    }
}

/// Text content of the first `tag` element carrying `class`, with inner
/// markup stripped, entities decoded and whitespace collapsed.
pub fn extract_class_text(html: &str, tag: &str, class: &str) -> Option<String> {
    let inner = find_element(html, tag, class)?;
    Some(collapse_whitespace(&decode_entities(&strip_tags(inner))))
}

fn find_element<'a>(html: &'a str, tag: &str, class: &str) -> Option<&'a str> {
    let open = format!("<{tag}");
    let close = format!("</{tag}");
    let mut pos = 0;
    while let Some(rel) = html[pos..].find(&open) {
        let start = pos + rel;
        let after_name = start + open.len();
        let rest = &html[after_name..];
        // Reject prefix matches such as <pre> when scanning for <p>.
        let next = rest.chars().next()?;
        if !(next.is_whitespace() || next == '>') {
            pos = after_name;
            continue;
        }
        let tag_end = rest.find('>')?;
        let attrs = &html[after_name..after_name + tag_end];
        let content_start = after_name + tag_end + 1;
        let class_matches = attr_value(attrs, "class")
            .map(|value| has_class_token(value, class))
            .unwrap_or(false);
        if !class_matches {
            pos = content_start;
            continue;
        }
        let content = &html[content_start..];
        let end = find_closing(content, &close)?;
        return Some(&content[..end]);
    }
    None
}

fn find_closing(content: &str, close: &str) -> Option<usize> {
    let mut search = 0;
    loop {
        let rel = content[search..].find(close)?;
        let at = search + rel;
        match content[at + close.len()..].chars().next() {
            Some('>') => return Some(at),
            Some(c) if c.is_whitespace() => return Some(at),
            None => return None,
            _ => search = at + close.len(),
        }
    }
}

fn attr_value<'a>(attrs: &'a str, name: &str) -> Option<&'a str> {
    let mut pos = 0;
    while let Some(rel) = attrs[pos..].find(name) {
        let at = pos + rel;
        let preceded_by_space = attrs[..at]
            .chars()
            .next_back()
            .map(|c| c.is_whitespace())
            .unwrap_or(false);
        let rest = &attrs[at + name.len()..];
        if preceded_by_space {
            if let Some(value) = rest.strip_prefix('=') {
                let mut chars = value.chars();
                if let Some(quote @ ('"' | '\'')) = chars.next() {
                    let inner = chars.as_str();
                    let end = inner.find(quote)?;
                    return Some(&inner[..end]);
                }
            }
        }
        pos = at + name.len();
    }
    None
}

fn has_class_token(attr: &str, class: &str) -> bool {
    attr.split_whitespace().any(|token| token == class)
}

fn strip_tags(inner: &str) -> String {
    let mut result = String::with_capacity(inner.len());
    let mut in_tag = false;
    for ch in inner.chars() {
        if ch == '<' {
            in_tag = true;
        } else if ch == '>' {
            in_tag = false;
        } else if !in_tag {
            result.push(ch);
        }
    }
    result
}

fn decode_entities(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '&' {
            result.push(ch);
            continue;
        }
        let mut entity = String::new();
        let mut terminated = false;
        while let Some(&next) = chars.peek() {
            if next == ';' {
                chars.next();
                terminated = true;
                break;
            }
            if entity.len() >= 10 {
                break;
            }
            entity.push(next);
            chars.next();
        }
        if !terminated {
            result.push('&');
            result.push_str(&entity);
            continue;
        }
        match entity.as_str() {
            "amp" => result.push('&'),
            "lt" => result.push('<'),
            "gt" => result.push('>'),
            "quot" => result.push('"'),
            "apos" => result.push('\''),
            "nbsp" => result.push(' '),
            _ => match entity
                .strip_prefix('#')
                .and_then(decode_numeric_entity)
            {
                Some(decoded) => result.push(decoded),
                None => {
                    result.push('&');
                    result.push_str(&entity);
                    result.push(';');
                }
            },
        }
    }
    result
}

fn decode_numeric_entity(digits: &str) -> Option<char> {
    let code = if let Some(hex) = digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse::<u32>().ok()?
    };
    char::from_u32(code)
}

fn collapse_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut last_was_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !last_was_space && !result.is_empty() {
                result.push(' ');
            }
            last_was_space = true;
        } else {
            result.push(ch);
            last_was_space = false;
        }
    }
    result.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BAN_PAGE: &str = r#"
<html><body>
  <div class="weui-msg">
    <div class="weui-msg__icon-area"><i class="weui-icon-warn weui-icon_msg"></i></div>
    <div class="weui-msg__text-area">
      <h2 class="weui-msg__title">账号已被永久封禁</h2>
      <p class="weui-msg__desc">由于违反相关规定，该小程序已被停止服务</p>
    </div>
  </div>
</body></html>
"#;

    #[test]
    fn extracts_title_and_description() {
        let notice = extract_notice(BAN_PAGE);
        assert_eq!(notice.title, "账号已被永久封禁");
        assert_eq!(notice.description, "由于违反相关规定，该小程序已被停止服务");
    }

    #[test]
    fn missing_title_yields_empty_string() {
        let html = r#"<div><p class="weui-msg__desc">仅有描述</p></div>"#;
        let notice = extract_notice(html);
        assert_eq!(notice.title, "");
        assert_eq!(notice.description, "仅有描述");
    }

    #[test]
    fn missing_description_yields_empty_string() {
        let html = r#"<h2 class="weui-msg__title">一切正常</h2>"#;
        let notice = extract_notice(html);
        assert_eq!(notice.title, "一切正常");
        assert_eq!(notice.description, "");
    }

    #[test]
    fn plain_page_without_markers_yields_blank_notice() {
        let notice = extract_notice("<html><body><h1>hello</h1></body></html>");
        assert_eq!(notice, PageNotice::default());
    }

    #[test]
    fn extra_classes_on_the_element_still_match() {
        let html = r#"<h2 class="weui-msg__title warn-strong">维护中</h2>"#;
        assert_eq!(
            extract_class_text(html, "h2", "weui-msg__title").as_deref(),
            Some("维护中")
        );
    }

    #[test]
    fn class_token_is_matched_whole_not_as_prefix() {
        let html = r#"<h2 class="weui-msg__title-alt">别的标题</h2>"#;
        assert_eq!(extract_class_text(html, "h2", "weui-msg__title"), None);
    }

    #[test]
    fn first_matching_element_wins_over_later_ones() {
        let html = concat!(
            r#"<h2 class="other">ignored</h2>"#,
            r#"<h2 class="weui-msg__title">第一个</h2>"#,
            r#"<h2 class="weui-msg__title">第二个</h2>"#,
        );
        assert_eq!(
            extract_class_text(html, "h2", "weui-msg__title").as_deref(),
            Some("第一个")
        );
    }

    #[test]
    fn tag_prefix_does_not_match_longer_tag_names() {
        let html = concat!(
            r#"<pre class="weui-msg__desc">not this</pre>"#,
            r#"<p class="weui-msg__desc">this one</p>"#,
        );
        assert_eq!(
            extract_class_text(html, "p", "weui-msg__desc").as_deref(),
            Some("this one")
        );
    }

    #[test]
    fn inner_markup_is_stripped() {
        let html = r#"<h2 class="weui-msg__title">该账号<span>已被封禁</span></h2>"#;
        assert_eq!(
            extract_class_text(html, "h2", "weui-msg__title").as_deref(),
            Some("该账号已被封禁")
        );
    }

    #[test]
    fn whitespace_is_collapsed_and_trimmed() {
        let html = "<h2 class=\"weui-msg__title\">\n    账号异常\n    请联系客服\n  </h2>";
        assert_eq!(
            extract_class_text(html, "h2", "weui-msg__title").as_deref(),
            Some("账号异常 请联系客服")
        );
    }

    #[test]
    fn single_quoted_class_attribute_is_accepted() {
        let html = "<h2 class='weui-msg__title'>账号异常</h2>";
        assert_eq!(
            extract_class_text(html, "h2", "weui-msg__title").as_deref(),
            Some("账号异常")
        );
    }

    #[test]
    fn unclosed_element_is_treated_as_absent() {
        let html = r#"<h2 class="weui-msg__title">没有结束标签"#;
        assert_eq!(extract_class_text(html, "h2", "weui-msg__title"), None);
    }

    #[test]
    fn named_and_numeric_entities_are_decoded() {
        assert_eq!(decode_entities("A &amp; B"), "A & B");
        assert_eq!(decode_entities("&lt;tag&gt;"), "<tag>");
        assert_eq!(decode_entities("&#20851;&#x95ED;"), "关闭");
        assert_eq!(decode_entities("a&nbsp;b"), "a b");
    }

    #[test]
    fn bare_ampersand_survives_decoding() {
        assert_eq!(decode_entities("AT&T"), "AT&T");
        assert_eq!(decode_entities("&unknown;"), "&unknown;");
    }
}
