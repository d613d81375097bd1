//! Tolerant parser for single-line action expressions like `verb(arg1, "arg 2", key=value)`

use crate::error::{Result, ScrapError};
use crate::tools::action::{Action, ActionKind, ExtractElementsParams, InteractParams, Interaction, NavigateParams};

/// Parse one action expression
pub fn parse_action(expression: &str) -> Result<Action> {
    let expression = expression.trim().trim_matches('`').trim();

    let open = expression
        .find('(')
        .ok_or_else(|| ScrapError::InvalidAction(format!("'{}' is not of the form verb(args)", expression)))?;
    if !expression.ends_with(')') {
        return Err(ScrapError::InvalidAction(format!("'{}' is missing the closing parenthesis", expression)));
    }

    let name = expression[..open].trim();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ScrapError::InvalidAction(format!("'{}' is not a valid action name", name)));
    }
    let name = name.to_ascii_lowercase();
    let kind = ActionKind::from_name(&name).ok_or(ScrapError::UnknownAction(name))?;

    let inner = &expression[open + 1..expression.len() - 1];
    let args = split_args(inner)?;
    if kind == ActionKind::EndNavigation {
        return Ok(Action::EndNavigation { payload: terminal_payload(inner) });
    }

    build(kind, bind(kind, args)?)
}

/// Split an argument list on top-level commas, respecting quotes and brackets.
///
/// A quote only opens a string at the start of an argument (or of a `key=` value)
/// or after punctuation inside brackets; anywhere else it is plain text, so
/// `It's 10 pounds` stays one bare argument.
pub fn split_args(inner: &str) -> Result<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut closed = false;
    let mut nested_quote = false;
    let mut depth: i32 = 0;

    for c in inner.chars() {
        if let Some(q) = quote {
            current.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
                closed = !nested_quote;
            }
            continue;
        }

        if c == ',' && depth == 0 {
            args.push(current.trim().to_string());
            current.clear();
            closed = false;
            continue;
        }
        if closed && !c.is_whitespace() {
            return Err(ScrapError::InvalidAction(format!("unexpected '{}' after quoted argument", c)));
        }

        match c {
            '\'' | '"' if depth == 0 && at_value_start(&current) => {
                quote = Some(c);
                nested_quote = false;
                current.push(c);
            }
            // Attribute values inside brackets, e.g. `a[href$=')']`
            '\'' | '"' if depth > 0 && !current.ends_with(|p: char| p.is_alphanumeric()) => {
                quote = Some(c);
                nested_quote = true;
                current.push(c);
            }
            '(' | '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' | '}' => {
                depth -= 1;
                if depth < 0 {
                    return Err(ScrapError::InvalidAction(
                        "unbalanced ')': write exactly one action per turn".to_string(),
                    ));
                }
                current.push(c);
            }
            _ => current.push(c),
        }
    }

    if quote.is_some() {
        return Err(ScrapError::InvalidAction("unterminated quoted argument".to_string()));
    }
    if depth != 0 {
        return Err(ScrapError::InvalidAction("unbalanced brackets in arguments".to_string()));
    }

    let last = current.trim();
    if !last.is_empty() || !args.is_empty() {
        args.push(last.to_string());
    }
    // A trailing comma leaves one empty argument behind
    if args.last().is_some_and(|a| a.is_empty()) {
        args.pop();
    }

    Ok(args)
}

/// Nothing but whitespace so far, or an identifier followed by `=`
fn at_value_start(current: &str) -> bool {
    let text = current.trim();
    match text.strip_suffix('=') {
        Some(key) => {
            let key = key.trim();
            !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => text.is_empty(),
    }
}

/// Strip the quotes of a fully quoted argument and resolve backslash escapes.
/// Anything else, including text whose opening quote closes early, is returned trimmed.
fn unquote(raw: &str) -> String {
    let raw = raw.trim();
    let mut chars = raw.chars();
    let Some(q @ ('\'' | '"')) = chars.next() else {
        return raw.to_string();
    };

    let mut out = String::with_capacity(raw.len());
    let mut escaped = false;
    for (offset, c) in chars.by_ref().enumerate() {
        if escaped {
            out.push(match c {
                'n' => '\n',
                't' => '\t',
                other => other,
            });
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == q {
            // The closing quote has to be the last character
            return if offset + 2 == raw.chars().count() { out } else { raw.to_string() };
        } else {
            out.push(c);
        }
    }
    raw.to_string()
}

/// The whole argument text of `end(...)`; a final answer is free text and is not split on commas
fn terminal_payload(inner: &str) -> Option<String> {
    let text = inner.trim();
    let text = match text.strip_prefix("payload").map(str::trim_start) {
        Some(rest) if rest.starts_with('=') => &rest[1..],
        _ => text,
    };
    let payload = unquote(text).trim().to_string();
    (!payload.is_empty()).then_some(payload)
}

/// Place positional and `key=value` arguments into the verb's parameter slots
fn bind(kind: ActionKind, args: Vec<String>) -> Result<Vec<Option<String>>> {
    let params = kind.params();
    let mut slots: Vec<Option<String>> = vec![None; params.len()];
    let mut next_positional = 0;

    for raw in args {
        if let Some((key, value)) = keyword(&raw, params) {
            let index = params.iter().position(|p| *p == key).unwrap_or_default();
            slots[index] = Some(unquote(value));
            continue;
        }

        while next_positional < slots.len() && slots[next_positional].is_some() {
            next_positional += 1;
        }
        if next_positional >= slots.len() {
            return Err(ScrapError::InvalidAction(format!(
                "too many arguments for {}, expected {}",
                kind.name(),
                kind.signature()
            )));
        }
        slots[next_positional] = Some(unquote(&raw));
        next_positional += 1;
    }

    Ok(slots)
}

/// Recognize `name=value` where `name` is one of the verb's parameters
fn keyword<'a>(raw: &'a str, params: &[&str]) -> Option<(&'a str, &'a str)> {
    let (key, value) = raw.split_once('=')?;
    let key = key.trim();
    if params.contains(&key) && !value.starts_with('=') { Some((key, value)) } else { None }
}

fn parse_bool(kind: ActionKind, name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(ScrapError::InvalidAction(format!("{}: '{}' expects a boolean, got '{}'", kind.name(), name, other))),
    }
}

fn parse_limit(kind: ActionKind, value: &str) -> Result<usize> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|_| ScrapError::InvalidAction(format!("{}: 'limit' expects a number, got '{}'", kind.name(), value)))
}

fn required(kind: ActionKind, name: &str, slot: Option<String>) -> Result<String> {
    slot.filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ScrapError::InvalidAction(format!("{} requires '{}': {}", kind.name(), name, kind.signature())))
}

fn build(kind: ActionKind, slots: Vec<Option<String>>) -> Result<Action> {
    let mut slots = slots.into_iter();
    let mut next = move || slots.next().flatten();

    match kind {
        ActionKind::ExtractElements => {
            let mut params = ExtractElementsParams::new(required(kind, "selector", next())?);
            if let Some(truncate) = next() {
                params.truncate = parse_bool(kind, "truncate", &truncate)?;
            }
            if let Some(limit) = next() {
                params.limit = parse_limit(kind, &limit)?;
            }
            if let Some(compact) = next() {
                params.compact = parse_bool(kind, "compact", &compact)?;
            }
            Ok(Action::ExtractElements(params))
        }
        ActionKind::InteractWithElement => {
            let selector = required(kind, "selector", next())?;
            let interaction = Interaction::parse(&required(kind, "interaction", next())?);
            let text = next().unwrap_or_default();
            Ok(Action::InteractWithElement(InteractParams { selector, interaction, text }))
        }
        ActionKind::PrintPage => Ok(Action::PrintPage),
        ActionKind::PageSummary => Ok(Action::PageSummary),
        ActionKind::Navigate => Ok(Action::Navigate(NavigateParams { url: required(kind, "url", next())? })),
        ActionKind::EndNavigation => Ok(Action::EndNavigation { payload: next().filter(|p| !p.trim().is_empty()) }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quoted_and_unquoted() {
        let quoted = parse_action("extract_elements('li.item', False, 10, True)").unwrap();
        let unquoted = parse_action("extract_elements(li.item, false, 10, true)").unwrap();

        let expected = Action::ExtractElements(ExtractElementsParams::new("li.item").truncate(false).limit(10).compact(true));
        assert_eq!(quoted, expected);
        assert_eq!(unquoted, expected);
    }

    #[test]
    fn test_parse_defaults_for_missing_args() {
        let action = parse_action("extract_elements(\"#missing\")").unwrap();
        assert_eq!(action, Action::ExtractElements(ExtractElementsParams::new("#missing")));
    }

    #[test]
    fn test_parse_keyword_args() {
        let action = parse_action("extract_elements(selector='a', limit=5)").unwrap();
        assert_eq!(action, Action::ExtractElements(ExtractElementsParams::new("a").limit(5)));
    }

    #[test]
    fn test_parse_selector_with_commas_and_equals() {
        let action = parse_action(r#"interact_with_element("input[name='q'], #search", fill, "red, blue")"#).unwrap();
        assert_eq!(
            action,
            Action::InteractWithElement(InteractParams {
                selector: "input[name='q'], #search".to_string(),
                interaction: Interaction::Fill,
                text: "red, blue".to_string(),
            })
        );

        let action = parse_action("interact_with_element(a:is(.x, .y), click)").unwrap();
        match action {
            Action::InteractWithElement(params) => assert_eq!(params.selector, "a:is(.x, .y)"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_navigate_and_terminals() {
        assert_eq!(
            parse_action("navigate(\"http://ex.test/b\")").unwrap(),
            Action::Navigate(NavigateParams { url: "http://ex.test/b".to_string() })
        );
        assert_eq!(parse_action("end_navigation()").unwrap(), Action::EndNavigation { payload: None });
        assert_eq!(
            parse_action("end('three books, all sci-fi')").unwrap(),
            Action::EndNavigation { payload: Some("three books, all sci-fi".to_string()) }
        );
        assert_eq!(parse_action("`page_summary()`").unwrap(), Action::PageSummary);
    }

    #[test]
    fn test_parse_escapes() {
        let action = parse_action(r#"interact_with_element('#q', 'fill', 'it\'s "ok"')"#).unwrap();
        match action {
            Action::InteractWithElement(params) => assert_eq!(params.text, "it's \"ok\""),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_apostrophes_in_bare_arguments() {
        assert_eq!(
            parse_action("end_navigation(It's 10 pounds)").unwrap(),
            Action::EndNavigation { payload: Some("It's 10 pounds".to_string()) }
        );

        let action = parse_action("interact_with_element(#q, fill, men's shoes)").unwrap();
        match action {
            Action::InteractWithElement(params) => assert_eq!(params.text, "men's shoes"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_quotes_inside_bare_selectors() {
        let action = parse_action("interact_with_element(a[href$=')'], click)").unwrap();
        match action {
            Action::InteractWithElement(params) => assert_eq!(params.selector, "a[href$=')']"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_terminal_payload_is_not_split() {
        assert_eq!(
            parse_action("end(three books, all sci-fi)").unwrap(),
            Action::EndNavigation { payload: Some("three books, all sci-fi".to_string()) }
        );
        assert_eq!(
            parse_action("end_navigation(payload=\"done\")").unwrap(),
            Action::EndNavigation { payload: Some("done".to_string()) }
        );
        assert_eq!(parse_action("end_navigation('  ')").unwrap(), Action::EndNavigation { payload: None });
    }

    #[test]
    fn test_two_actions_on_one_line_are_rejected() {
        let err = parse_action("navigate('http://ex.test/a'); navigate('http://ex.test/b')").unwrap_err();
        assert!(matches!(err, ScrapError::InvalidAction(_)));
        assert!(matches!(parse_action("page_summary(); print_page()"), Err(ScrapError::InvalidAction(_))));
        assert!(matches!(parse_action("end(done); navigate(x)"), Err(ScrapError::InvalidAction(_))));
    }

    #[test]
    fn test_unquote_only_strips_a_full_quote() {
        assert_eq!(unquote("'a'"), "a");
        assert_eq!(unquote("'a' and 'b'"), "'a' and 'b'");
        assert_eq!(unquote("'"), "'");
    }

    #[test]
    fn test_unknown_verb() {
        let err = parse_action("scroll(100)").unwrap_err();
        assert!(matches!(err, ScrapError::UnknownAction(name) if name == "scroll"));
    }

    #[test]
    fn test_malformed_expressions() {
        assert!(matches!(parse_action("just some words"), Err(ScrapError::InvalidAction(_))));
        assert!(matches!(parse_action("navigate('http://x'"), Err(ScrapError::InvalidAction(_))));
        assert!(matches!(parse_action("navigate('http://x)"), Err(ScrapError::InvalidAction(_))));
        assert!(matches!(parse_action("navigate()"), Err(ScrapError::InvalidAction(_))));
        assert!(matches!(parse_action("print_page(1)"), Err(ScrapError::InvalidAction(_))));
        assert!(matches!(parse_action("extract_elements(a, maybe)"), Err(ScrapError::InvalidAction(_))));
    }

    #[test]
    fn test_split_args() {
        assert_eq!(split_args("").unwrap(), Vec::<String>::new());
        assert_eq!(split_args(" a , 'b,c' ,").unwrap(), vec!["a", "'b,c'"]);
        assert_eq!(split_args("''").unwrap(), vec!["''"]);
    }
}
