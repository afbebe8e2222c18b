use kmo_types::{Error, Result};

/// Base SQL skeleton with `{slot}` placeholders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub id: &'static str,
    pub text: &'static str,
}

fn is_slot_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

/// Split `text` into literal runs and slot names, in order.
fn tokens(text: &str) -> Vec<Token<'_>> {
    let mut out = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) if is_slot_name(&after[..close]) => {
                out.push(Token::Literal(&rest[..open]));
                out.push(Token::Slot(&after[..close]));
                rest = &after[close + 1..];
            }
            _ => {
                out.push(Token::Literal(&rest[..=open]));
                rest = after;
            }
        }
    }
    out.push(Token::Literal(rest));
    out
}

enum Token<'a> {
    Literal(&'a str),
    Slot(&'a str),
}

impl Template {
    pub const fn new(id: &'static str, text: &'static str) -> Self {
        Self { id, text }
    }

    /// Slot names in order of appearance (duplicates kept).
    pub fn slots(&self) -> Vec<&'static str> {
        tokens(self.text)
            .into_iter()
            .filter_map(|t| match t {
                Token::Slot(name) => Some(name),
                Token::Literal(_) => None,
            })
            .collect()
    }

    /// Substitute every slot. Missing or unknown slot names are composition defects.
    pub fn render(&self, slots: &[(&str, &str)]) -> Result<String> {
        let declared = self.slots();
        if let Some((unknown, _)) = slots
            .iter()
            .find(|(name, _)| !declared.iter().any(|d| d == name))
        {
            return Err(Error::Template(format!(
                "template '{}' has no slot '{}'",
                self.id, unknown
            )));
        }

        let mut out = String::with_capacity(self.text.len());
        for token in tokens(self.text) {
            match token {
                Token::Literal(text) => out.push_str(text),
                Token::Slot(name) => {
                    let (_, value) = slots.iter().find(|(n, _)| *n == name).ok_or_else(|| {
                        Error::Template(format!(
                            "slot '{}' of template '{}' was not filled",
                            name, self.id
                        ))
                    })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_fills_slots() {
        let template = Template::new("t", "SELECT {projection}\nFROM x\n{filter}");
        let text = template
            .render(&[("projection", "a, b"), ("filter", "WHERE a = 1")])
            .unwrap();
        assert_eq!(text, "SELECT a, b\nFROM x\nWHERE a = 1");
    }

    #[test]
    fn test_render_with_empty_fragment() {
        let template = Template::new("t", "WHERE 1 = 1\n\t{filter}\nORDER BY 1");
        let text = template.render(&[("filter", "")]).unwrap();
        assert_eq!(text, "WHERE 1 = 1\n\t\nORDER BY 1");
    }

    #[test]
    fn test_non_slot_braces_are_literal() {
        let template = Template::new("t", "SELECT '{ not a slot }', '{X}' {s}");
        assert_eq!(template.slots(), vec!["s"]);
        let text = template.render(&[("s", "1")]).unwrap();
        assert_eq!(text, "SELECT '{ not a slot }', '{X}' 1");
    }

    #[test]
    fn test_missing_slot_is_an_error() {
        let template = Template::new("t", "SELECT {projection}");
        let err = template.render(&[]).unwrap_err();
        assert!(err.to_string().contains("slot 'projection'"));
    }

    #[test]
    fn test_unknown_slot_is_an_error() {
        let template = Template::new("t", "SELECT 1");
        let err = template.render(&[("typo", "x")]).unwrap_err();
        assert!(err.to_string().contains("has no slot 'typo'"));
    }
}
