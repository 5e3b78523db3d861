//! Compiles template patterns into anchored regexes.
//!
//! A pattern is literal text with `{slot}` references. Literals are
//! escaped, literal whitespace runs match any whitespace, and each slot
//! reference becomes a named capture group with the body of its declared
//! slot type. The whole regex is case-insensitive and anchored at both
//! ends, with trailing sentence punctuation tolerated.

use crate::templates::{SlotSpec, TemplateError};
use regex::Regex;
use std::collections::HashMap;

/// Compiles one pattern against the template's slot declarations.
///
/// Only `{name}` with word characters inside counts as a slot reference;
/// any other brace usage is literal text. A referenced slot without a
/// declaration rejects the whole template file.
pub fn compile_pattern(
	pattern: &str,
	slots: &HashMap<String, SlotSpec>,
) -> Result<Regex, TemplateError> {
	let mut source = String::from(r"(?i)^\s*");
	let mut literal = String::new();
	let mut rest = pattern;

	while let Some(open) = rest.find('{') {
		let after = &rest[open + 1..];
		match slot_reference(after) {
			Some((name, consumed)) => {
				literal.push_str(&rest[..open]);
				push_literal(&mut source, &literal);
				literal.clear();

				let slot = slots.get(name).ok_or_else(|| {
					TemplateError::Invalid(format!("slot_not_defined:{}", name))
				})?;
				source.push_str(&format!(
					r"\s*(?P<{}>{})\s*",
					name,
					slot.slot_type.pattern_body()
				));
				rest = &after[consumed..];
			}
			None => {
				literal.push_str(&rest[..open + 1]);
				rest = after;
			}
		}
	}
	literal.push_str(rest);
	push_literal(&mut source, &literal);

	source.push_str(r"\s*[.!?。！？]*\s*$");
	Regex::new(&source)
		.map_err(|e| TemplateError::Invalid(format!("bad_pattern:{}: {}", pattern, e)))
}

/// Parses a slot name directly after an opening brace.
///
/// Returns the name and how many bytes to consume (name plus the closing
/// brace), or `None` when the brace does not open a well-formed reference.
fn slot_reference(after: &str) -> Option<(&str, usize)> {
	let end = after
		.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
		.unwrap_or(after.len());
	if end == 0 || !after[end..].starts_with('}') {
		return None;
	}
	Some((&after[..end], end + 1))
}

/// Escapes literal text, collapsing whitespace runs to `\s+`.
fn push_literal(source: &mut String, literal: &str) {
	let mut pending_space = false;
	for c in literal.chars() {
		if c.is_whitespace() {
			pending_space = true;
			continue;
		}
		if pending_space {
			source.push_str(r"\s+");
			pending_space = false;
		}
		let mut buf = [0u8; 4];
		source.push_str(&regex::escape(c.encode_utf8(&mut buf)));
	}
	if pending_space {
		source.push_str(r"\s+");
	}
}
