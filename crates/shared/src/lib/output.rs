use std::fmt::{self, Write};

use alloy_primitives::utils::format_ether;
use alloy_primitives::U256;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Formats an 18-decimal ACE/bACE amount.
pub fn format_ace(amount: U256) -> String {
    format_ether(amount)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Section {
    pub title: Option<String>,
    pub entries: Vec<(String, Value)>,
}

impl Section {
    pub fn entry(&mut self, label: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.entries.push((label.into(), value.into()));
        self
    }

    pub fn get(&self, label: &str) -> Option<&Value> {
        self.entries.iter().find(|(l, _)| l == label).map(|(_, v)| v)
    }
}

fn plain_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_owned(),
        other => other.to_string(),
    }
}

impl Serialize for Section {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        struct Entries<'a>(&'a [(String, Value)]);
        impl Serialize for Entries<'_> {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for (label, value) in self.0 {
                    map.serialize_entry(label, value)?;
                }
                map.end()
            }
        }

        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("title", &self.title)?;
        map.serialize_entry("entries", &Entries(&self.entries))?;
        map.end()
    }
}

/// What a script reports back. Rendered either as console lines or JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ScriptOutput {
    pub sections: Vec<Section>,
}

impl ScriptOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(&mut self, title: impl Into<String>) -> &mut Section {
        self.sections.push(Section {
            title: Some(title.into()),
            entries: vec![],
        });
        self.last_section()
    }

    /// Section without a heading, printed as bare `- label: value` lines.
    pub fn untitled(&mut self) -> &mut Section {
        self.sections.push(Section::default());
        self.last_section()
    }

    fn last_section(&mut self) -> &mut Section {
        let idx = self.sections.len() - 1;
        &mut self.sections[idx]
    }

    pub fn find(&self, label: &str) -> Option<&Value> {
        self.sections.iter().find_map(|section| section.get(label))
    }

    pub fn render_plain(&self) -> String {
        self.to_string()
    }

    pub fn render_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for ScriptOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        for (idx, section) in self.sections.iter().enumerate() {
            if idx > 0 {
                out.push('\n');
            }
            if let Some(title) = &section.title {
                writeln!(out, "{title}")?;
            }
            for (label, value) in &section.entries {
                writeln!(out, "- {label}: {}", plain_value(value))?;
            }
        }
        f.write_str(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> ScriptOutput {
        let mut output = ScriptOutput::new();
        output.untitled().entry("address", "0xabc");
        output
            .section("Withdrawal queue")
            .entry("last request id", 12)
            .entry("unfinalized bACE", "1.5")
            .entry("ids", serde_json::json!([1, 2]));
        output
    }

    #[test]
    fn renders_console_lines() {
        let expected = "- address: 0xabc\n\nWithdrawal queue\n- last request id: 12\n- unfinalized bACE: 1.5\n- ids: [1,2]\n";
        assert_eq!(sample().render_plain(), expected);
    }

    #[test]
    fn renders_json_preserving_entry_order() {
        let rendered = sample().render_json().unwrap();
        let value: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value[1]["title"], "Withdrawal queue");
        assert_eq!(value[1]["entries"]["last request id"], 12);
        assert_eq!(value[0]["title"], Value::Null);
        let last_pos = rendered.find("last request id").unwrap();
        let unfinalized_pos = rendered.find("unfinalized bACE").unwrap();
        assert!(last_pos < unfinalized_pos);
    }

    #[test]
    fn find_searches_all_sections() {
        assert_eq!(sample().find("unfinalized bACE"), Some(&Value::from("1.5")));
        assert_eq!(sample().find("missing"), None);
    }

    #[test]
    fn formats_ace_amounts() {
        let one_and_half = U256::from(1_500_000_000_000_000_000u128);
        assert!(format_ace(one_and_half).starts_with("1.5"));
        assert!(format_ace(U256::ZERO).starts_with("0.0"));
    }
}
