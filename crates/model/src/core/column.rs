use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt, str::FromStr};

/// Declared kind of a generated column.
///
/// The kind is carried through the run and shown to the user, but values are
/// always produced and stored as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    #[default]
    String,
    Number,
    Date,
    Boolean,
    Other(String),
}

impl ValueKind {
    pub fn as_str(&self) -> &str {
        match self {
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Date => "date",
            ValueKind::Boolean => "boolean",
            ValueKind::Other(hint) => hint,
        }
    }
}

impl FromStr for ValueKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "" | "string" | "text" | "str" => ValueKind::String,
            "number" | "numeric" | "int" | "float" => ValueKind::Number,
            "date" | "datetime" => ValueKind::Date,
            "bool" | "boolean" => ValueKind::Boolean,
            _ => ValueKind::Other(s.trim().to_string()),
        };
        Ok(kind)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column the pipeline must produce for every row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ValueKind,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::String)
    }
}

/// Parses `"country, risk:number"` into ordered column specs.
///
/// A missing type hint defaults to [`ValueKind::String`].
pub fn parse_column_specs(input: &str) -> Result<Vec<ColumnSpec>, ModelError> {
    if input.trim().is_empty() {
        return Err(ModelError::NoColumns);
    }

    let mut specs = Vec::new();
    let mut seen = HashSet::new();

    for (position, part) in input.split(',').enumerate() {
        let (name, kind) = match part.split_once(':') {
            Some((name, hint)) => (name.trim(), hint.parse().unwrap_or_default()),
            None => (part.trim(), ValueKind::String),
        };

        if name.is_empty() {
            return Err(ModelError::EmptyColumnName { position });
        }
        if !seen.insert(name.to_string()) {
            return Err(ModelError::DuplicateColumn(name.to_string()));
        }

        specs.push(ColumnSpec::new(name, kind));
    }

    Ok(specs)
}

/// Rejects target columns that would shadow an input header.
pub fn ensure_new_columns(specs: &[ColumnSpec], headers: &[String]) -> Result<(), ModelError> {
    if specs.is_empty() {
        return Err(ModelError::NoColumns);
    }

    match specs
        .iter()
        .find(|spec| headers.iter().any(|h| h == &spec.name))
    {
        Some(spec) => Err(ModelError::ColumnExists(spec.name.clone())),
        None => Ok(()),
    }
}

pub fn column_names(specs: &[ColumnSpec]) -> Vec<String> {
    specs.iter().map(|s| s.name.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_type_hints() {
        let specs = parse_column_specs("country, risk_level:number ,visited: date").unwrap();
        assert_eq!(
            specs,
            vec![
                ColumnSpec::new("country", ValueKind::String),
                ColumnSpec::new("risk_level", ValueKind::Number),
                ColumnSpec::new("visited", ValueKind::Date),
            ]
        );
    }

    #[test]
    fn keeps_unknown_hints_verbatim() {
        let specs = parse_column_specs("code:iso3166").unwrap();
        assert_eq!(specs[0].kind, ValueKind::Other("iso3166".into()));
        assert_eq!(specs[0].kind.to_string(), "iso3166");
    }

    #[test]
    fn rejects_empty_and_duplicate_names() {
        assert_eq!(
            parse_column_specs("a,,b"),
            Err(ModelError::EmptyColumnName { position: 1 })
        );
        assert_eq!(
            parse_column_specs("a, b:number, a"),
            Err(ModelError::DuplicateColumn("a".into()))
        );
        assert_eq!(parse_column_specs("   "), Err(ModelError::NoColumns));
    }

    #[test]
    fn rejects_columns_that_exist_in_input() {
        let specs = parse_column_specs("name,score").unwrap();
        let headers = vec!["id".to_string(), "name".to_string()];
        assert_eq!(
            ensure_new_columns(&specs, &headers),
            Err(ModelError::ColumnExists("name".into()))
        );
    }
}
