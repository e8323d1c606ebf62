use crate::{common::*, dataset::ImageRecord};

/// The read queries supported by document stores.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Query {
    /// Records with at least one bounding box.
    WithBoundingBoxes,
    /// Records whose species list contains the name.
    WithSpecies(String),
}

/// A parameterized SQL query in the document database wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlQuerySpec {
    pub query: String,
    pub parameters: Vec<SqlParameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlParameter {
    pub name: String,
    pub value: Value,
}

impl Query {
    pub fn to_sql(&self) -> SqlQuerySpec {
        match self {
            Self::WithBoundingBoxes => SqlQuerySpec {
                query: "SELECT * FROM c WHERE ARRAY_LENGTH(c.annotations.bbox) > 0".to_owned(),
                parameters: vec![],
            },
            Self::WithSpecies(species) => SqlQuerySpec {
                query: "SELECT * FROM c WHERE ARRAY_CONTAINS(c.annotations.species, @species)"
                    .to_owned(),
                parameters: vec![SqlParameter {
                    name: "@species".to_owned(),
                    value: Value::String(species.clone()),
                }],
            },
        }
    }

    /// Evaluate the predicate in process.
    pub fn matches(&self, record: &ImageRecord) -> bool {
        match self {
            Self::WithBoundingBoxes => !record.annotations.bbox.is_empty(),
            Self::WithSpecies(species) => record
                .annotations
                .species
                .iter()
                .any(|name| name == species),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WithBoundingBoxes => write!(f, "records with bounding boxes"),
            Self::WithSpecies(species) => write!(f, "records with species '{}'", species),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::BoundingBoxAnnotation;

    #[test]
    fn species_query_wire_format() -> Result<()> {
        let spec = Query::WithSpecies("elk".into()).to_sql();
        assert_eq!(
            serde_json::to_value(&spec)?,
            serde_json::json!({
                "query": "SELECT * FROM c WHERE ARRAY_CONTAINS(c.annotations.species, @species)",
                "parameters": [{"name": "@species", "value": "elk"}]
            })
        );
        Ok(())
    }

    #[test]
    fn query_predicates() {
        let mut record = ImageRecord::new("im");
        record.annotations.species = vec!["elk".into(), "deer".into()];

        assert!(Query::WithSpecies("elk".into()).matches(&record));
        assert!(!Query::WithSpecies("el".into()).matches(&record));
        assert!(!Query::WithBoundingBoxes.matches(&record));

        record.annotations.bbox.push(BoundingBoxAnnotation::new(
            "elk",
            XYWH::from_xywh([0.0, 0.0, 1.0, 1.0]),
        ));
        assert!(Query::WithBoundingBoxes.matches(&record));
    }
}
