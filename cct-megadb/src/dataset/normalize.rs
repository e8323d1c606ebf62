use super::*;
use crate::common::*;

/// Characters that may not appear in a document id.
pub const RESERVED_CHARS: [char; 4] = ['/', '\\', '?', '#'];

/// The substitute used when no other is configured.
pub const DEFAULT_SUBSTITUTE: &str = "~";

const JPG_EXTENSION: &str = ".jpg";

/// Rewrites image ids into document keys and tags records with the dataset partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdNormalizer {
    dataset: String,
    substitutes: IndexMap<char, String>,
}

impl IdNormalizer {
    /// Create a normalizer with every reserved character mapped to `~`.
    pub fn new(dataset: impl Into<String>) -> Result<Self> {
        Self::with_substitutes(dataset, IndexMap::new())
    }

    /// Create a normalizer with custom substitutes.
    ///
    /// Reserved characters without an entry fall back to `~`.
    pub fn with_substitutes(
        dataset: impl Into<String>,
        substitutes: IndexMap<char, String>,
    ) -> Result<Self> {
        let dataset = dataset.into();
        ensure!(!dataset.is_empty(), "dataset name must not be empty");

        for (ch, substitute) in &substitutes {
            ensure!(
                RESERVED_CHARS.contains(ch),
                "'{}' is not a reserved character",
                ch
            );
            ensure!(
                !substitute.is_empty(),
                "the substitute for '{}' must not be empty",
                ch
            );
            ensure!(
                !substitute.contains(&RESERVED_CHARS[..]),
                "the substitute '{}' contains a reserved character",
                substitute
            );
        }

        let substitutes: IndexMap<_, _> = RESERVED_CHARS
            .iter()
            .map(|ch| {
                let substitute = substitutes
                    .get(ch)
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_SUBSTITUTE.to_owned());
                (*ch, substitute)
            })
            .collect();

        Ok(Self {
            dataset,
            substitutes,
        })
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    /// Turn a path-like image id into a document key.
    pub fn normalize_id(&self, raw: &str) -> String {
        let stripped = strip_jpg_extension(raw);

        let replaced: String = stripped
            .chars()
            .fold(String::with_capacity(stripped.len()), |mut out, ch| {
                match self.substitutes.get(&ch) {
                    Some(substitute) => out.push_str(substitute),
                    None => out.push(ch),
                }
                out
            });

        // a substitute may complete a new extension
        strip_jpg_extension(&replaced).to_owned()
    }

    /// Rewrite the record id and attach the partition attribute.
    pub fn normalize(&self, mut record: ImageRecord) -> Result<ImageRecord> {
        let id = self.normalize_id(&record.id);
        ensure!(
            !id.is_empty(),
            "image id '{}' is empty after normalization",
            record.id
        );
        record.id = id;
        record.dataset = Some(self.dataset.clone());
        Ok(record)
    }

    /// Normalize all records, rejecting ids that collide afterwards.
    pub fn normalize_all<I>(&self, records: I) -> Result<Vec<ImageRecord>>
    where
        I: IntoIterator<Item = ImageRecord>,
    {
        let mut seen = HashMap::new();

        records
            .into_iter()
            .map(|record| {
                let raw_id = record.id.clone();
                let record = self.normalize(record)?;
                if let Some(prev) = seen.insert(record.id.clone(), raw_id.clone()) {
                    bail!(
                        "image ids '{}' and '{}' both normalize to '{}'",
                        prev,
                        raw_id,
                        record.id
                    );
                }
                Ok(record)
            })
            .collect()
    }
}

fn strip_jpg_extension(mut id: &str) -> &str {
    let ext_len = JPG_EXTENSION.len();
    while id.len() >= ext_len
        && id.is_char_boundary(id.len() - ext_len)
        && id[id.len() - ext_len..].eq_ignore_ascii_case(JPG_EXTENSION)
    {
        id = &id[..id.len() - ext_len];
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_camera_trap_path() -> Result<()> {
        let normalizer = IdNormalizer::new("idfg")?;
        assert_eq!(
            normalizer.normalize_id("Beaverhead_elk/AM34/Trip 1/100RECNX/2016-01-12 08-00-00 T.JPG"),
            "Beaverhead_elk~AM34~Trip 1~100RECNX~2016-01-12 08-00-00 T"
        );
        Ok(())
    }

    #[test]
    fn normalize_every_reserved_char() -> Result<()> {
        let normalizer = IdNormalizer::new("ds")?;
        assert_eq!(normalizer.normalize_id(r"a\b?c#d/e.jpg"), "a~b~c~d~e");
        assert_eq!(normalizer.normalize_id("plain.png"), "plain.png");
        assert_eq!(normalizer.normalize_id("dir.jpg/x"), "dir.jpg~x");
        Ok(())
    }

    #[test]
    fn normalize_is_idempotent() -> Result<()> {
        let substitutes: IndexMap<_, _> = [('/', "g".to_owned()), ('#', "_hash_".to_owned())]
            .into_iter()
            .collect();
        let normalizers = vec![
            IdNormalizer::new("ds")?,
            IdNormalizer::with_substitutes("ds", substitutes)?,
        ];
        let inputs = [
            "a/b/c.JPG",
            "a.jpg.jpg",
            "x.jp/",
            "#?\\/",
            "élan/ß.Jpg",
            "",
            ".jpg",
        ];

        for normalizer in &normalizers {
            for input in inputs {
                let once = normalizer.normalize_id(input);
                let twice = normalizer.normalize_id(&once);
                assert_eq!(once, twice, "input {:?}", input);
                assert!(!once.contains(&RESERVED_CHARS[..]), "input {:?}", input);
            }
        }
        Ok(())
    }

    #[test]
    fn normalize_attaches_partition() -> Result<()> {
        let normalizer = IdNormalizer::new("idfg")?;
        let record = normalizer.normalize(ImageRecord::new("cam/im.jpg"))?;
        assert_eq!(record.id, "cam~im");
        assert_eq!(record.dataset.as_deref(), Some("idfg"));

        assert!(normalizer.normalize(ImageRecord::new(".JPG")).is_err());
        Ok(())
    }

    #[test]
    fn normalize_all_detects_collisions() -> Result<()> {
        let normalizer = IdNormalizer::new("ds")?;
        let result =
            normalizer.normalize_all(vec![ImageRecord::new("a/b.jpg"), ImageRecord::new("a#b")]);
        assert!(result.is_err());

        let records =
            normalizer.normalize_all(vec![ImageRecord::new("a/b.jpg"), ImageRecord::new("a/c")])?;
        assert_eq!(records[1].id, "a~c");
        Ok(())
    }

    #[test]
    fn reject_bad_substitutes() {
        let subs = |ch: char, sub: &str| -> IndexMap<char, String> {
            [(ch, sub.to_owned())].into_iter().collect()
        };
        assert!(IdNormalizer::with_substitutes("ds", subs('/', "")).is_err());
        assert!(IdNormalizer::with_substitutes("ds", subs('/', "a#")).is_err());
        assert!(IdNormalizer::with_substitutes("ds", subs('x', "y")).is_err());
        assert!(IdNormalizer::new("").is_err());
    }
}
